use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::domain::delay::Delay;
use crate::domain::phase::Phase;

/// Fully typed forecast assumptions, consumed read-only by the simulation.
///
/// `delays` is keyed by the 1-based month a delay starts.
/// `billing_milestones` is keyed by 1-based billing month; months without a
/// milestone yield zero cash-in, which is valid rather than an error.
/// `unexpected_costs` maps a phase name to a fraction of that phase's
/// monthly expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastInputs {
    pub time_frame: u32,
    pub payment_lag: u32,
    pub contract_value: f64,
    #[serde(rename = "cash_floor")]
    pub min_cash_allowed: f64,
    pub contingency_percent: f64,
    pub phases: Vec<Phase>,
    pub delays: BTreeMap<u32, Delay>,
    pub unexpected_costs: HashMap<String, f64>,
    pub billing_milestones: BTreeMap<i64, f64>,
}
