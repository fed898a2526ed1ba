use std::collections::{BTreeMap, HashMap};

use crate::domain::inputs::ForecastInputs;
use crate::domain::phase::Phase;

pub fn build_phase(name: &str, length: i64, expense: f64) -> Phase {
    Phase {
        name: name.to_string(),
        length,
        expense,
        overhead: 0.0,
        upfront: 0.0,
    }
}

/// One phase named "delivery" spanning the whole time frame, no delays, no
/// milestones, and a cash floor low enough to stay out of the way.
pub fn single_phase_inputs(length: i64, expense: f64, contract_value: f64) -> ForecastInputs {
    ForecastInputs {
        time_frame: length as u32,
        payment_lag: 0,
        contract_value,
        min_cash_allowed: -10000.0,
        contingency_percent: 0.0,
        phases: vec![build_phase("delivery", length, expense)],
        delays: BTreeMap::new(),
        unexpected_costs: HashMap::new(),
        billing_milestones: BTreeMap::new(),
    }
}

pub fn milestones(entries: &[(i64, f64)]) -> BTreeMap<i64, f64> {
    entries.iter().copied().collect()
}
