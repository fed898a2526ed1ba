use std::collections::{BTreeMap, HashMap};
use std::io;

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::delay::Delay;
use crate::domain::inputs::ForecastInputs;
use crate::domain::phase::Phase;

#[derive(Error, Debug)]
pub enum AssumptionsYamlError {
    #[error("failed to read assumptions yaml: {0}")]
    Read(#[from] io::Error),
    #[error("failed to parse assumptions yaml: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid start date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),
    #[error("invalid delay start month: {0} (months are 1-based)")]
    InvalidDelayMonth(u32),
    #[error("phase record {0} is missing a name")]
    MissingPhaseName(usize),
}

/// Forecast assumptions as loaded from a YAML file: an optional project
/// name and start date alongside the typed engine inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectAssumptions {
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub inputs: ForecastInputs,
}

#[derive(Deserialize)]
struct AssumptionsRecord {
    name: Option<String>,
    start_date: Option<String>,
    #[serde(default)]
    time_frame: u32,
    #[serde(default)]
    payment_lag: u32,
    #[serde(default)]
    contract_value: f64,
    #[serde(default)]
    cash_floor: f64,
    #[serde(default)]
    contingency_percent: f64,
    #[serde(default)]
    phases: Vec<PhaseRecord>,
    #[serde(default)]
    delays: BTreeMap<u32, DelayRecord>,
    #[serde(default)]
    unexpected_costs: HashMap<String, f64>,
    #[serde(default)]
    billing_milestones: BTreeMap<i64, f64>,
}

#[derive(Deserialize)]
struct PhaseRecord {
    name: String,
    #[serde(default)]
    length: i64,
    #[serde(default)]
    expense: f64,
    #[serde(default)]
    overhead: f64,
    #[serde(default)]
    upfront: f64,
}

#[derive(Deserialize)]
struct DelayRecord {
    #[serde(default)]
    length: u32,
    #[serde(default)]
    expense: f64,
}

pub fn load_assumptions_from_yaml_file(
    path: &str,
) -> Result<ProjectAssumptions, AssumptionsYamlError> {
    let contents = std::fs::read_to_string(path)?;
    deserialize_assumptions_from_yaml_str(&contents)
}

pub fn deserialize_assumptions_from_yaml_str(
    input: &str,
) -> Result<ProjectAssumptions, AssumptionsYamlError> {
    let record: AssumptionsRecord = serde_yaml::from_str(input)?;

    let start_date = parse_date_opt(record.start_date.as_deref())?;

    let mut phases = Vec::with_capacity(record.phases.len());
    for (index, phase) in record.phases.into_iter().enumerate() {
        if phase.name.trim().is_empty() {
            return Err(AssumptionsYamlError::MissingPhaseName(index));
        }
        phases.push(Phase {
            name: phase.name,
            length: phase.length,
            expense: phase.expense,
            overhead: phase.overhead,
            upfront: phase.upfront,
        });
    }

    let mut delays = BTreeMap::new();
    for (month, delay) in record.delays {
        if month == 0 {
            return Err(AssumptionsYamlError::InvalidDelayMonth(month));
        }
        delays.insert(
            month,
            Delay {
                length: delay.length,
                expense: delay.expense,
            },
        );
    }

    Ok(ProjectAssumptions {
        name: record.name,
        start_date,
        inputs: ForecastInputs {
            time_frame: record.time_frame,
            payment_lag: record.payment_lag,
            contract_value: record.contract_value,
            min_cash_allowed: record.cash_floor,
            contingency_percent: record.contingency_percent,
            phases,
            delays,
            unexpected_costs: record.unexpected_costs,
            billing_milestones: record.billing_milestones,
        },
    })
}

fn parse_date_opt(value: Option<&str>) -> Result<Option<NaiveDate>, AssumptionsYamlError> {
    let text = match value {
        Some(text) => text,
        None => return Ok(None),
    };
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| AssumptionsYamlError::InvalidDate(text.to_string()))?;
    Ok(Some(date))
}
