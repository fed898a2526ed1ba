use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::delay::Delay;
use crate::domain::inputs::ForecastInputs;
use crate::domain::phase::Phase;

#[derive(Error, Debug)]
pub enum InputTypeError {
    #[error("inputs must be a JSON object")]
    NotAnObject,
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("field {field} has an invalid numeric value: {value}")]
    InvalidNumber { field: String, value: String },
    #[error("field {field} must be a non-negative whole number of months: {value}")]
    InvalidMonthCount { field: String, value: String },
    #[error("invalid delay start month: {0}")]
    InvalidDelayMonth(String),
    #[error("field {0} must be an object")]
    ExpectedObject(String),
    #[error("field phases must be an array of phase records")]
    ExpectedPhaseArray,
    #[error("phase record {0} is missing a name")]
    MissingPhaseName(usize),
}

/// Coerces transport-layer JSON into typed [`ForecastInputs`].
///
/// Numeric fields accept JSON numbers or numeric strings. Top-level fields
/// are required; numeric sub-fields of phase and delay records default to
/// zero when absent. Delay keys must parse as 1-based month indices (empty
/// keys are skipped), while billing milestone keys that are not whole
/// numbers are dropped silently since no lookup could ever match them.
pub fn parse_inputs(value: &Value) -> Result<ForecastInputs, InputTypeError> {
    let object = value.as_object().ok_or(InputTypeError::NotAnObject)?;

    let time_frame = require_month_count(object, "time_frame")?;
    let payment_lag = require_month_count(object, "payment_lag")?;
    let contract_value = require_number(object, "contract_value")?;
    let min_cash_allowed = require_number(object, "cash_floor")?;
    let contingency_percent = require_number(object, "contingency_percent")?;

    let phases = parse_phases(object.get("phases"))?;
    let delays = parse_delays(object.get("delays"))?;
    let unexpected_costs = parse_unexpected_costs(object.get("unexpected_costs"))?;
    let billing_milestones = parse_billing_milestones(object.get("billing_milestones"))?;

    Ok(ForecastInputs {
        time_frame,
        payment_lag,
        contract_value,
        min_cash_allowed,
        contingency_percent,
        phases,
        delays,
        unexpected_costs,
        billing_milestones,
    })
}

fn require_number(object: &Map<String, Value>, field: &'static str) -> Result<f64, InputTypeError> {
    let value = object
        .get(field)
        .ok_or(InputTypeError::MissingField(field))?;
    number_from_value(field, value)
}

fn require_month_count(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<u32, InputTypeError> {
    let value = object
        .get(field)
        .ok_or(InputTypeError::MissingField(field))?;
    month_count_from_value(field, value)
}

fn number_from_value(field: &str, value: &Value) -> Result<f64, InputTypeError> {
    match value {
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| invalid_number(field, value)),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid_number(field, value)),
        _ => Err(invalid_number(field, value)),
    }
}

fn whole_number_from_value(field: &str, value: &Value) -> Result<i64, InputTypeError> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .ok_or_else(|| invalid_number(field, value)),
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid_number(field, value)),
        _ => Err(invalid_number(field, value)),
    }
}

fn month_count_from_value(field: &str, value: &Value) -> Result<u32, InputTypeError> {
    let whole = whole_number_from_value(field, value)?;
    u32::try_from(whole).map_err(|_| InputTypeError::InvalidMonthCount {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn invalid_number(field: &str, value: &Value) -> InputTypeError {
    InputTypeError::InvalidNumber {
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn parse_phases(value: Option<&Value>) -> Result<Vec<Phase>, InputTypeError> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    let records = value.as_array().ok_or(InputTypeError::ExpectedPhaseArray)?;

    let mut phases = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let record = record.as_object().ok_or(InputTypeError::ExpectedPhaseArray)?;
        let name = record
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
            .ok_or(InputTypeError::MissingPhaseName(index))?;
        let length = match record.get("length") {
            Some(value) => whole_number_from_value(&format!("phases[{index}].length"), value)?,
            None => 0,
        };
        phases.push(Phase {
            name: name.to_string(),
            length,
            expense: optional_number(record, "expense", &format!("phases[{index}].expense"))?,
            overhead: optional_number(record, "overhead", &format!("phases[{index}].overhead"))?,
            upfront: optional_number(record, "upfront", &format!("phases[{index}].upfront"))?,
        });
    }
    Ok(phases)
}

fn optional_number(
    record: &Map<String, Value>,
    key: &str,
    field: &str,
) -> Result<f64, InputTypeError> {
    match record.get(key) {
        Some(value) => number_from_value(field, value),
        None => Ok(0.0),
    }
}

fn parse_delays(value: Option<&Value>) -> Result<BTreeMap<u32, Delay>, InputTypeError> {
    let Some(value) = value else {
        return Ok(BTreeMap::new());
    };
    let object = value
        .as_object()
        .ok_or_else(|| InputTypeError::ExpectedObject("delays".to_string()))?;

    let mut delays = BTreeMap::new();
    for (key, record) in object {
        if key.trim().is_empty() {
            continue;
        }
        let month = key
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|month| *month >= 1)
            .ok_or_else(|| InputTypeError::InvalidDelayMonth(key.clone()))?;
        let record = record
            .as_object()
            .ok_or_else(|| InputTypeError::ExpectedObject(format!("delays.{key}")))?;
        let length = match record.get("length") {
            Some(value) => month_count_from_value(&format!("delays.{key}.length"), value)?,
            None => 0,
        };
        let expense = optional_number(record, "expense", &format!("delays.{key}.expense"))?;
        delays.insert(month, Delay { length, expense });
    }
    Ok(delays)
}

fn parse_unexpected_costs(
    value: Option<&Value>,
) -> Result<HashMap<String, f64>, InputTypeError> {
    let Some(value) = value else {
        return Ok(HashMap::new());
    };
    let object = value
        .as_object()
        .ok_or_else(|| InputTypeError::ExpectedObject("unexpected_costs".to_string()))?;

    let mut costs = HashMap::with_capacity(object.len());
    for (phase_name, value) in object {
        let percent = number_from_value(&format!("unexpected_costs.{phase_name}"), value)?;
        costs.insert(phase_name.clone(), percent);
    }
    Ok(costs)
}

fn parse_billing_milestones(
    value: Option<&Value>,
) -> Result<BTreeMap<i64, f64>, InputTypeError> {
    let Some(value) = value else {
        return Ok(BTreeMap::new());
    };
    let object = value
        .as_object()
        .ok_or_else(|| InputTypeError::ExpectedObject("billing_milestones".to_string()))?;

    let mut milestones = BTreeMap::new();
    for (key, value) in object {
        let fraction = number_from_value(&format!("billing_milestones.{key}"), value)?;
        // A key that is not a whole month index can never match a lookup;
        // it is dropped rather than rejected.
        if let Ok(month) = key.trim().parse::<i64>() {
            milestones.insert(month, fraction);
        }
    }
    Ok(milestones)
}
