use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::inputs::ForecastInputs;

/// A saved project record: a name and start date attached to a full set of
/// forecast assumptions, with store-managed timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredProject {
    pub id: u64,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub inputs: ForecastInputs,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The scalar fields of a stored project, as returned by the listing
/// endpoint. The nested phase/delay/cost/milestone maps are only available
/// from a full fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub id: u64,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub contract_value: f64,
    pub time_frame: u32,
    pub payment_lag: u32,
    pub contingency_percent: f64,
    pub cash_floor: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredProject {
    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id,
            name: self.name.clone(),
            start_date: self.start_date,
            contract_value: self.inputs.contract_value,
            time_frame: self.inputs.time_frame,
            payment_lag: self.inputs.payment_lag,
            contingency_percent: self.inputs.contingency_percent,
            cash_floor: self.inputs.min_cash_allowed,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
