use serde::{Deserialize, Serialize};

/// One sequential stage of project execution. Phases run in the order they
/// are supplied; `length` counts months and must be at least 1 for a
/// forecast to run. `upfront` is charged exactly once, in the first month
/// the phase becomes active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    pub length: i64,
    pub expense: f64,
    pub overhead: f64,
    pub upfront: f64,
}
