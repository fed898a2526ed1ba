use serde::{Deserialize, Serialize};

/// A time-boxed interruption keyed by the 1-based month it begins. While a
/// delay is active the current phase countdown is frozen and only the
/// delay's own expense plus the frozen phase's overhead accrues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delay {
    pub length: u32,
    pub expense: f64,
}
