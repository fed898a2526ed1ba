use serde::Serialize;

/// One emitted row of the forecast. `phase` is `None` once every phase has
/// completed while the horizon keeps running for lagged billing.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ForecastMonth {
    pub cash_in: f64,
    pub cash_out: f64,
    pub net_cash: f64,
    pub cumulative_net_cash: f64,
    pub phase: Option<String>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Go,
    Restructure,
    #[serde(rename = "Not Profitable")]
    NotProfitable,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ForecastResult {
    pub forecast: Vec<ForecastMonth>,
    pub verdict: Verdict,
    pub payback_period: u32,
    pub gross_margin: f64,
    pub min_net_cash: f64,
    pub min_net_cash_month: u32,
    pub cumulative_net_cash: f64,
}
