use chrono::{Months, NaiveDate};

use crate::services::forecast::PAYBACK_NEVER;
use crate::services::forecast_types::{ForecastResult, Verdict};

/// Renders a forecast as a plain-text report: the verdict block followed by
/// the month-by-month table. When a start date is given, rows are labelled
/// with calendar months instead of bare indices.
pub fn format_forecast_report(result: &ForecastResult, start_date: Option<NaiveDate>) -> String {
    let mut lines = Vec::new();
    lines.push("Cash Flow Forecast".to_string());
    lines.push(format!("Verdict: {}", verdict_label(result.verdict)));
    lines.push(format!(
        "Payback period: {}",
        payback_label(result.payback_period)
    ));
    lines.push(format!("Gross margin: {:.1}%", result.gross_margin * 100.0));
    lines.push(format!(
        "Minimum net cash: {:.2} (month {})",
        result.min_net_cash, result.min_net_cash_month
    ));
    lines.push(format!(
        "Final cumulative net cash: {:.2}",
        result.cumulative_net_cash
    ));
    lines.push(String::new());
    lines.push("Month | Phase | Cash In | Cash Out | Net | Cumulative".to_string());
    lines.push("------|-------|---------|----------|-----|-----------".to_string());
    for (index, month) in result.forecast.iter().enumerate() {
        lines.push(format!(
            "{} | {} | {:.2} | {:.2} | {:.2} | {:.2}",
            month_label(index, start_date),
            month.phase.as_deref().unwrap_or("-"),
            month.cash_in,
            month.cash_out,
            month.net_cash,
            month.cumulative_net_cash
        ));
    }

    lines.join("\n")
}

fn month_label(index: usize, start_date: Option<NaiveDate>) -> String {
    match start_date.and_then(|date| date.checked_add_months(Months::new(index as u32))) {
        Some(date) => date.format("%Y-%m").to_string(),
        None => (index + 1).to_string(),
    }
}

fn verdict_label(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Go => "Go",
        Verdict::Restructure => "Restructure",
        Verdict::NotProfitable => "Not Profitable",
    }
}

fn payback_label(payback_period: u32) -> String {
    if payback_period == PAYBACK_NEVER {
        "not within horizon".to_string()
    } else {
        format!("month {payback_period}")
    }
}
