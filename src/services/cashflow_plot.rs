use plotters::prelude::*;
use thiserror::Error;

use crate::services::forecast_types::ForecastMonth;

#[derive(Error, Debug)]
pub enum CashflowPlotError {
    #[error("failed to render cash flow chart: {0}")]
    Render(String),
}

pub async fn write_cashflow_png(
    output_path: &str,
    months: &[ForecastMonth],
) -> Result<(), CashflowPlotError> {
    let output_path = output_path.to_string();
    let months = months.to_vec();
    tokio::task::spawn_blocking(move || render_cashflow_png(&output_path, &months))
        .await
        .map_err(|e| CashflowPlotError::Render(e.to_string()))??;
    Ok(())
}

fn render_cashflow_png(
    output_path: &str,
    months: &[ForecastMonth],
) -> Result<(), CashflowPlotError> {
    if months.is_empty() {
        return Ok(());
    }

    let mut min_value = 0.0_f64;
    let mut max_value = 0.0_f64;
    for month in months {
        min_value = min_value.min(month.cumulative_net_cash).min(month.net_cash);
        max_value = max_value.max(month.cumulative_net_cash).max(month.net_cash);
    }
    let padding = ((max_value - min_value) * 0.05).max(1.0);
    let max_x = months.len() as i32 + 1;

    let root = BitMapBackend::new(output_path, (900, 600)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| CashflowPlotError::Render(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption("Cash Flow Forecast", ("sans-serif", 30))
        .x_label_area_size(55)
        .y_label_area_size(85)
        .build_cartesian_2d(0..max_x, (min_value - padding)..(max_value + padding))
        .map_err(|e| CashflowPlotError::Render(e.to_string()))?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Month")
        .y_desc("Cash")
        .label_style(("sans-serif", 18))
        .axis_desc_style(("sans-serif", 22))
        .draw()
        .map_err(|e| CashflowPlotError::Render(e.to_string()))?;

    // Zero baseline so floor breaches are visible at a glance.
    chart
        .draw_series(LineSeries::new(vec![(0, 0.0), (max_x, 0.0)], &BLACK))
        .map_err(|e| CashflowPlotError::Render(e.to_string()))?;

    let monthly_color = RGBColor(160, 160, 160);
    chart
        .draw_series(LineSeries::new(
            months
                .iter()
                .enumerate()
                .map(|(index, month)| (index as i32 + 1, month.net_cash)),
            &monthly_color,
        ))
        .map_err(|e| CashflowPlotError::Render(e.to_string()))?;

    let cumulative_color = RGBColor(30, 122, 204);
    chart
        .draw_series(LineSeries::new(
            months
                .iter()
                .enumerate()
                .map(|(index, month)| (index as i32 + 1, month.cumulative_net_cash)),
            &cumulative_color,
        ))
        .map_err(|e| CashflowPlotError::Render(e.to_string()))?;

    root.present()
        .map_err(|e| CashflowPlotError::Render(e.to_string()))?;
    Ok(())
}
