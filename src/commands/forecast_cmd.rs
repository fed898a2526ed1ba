use crate::commands::base_commands::Commands;
use crate::commands::report_format::format_forecast_report;
use crate::services::assumptions_yaml::load_assumptions_from_yaml_file;
use crate::services::cashflow_plot::write_cashflow_png;
use crate::services::forecast::simulate;

pub async fn forecast_command(cmd: Commands) {
    if let Commands::Forecast {
        input,
        output,
        chart,
    } = cmd
    {
        let assumptions = match load_assumptions_from_yaml_file(&input) {
            Ok(assumptions) => assumptions,
            Err(e) => {
                eprintln!("Failed to load assumptions: {e:?}");
                return;
            }
        };

        let result = match simulate(&assumptions.inputs) {
            Ok(result) => result,
            Err(e) => {
                eprintln!("Failed to generate forecast: {e:?}");
                return;
            }
        };

        let yaml = match serde_yaml::to_string(&result) {
            Ok(contents) => contents,
            Err(e) => {
                eprintln!("Failed to serialize forecast: {e:?}");
                return;
            }
        };
        if let Err(e) = tokio::fs::write(&output, yaml).await {
            eprintln!("Failed to write forecast report: {e:?}");
            return;
        }

        if let Some(chart_path) = chart {
            if let Err(e) = write_cashflow_png(&chart_path, &result.forecast).await {
                eprintln!("Failed to write cash flow chart: {e:?}");
            } else {
                println!("Cash flow chart written to {chart_path}");
            }
        }

        if let Some(name) = assumptions.name.as_deref() {
            println!("Forecast for {name}");
        }
        println!("{}", format_forecast_report(&result, assumptions.start_date));
        println!("Forecast report written to {output}");
    }
}
