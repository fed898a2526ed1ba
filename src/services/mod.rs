pub mod assumptions_yaml;
pub mod cashflow_plot;
pub mod forecast;
pub mod forecast_types;
pub mod input_parser;
pub mod project_store;
pub mod server;
