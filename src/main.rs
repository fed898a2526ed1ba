mod commands;
mod domain;
mod services;
#[cfg(test)]
mod test_support;

use clap::{CommandFactory, Parser};
use clap_complete::generate;

use crate::commands::base_commands::{CliArgs, Commands};
use crate::commands::forecast_cmd::forecast_command;
use crate::commands::serve_cmd::serve_command;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    match args.command {
        cmd @ Commands::Forecast { .. } => forecast_command(cmd).await,
        cmd @ Commands::Serve { .. } => serve_command(cmd).await,
        Commands::Completions { shell } => {
            let mut cli = CliArgs::command();
            let name = cli.get_name().to_string();
            generate(shell, &mut cli, name, &mut std::io::stdout());
        }
    }
}
