use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(author, version, about)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a cash flow forecast from an assumptions YAML file
    Forecast {
        /// Assumptions YAML file
        #[arg(short, long)]
        input: String,
        /// Output YAML report file
        #[arg(short, long)]
        output: String,
        /// Optional PNG chart of the monthly cash curve
        #[arg(short, long)]
        chart: Option<String>,
    },
    /// Serve the forecast API over HTTP
    Serve {
        /// Port to listen on (0 picks an ephemeral port)
        #[arg(short, long, default_value_t = 5000)]
        port: u16,
        /// Directory for saved project records
        #[arg(short, long, default_value = "projects")]
        data_dir: String,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
