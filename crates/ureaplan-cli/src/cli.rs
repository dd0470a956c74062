use clap::{CommandFactory, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Biomass-to-urea plant siting and sizing", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Solve a siting scenario and report the chosen plant
    Solve {
        /// Path to the scenario TOML file
        #[arg(value_hint = ValueHint::FilePath)]
        scenario: PathBuf,

        /// Directory for the JSON result, flow tables and site report
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        out: Option<PathBuf>,

        /// MILP backend, overriding the scenario's [solver] section
        #[arg(long)]
        backend: Option<String>,

        /// Wall-clock limit in seconds, overriding the scenario
        #[arg(long)]
        time_limit: Option<f64>,

        /// Print the full solution as JSON instead of the summary
        #[arg(long)]
        json: bool,
    },
    /// Load a scenario, assemble its model and print its size without solving
    Validate {
        /// Path to the scenario TOML file
        #[arg(value_hint = ValueHint::FilePath)]
        scenario: PathBuf,
    },
    /// List the MILP backends compiled into this binary
    Backends,
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
