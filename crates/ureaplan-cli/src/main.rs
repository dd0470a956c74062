use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::FmtSubscriber;
use ureaplan_cli::cli::{Cli, Commands};

mod commands;

fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Solve {
            scenario,
            out,
            backend,
            time_limit,
            json,
        } => commands::solve::handle(commands::solve::SolveArgs {
            scenario,
            out: out.as_deref(),
            backend: backend.as_deref(),
            time_limit: *time_limit,
            json: *json,
        }),
        Commands::Validate { scenario } => commands::validate::handle(scenario),
        Commands::Backends => commands::backends::handle(),
    }
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so `solve --json` output stays parseable
    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {e}");
    }

    debug!(command = ?cli.command, "starting ureaplan");

    if let Err(e) = run(&cli) {
        error!("{e:#}");
        std::process::exit(1);
    }
}
