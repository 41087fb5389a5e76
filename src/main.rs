//! Main entry point for the audiophile-dl CLI

use audiophile_dl::cli::menu::INTERRUPTED;
use audiophile_dl::cli::{Cli, Menu, StdinLines};
use audiophile_dl::random::RandomSource;
use clap::Parser;
use std::io::IsTerminal;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

/// Initialize tracing on stderr with optional JSON formatting
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    // quiet by default so log lines do not interleave with the menu
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("audiophile_dl=warn"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let orchestrator = cli.orchestrator(RandomSource::from_entropy())?;
    let interactive = std::io::stdout().is_terminal();
    let mut menu = Menu::new(orchestrator, StdinLines::new(), std::io::stdout())
        .with_clear_screen(interactive);
    let exit = menu.run().await?;
    Ok(exit.exit_code())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    let code = tokio::select! {
        result = run(cli) => match result {
            Ok(code) => code,
            Err(e) => {
                error!("Fatal: {:#}", e);
                eprintln!("Error: {e:#}");
                1
            }
        },
        // a failed handler install disables this branch
        Ok(()) = tokio::signal::ctrl_c() => {
            warn!("Interrupted by user");
            println!("{INTERRUPTED}");
            0
        }
    };

    // stdin reads block runtime shutdown; leave directly
    std::process::exit(code);
}
