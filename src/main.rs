// ABOUTME: Entry point for the containmint CLI application.
// ABOUTME: Parses arguments, runs one command and maps failures to the exit status.

mod cli;

use clap::Parser;
use cli::Cli;
use containmint::commands::Host;
use containmint::engine::ProcessRunner;
use containmint::error::Result;
use containmint::output::{self, RedactingWriter};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise the verbose flag picks the level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(RedactingWriter)
        .init();

    if let Err(e) = run(cli).await {
        output::fatal(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let command = cli.command.into_command()?;

    output::section(&format!("Begin: {command}"));

    let host = Host::new(Arc::new(ProcessRunner));
    command.run(&host).await?;

    output::section(&format!("End: {command}"));
    Ok(())
}
