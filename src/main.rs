//! intake - classify, probe and import media files from the command line.

use clap::Parser;
use media_intake::cli;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("media_intake=info".parse()?))
        .init();

    cli::run_command(&args)
}
