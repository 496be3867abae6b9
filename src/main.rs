use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod core;
mod export;
mod merge;
mod parsing;
mod utils;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    let debug_log = match &cli.command {
        cli::Commands::Merge(args) => args.debug_log_path()?,
        cli::Commands::Export(_) => None,
    };
    init_tracing(cli.verbose, debug_log.as_deref())?;

    match cli.command {
        cli::Commands::Merge(args) => {
            cli::merge::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Export(args) => {
            cli::export::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}

/// Stderr logging based on verbosity, plus an optional debug trace file
fn init_tracing(verbose: bool, debug_log: Option<&Path>) -> anyhow::Result<()> {
    let filter = if verbose {
        EnvFilter::new("prephix=debug,info")
    } else {
        EnvFilter::new("prephix=warn")
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(filter);

    let debug_layer = match debug_log {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = File::create(path)?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_filter(EnvFilter::new("prephix=debug")),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(debug_layer)
        .init();
    Ok(())
}
