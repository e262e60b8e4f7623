mod cli;
mod client;
mod command_handlers;
mod config;
mod error;
mod models;
mod output;

use std::error::Error as _;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::cli::Cli;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);
    let debug = cli.debug;

    if let Err(err) = command_handlers::dispatch::dispatch(cli) {
        eprintln!("Error: {err}");
        if debug {
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
        }
        std::process::exit(err.exit_code());
    }
}

// Logs go to stderr so stdout stays clean for table/JSON output (piping).
fn init_logging(debug: bool) {
    let default_filter = if debug {
        "sentry_tool=debug"
    } else {
        "sentry_tool=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
