mod accounts;
mod authz;
mod cli;
mod config;
mod identity;
mod model;
mod storage;
mod validation;
mod workflow;
mod worksheets;

use std::io;
use std::process;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use config::Config;
use storage::Storage;

/// Environment variable holding the log filter, e.g. `fieldops=debug`.
const LOG_ENV: &str = "FIELDOPS_LOG";

fn main() {
    init_logging();

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    let path = config.database_path().unwrap_or_else(|| {
        eprintln!("Could not determine home directory.");
        process::exit(1);
    });

    let storage = match Storage::open(&path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to open {}: {e}", path.display());
            process::exit(1);
        }
    };

    if let Err(e) = cli::run(&config, &storage) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("fieldops=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();
}
