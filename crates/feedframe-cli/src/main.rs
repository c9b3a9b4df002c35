use clap::Parser;
use feedframe_core::logging;

mod cli;

use crate::cli::Cli;

fn main() {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    // Initialize logging as early as possible; fall back to stderr.
    let root = cli.root();
    if let Err(err) = logging::init_logging(&root) {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable, using stderr: {:#}", err);
    }
    match dotenv {
        Ok(path) => tracing::debug!("loaded environment from {}", path.display()),
        Err(e) if e.not_found() => tracing::debug!("no .env file"),
        Err(e) => tracing::warn!("ignoring unreadable .env: {}", e),
    }

    if let Err(err) = cli.run() {
        eprintln!("feedframe error: {:#}", err);
        std::process::exit(1);
    }
}
