use tracing_subscriber::EnvFilter;

use dbactuator::cli::Cli;
use dbactuator::dispatch;

fn main() {
    // Logs go to stderr; stdout carries only the framed rollback ledger
    // the orchestrator parses on forward failure.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();
    std::process::exit(dispatch::run(cli));
}
