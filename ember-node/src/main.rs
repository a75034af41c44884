use clap::Parser;
use ember_node::cli;
use ember_node::config::NodeConfig;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = cli::Cli::parse();

    // RUST_LOG wins, then --log-level, then the config file.
    let level = cli
        .log_level
        .clone()
        .or_else(|| NodeConfig::load(&cli.config).ok().map(|c| c.logging.level))
        .unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();

    if let Err(e) = cli::run(cli) {
        tracing::error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}
