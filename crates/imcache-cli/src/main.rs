//! IM message cache CLI
//!
//! Writes, reads and deletes message ranges through either batch strategy,
//! and probes a store end to end.
//!
//! # Installation
//!
//! ```bash
//! cargo install --path crates/imcache-cli
//! ```
//!
//! Logging follows the `logging` section of the configuration; `RUST_LOG`
//! takes precedence when set, and `--verbose` raises the default to `debug`.

mod args;
mod commands;
mod console;
mod router;
mod signal_handler;

use clap::Parser;
use console::CliConsole;
use imcache_core::config::{LogFormat, LoggingConfig};
use imcache_core::error::CacheResult;
use tracing_subscriber::EnvFilter;

// Re-export for external use
pub use args::{Cli, Commands, ConfigAction};

#[tokio::main]
async fn main() -> CacheResult<()> {
    let cli = Cli::parse();

    let (config_path, config) = match router::effective_config(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            CliConsole::new(true).error(&format!("Invalid configuration: {}", e));
            return Err(e);
        }
    };

    init_tracing(&config.logging, cli.verbose);
    router::route(cli, config_path, config).await
}

/// Initialize logging with environment-based filtering
fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}
