//! Command routing logic for CLI

use crate::args::{Cli, Commands, ConfigAction, DEFAULT_CONFIG_FILE};
use crate::commands;
use crate::console::CliConsole;
use crate::signal_handler::SignalHandler;
use imcache_core::config::{self, BackendKind};
use imcache_core::{CacheConfig, CacheError, CacheResult, CallContext};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Configuration file to load.
///
/// An explicit path is used as given. The default name falls back to the user
/// config directory (`~/.config/imcache/imcache.toml`) when it does not exist
/// in the working directory.
pub fn resolve_config_path(requested: &Path) -> PathBuf {
    if requested.exists() || requested != Path::new(DEFAULT_CONFIG_FILE) {
        return requested.to_path_buf();
    }
    dirs::config_dir()
        .map(|dir| dir.join("imcache").join(DEFAULT_CONFIG_FILE))
        .filter(|path| path.exists())
        .unwrap_or_else(|| requested.to_path_buf())
}

/// Apply command-line overrides on top of the loaded configuration
pub fn apply_overrides(
    config: &mut CacheConfig,
    backend: Option<BackendKind>,
    redis_url: Option<&str>,
) -> CacheResult<()> {
    if let Some(backend) = backend {
        config.backend = backend;
    }
    if let Some(url) = redis_url {
        config.redis.url = url.to_string();
        // A Redis URL on the command line implies the Redis backend
        if backend.is_none() {
            config.backend = BackendKind::Redis;
        }
    }
    config.validate()
}

/// Load the effective configuration: file, environment, then flags
pub fn effective_config(cli: &Cli) -> CacheResult<(PathBuf, CacheConfig)> {
    let path = resolve_config_path(&cli.config);
    let mut config = config::load(&path)?;
    apply_overrides(&mut config, cli.backend, cli.redis_url.as_deref())?;
    Ok((path, config))
}

/// Route CLI commands to their respective handlers
pub async fn route(cli: Cli, config_path: PathBuf, config: CacheConfig) -> CacheResult<()> {
    let console = CliConsole::new(cli.verbose);

    // Configuration commands never touch the store
    if let Commands::Config { action } = &cli.command {
        return match action {
            ConfigAction::Show => commands::config::show(&config, &config_path, &console).await,
            ConfigAction::Init { force } => {
                commands::config::init(&cli.config, *force, &console).await
            }
        };
    }

    let cache = commands::open_cache(&config).await?;
    debug!(backend = %config.backend, parallel_limit = config.parallel_limit, "Cache ready");

    let ctx = CallContext::new();
    let mut signal_handler = SignalHandler::new();
    if let Err(e) = signal_handler.start(ctx.clone()) {
        warn!(error = %e, "Ctrl+C handling unavailable");
    }

    let result = match &cli.command {
        Commands::Write(args) => commands::write::write(&cache, &ctx, &console, args).await,
        Commands::Read { batch, json } => {
            commands::read::read(&cache, &ctx, &console, batch, *json).await
        }
        Commands::Delete(args) => commands::delete::delete(&cache, &ctx, &console, args).await,
        Commands::Probe {
            count,
            conversation,
        } => commands::probe::probe(&cache, &ctx, &console, *count, conversation.clone())
            .await
            .map_err(CacheError::from),
        Commands::Config { .. } => Ok(()),
    };

    signal_handler.stop();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_is_kept() {
        let path = Path::new("/etc/imcache/custom.json");
        assert_eq!(resolve_config_path(path), path.to_path_buf());
    }

    #[test]
    fn test_redis_url_flag_selects_redis() {
        let mut config = CacheConfig::default();
        apply_overrides(&mut config, None, Some("redis://10.1.1.1:6379/")).unwrap();
        assert_eq!(config.backend, BackendKind::Redis);
        assert_eq!(config.redis.url, "redis://10.1.1.1:6379/");
    }

    #[test]
    fn test_explicit_backend_wins() {
        let mut config = CacheConfig::default();
        apply_overrides(
            &mut config,
            Some(BackendKind::Memory),
            Some("redis://10.1.1.1:6379/"),
        )
        .unwrap();
        assert_eq!(config.backend, BackendKind::Memory);
    }

    #[test]
    fn test_overrides_are_validated() {
        let mut config = CacheConfig::default();
        let err = apply_overrides(&mut config, Some(BackendKind::Redis), Some("")).unwrap_err();
        assert!(matches!(err, CacheError::Config { .. }));
    }
}
