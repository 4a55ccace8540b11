//! CLI argument definitions using clap
//!
//! - imcache write   --conversation <cid> --from <seq> --count <n>
//! - imcache read    --conversation <cid> --from <seq> --count <n> [--json]
//! - imcache delete  --conversation <cid> --from <seq> --count <n>
//! - imcache probe   [--count <n>]
//! - imcache config  show | init

use clap::{Args, Parser, Subcommand};
use imcache_core::{CacheError, CacheResult, Strategy};
use imcache_core::config::BackendKind;
use std::path::PathBuf;

/// Default configuration file name used across all CLI commands.
pub const DEFAULT_CONFIG_FILE: &str = "imcache.toml";

#[derive(Parser)]
#[command(name = "imcache")]
#[command(about = "Inspect and exercise the IM message cache")]
#[command(
    long_about = r#"Inspect and exercise the IM message cache

USAGE:
  imcache write -c <cid> --from 1000 --count 100          # Write synthetic messages
  imcache read -c <cid> --from 1000 --count 100           # Read them back
  imcache read -c <cid> --strategy pipeline --json        # Pipelined read, JSON output
  imcache delete -c <cid> --from 1000 --count 100         # Remove entries
  imcache probe                                           # Write/read self-check

CONFIGURATION:
  imcache config init            # Create config file
  imcache config show            # Show effective config"#
)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (JSON or TOML)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Store backend, overriding the configuration
    #[arg(long, global = true)]
    pub backend: Option<BackendKind>,

    /// Redis URL, overriding the configuration
    #[arg(long, global = true)]
    pub redis_url: Option<String>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Range of messages in one conversation
#[derive(Args, Clone, Debug)]
pub struct BatchArgs {
    /// Conversation id
    #[arg(long, short = 'c')]
    pub conversation: String,

    /// First seq of the range
    #[arg(long, default_value_t = 1)]
    pub from: i64,

    /// Number of consecutive seqs
    #[arg(long, short = 'n', default_value_t = 10)]
    pub count: usize,

    /// Dispatch strategy: parallel or pipeline
    #[arg(long, short = 's', default_value = "parallel")]
    pub strategy: Strategy,
}

impl BatchArgs {
    /// Seqs `from .. from + count`; errors when the range leaves `i64`
    pub fn seqs(&self) -> CacheResult<Vec<i64>> {
        let out_of_range = || {
            CacheError::config(format!(
                "Seq range starting at {} with {} entries does not fit in i64",
                self.from, self.count
            ))
        };
        let count = i64::try_from(self.count).map_err(|_| out_of_range())?;
        if count > 0 {
            self.from.checked_add(count - 1).ok_or_else(out_of_range)?;
        }
        Ok((0..count).map(|i| self.from + i).collect())
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write synthetic messages for a seq range
    Write(BatchArgs),

    /// Read a seq range and print found messages and missing seqs
    Read {
        #[command(flatten)]
        batch: BatchArgs,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete the entries of a seq range
    Delete(BatchArgs),

    /// Write a batch, read it back with both strategies and compare
    Probe {
        /// Number of messages in the probe batch
        #[arg(long, short = 'n', default_value_t = 100)]
        count: usize,

        /// Conversation id to use (a fresh one by default)
        #[arg(long, short = 'c')]
        conversation: Option<String>,
    },

    /// Manage configuration files
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigAction {
    /// Display the effective configuration (file, environment and flags)
    Show,

    /// Create a new configuration file with defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_read_with_globals() {
        let cli = Cli::parse_from([
            "imcache",
            "read",
            "-c",
            "cid-1",
            "--from",
            "1000",
            "--count",
            "100",
            "--strategy",
            "pipeline",
            "--json",
            "--backend",
            "redis",
        ]);
        assert_eq!(cli.backend, Some(BackendKind::Redis));
        match cli.command {
            Commands::Read { batch, json } => {
                assert!(json);
                assert_eq!(batch.strategy, Strategy::Pipeline);
                let seqs = batch.seqs().unwrap();
                assert_eq!(seqs.len(), 100);
                assert_eq!(seqs[0], 1000);
                assert_eq!(seqs[99], 1099);
            }
            _ => panic!("expected read"),
        }
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["imcache", "write", "-c", "c1"]);
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
        match cli.command {
            Commands::Write(batch) => {
                assert_eq!(batch.strategy, Strategy::Parallel);
                assert_eq!(batch.seqs().unwrap(), (1..=10).collect::<Vec<_>>());
            }
            _ => panic!("expected write"),
        }
    }

    fn batch(from: i64, count: usize) -> BatchArgs {
        BatchArgs {
            conversation: "c1".to_string(),
            from,
            count,
            strategy: Strategy::Parallel,
        }
    }

    #[test]
    fn test_seqs_at_upper_bound() {
        assert_eq!(batch(i64::MAX - 1, 2).seqs().unwrap(), vec![i64::MAX - 1, i64::MAX]);
        assert!(batch(i64::MAX, 0).seqs().unwrap().is_empty());
    }

    #[test]
    fn test_seqs_overflow_is_config_error() {
        let err = batch(i64::MAX - 1, 3).seqs().unwrap_err();
        assert!(matches!(err, CacheError::Config { .. }));

        let cli = Cli::parse_from([
            "imcache",
            "read",
            "-c",
            "c1",
            "--from",
            "9223372036854775807",
            "-n",
            "2",
        ]);
        match cli.command {
            Commands::Read { batch, .. } => assert!(batch.seqs().is_err()),
            _ => panic!("expected read"),
        }
    }

    #[test]
    fn test_rejects_unknown_strategy() {
        let result = Cli::try_parse_from(["imcache", "read", "-c", "c1", "--strategy", "serial"]);
        assert!(result.is_err());
    }
}
