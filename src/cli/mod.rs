//! Command-line interface for monconf
//!
//! # Commands
//!
//! - `check` - read object definitions, run the whole pipeline and report every
//!   configuration error and warning
//! - `show` - print one resolved object (or template) as JSON
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - log the processing steps to stderr
//! - `--quiet` / `-q` - print nothing but failures
//! - `--config` / `-c` - settings file (see [`crate::config`])
//!
//! Logging follows `RUST_LOG` when it is set, so that
//! `RUST_LOG=monconf=trace monconf check objects.cfg` shows per-object detail.
//!
//! # Examples
//!
//! ```bash
//! monconf check hosts.cfg services.cfg
//! monconf --config /etc/monconf/monconf.toml check --strict --format json
//! monconf show service "web01/HTTP" objects.cfg
//! ```

mod check;
pub mod common;
mod show;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

pub use check::{CheckCommand, OutputFormat};
pub use show::ShowCommand;

/// Options shared by every command, derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter directive, or `None` to leave logging off
    pub log_level: Option<String>,
    /// Suppress everything but failures
    pub quiet: bool,
    /// Settings file path
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the stderr log subscriber. `RUST_LOG` takes precedence over the
    /// flags. Only the first call has an effect.
    pub fn init_logging(&self) {
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => match &self.log_level {
                Some(level) => EnvFilter::new(level),
                None => return,
            },
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    /// Settings from the configured file, or defaults.
    pub fn settings(&self) -> Result<Settings> {
        Settings::load(self.config_path.as_deref())
    }
}

/// Monitoring object configuration checker.
#[derive(Parser)]
#[command(
    name = "monconf",
    about = "Resolve and check Nagios-style monitoring object definitions",
    version,
    long_about = "monconf reads monitoring object definitions (hosts, services, groups, \
                  dependencies, ...), resolves templates, explodes group and generator \
                  declarations and reports every configuration problem at once."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log processing steps to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print failures
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to a monconf.toml settings file
    #[arg(short, long, global = true, env = "MONCONF_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check object definitions and report problems
    Check(CheckCommand),
    /// Print one resolved object as JSON
    Show(ShowCommand),
}

impl Cli {
    /// Run the selected command.
    pub fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging();
        self.execute_with_config(&config)
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("monconf=debug".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            quiet: self.quiet,
            config_path: self.config.clone(),
        }
    }

    pub fn execute_with_config(self, config: &CliConfig) -> Result<()> {
        match self.command {
            Commands::Check(cmd) => cmd.execute(config),
            Commands::Show(cmd) => cmd.execute(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_build_config() {
        let cli = Cli::parse_from(["monconf", "--verbose", "-c", "m.toml", "check", "a.cfg"]);
        let config = cli.build_config();
        assert_eq!(config.log_level.as_deref(), Some("monconf=debug"));
        assert_eq!(config.config_path, Some(PathBuf::from("m.toml")));
        assert!(!config.quiet);
    }

    #[test]
    fn test_quiet_and_verbose_conflict() {
        assert!(Cli::try_parse_from(["monconf", "-q", "-v", "check"]).is_err());
    }
}
