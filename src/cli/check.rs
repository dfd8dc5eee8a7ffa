//! Check object definitions.
//!
//! The `check` command reads every definition file (from the settings and the
//! command line), runs the whole pipeline and lists the configuration errors
//! and warnings it recorded. The command fails when an error was found, or
//! when a warning was found in strict mode.
//!
//! # Examples
//!
//! ```bash
//! monconf check objects.cfg
//! monconf check --strict --format json hosts.cfg services.cfg
//! ```
//!
//! # Output Formats
//!
//! ## Text Format (Default)
//! ```text
//! ⚠ the contact 'bob' is unknown
//! ✗ [host::web01] check_period property is missing
//! ✗ 1 error(s), 1 warning(s)
//! ```
//!
//! ## JSON Format
//! ```json
//! {
//!   "valid": false,
//!   "strict": false,
//!   "files": ["objects.cfg"],
//!   "objects": { "host": 2, "service": 4 },
//!   "errors": ["[host::web01] check_period property is missing"],
//!   "warnings": ["the contact 'bob' is unknown"]
//! }
//! ```

use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::CliConfig;
use super::common::{collect_files, load_objects};
use crate::core::{MonconfError, ObjectKind};
use crate::pipeline::ObjectConfig;

/// Command to check object definition files.
#[derive(Args)]
pub struct CheckCommand {
    /// Definition files, read after the ones listed in the settings
    pub files: Vec<PathBuf>,

    /// Treat warnings as errors
    ///
    /// Also enabled by `strict = true` in the `[validation]` settings table.
    #[arg(long)]
    pub strict: bool,

    /// Output format for the report
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Report formats of the `check` command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored, one line per problem
    Text,
    /// A single JSON document
    Json,
}

/// Machine-readable result of a check.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub valid: bool,
    pub strict: bool,
    pub files: Vec<String>,
    /// Number of items per kind; templates are not counted
    pub objects: BTreeMap<String, usize>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl CheckReport {
    /// Summarize a processed configuration.
    #[must_use]
    pub fn new(config: &ObjectConfig, files: &[PathBuf], valid: bool, strict: bool) -> Self {
        let diagnostics = config.diagnostics();
        let objects = ObjectKind::ALL
            .into_iter()
            .map(|kind| (kind.keyword().to_string(), config.collection(kind).len()))
            .filter(|(_, count)| *count > 0)
            .collect();
        let valid = valid && !(strict && !diagnostics.warnings.is_empty());

        Self {
            valid,
            strict,
            files: files.iter().map(|f| f.display().to_string()).collect(),
            objects,
            errors: diagnostics.errors,
            warnings: diagnostics.warnings,
        }
    }

    fn print_text(&self, quiet: bool) {
        if !quiet {
            for warning in &self.warnings {
                println!("{} {}", "⚠".yellow(), warning);
            }
        }
        for error in &self.errors {
            println!("{} {}", "✗".red(), error);
        }

        if self.valid {
            if !quiet {
                let total: usize = self.objects.values().sum();
                println!(
                    "{} {} object(s) from {} file(s), {} warning(s)",
                    "✓".green(),
                    total,
                    self.files.len(),
                    self.warnings.len()
                );
            }
        } else if self.strict && self.errors.is_empty() {
            println!("{} {} warning(s) in strict mode", "✗".red(), self.warnings.len());
        } else {
            println!(
                "{} {} error(s), {} warning(s)",
                "✗".red(),
                self.errors.len(),
                self.warnings.len()
            );
        }
    }
}

impl CheckCommand {
    pub fn execute(self, config: &CliConfig) -> Result<()> {
        let settings = config.settings()?;
        let strict = self.strict || settings.validation.strict;
        let files = collect_files(&settings, &self.files)?;

        let (objects, valid) = load_objects(&files)?;
        let report = CheckReport::new(&objects, &files, valid, strict);

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Text => report.print_text(config.quiet),
        }

        if report.valid {
            Ok(())
        } else {
            Err(MonconfError::ConfigurationInvalid {
                errors: report.errors.len(),
                warnings: report.warnings.len(),
            }
            .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::raw_params;

    fn config_with_warning() -> ObjectConfig {
        let mut config = ObjectConfig::new();
        config.add_raw(
            ObjectKind::Command,
            &raw_params(&[("command_name", &["c"]), ("command_line", &["/bin/true"])]),
        );
        config.configuration_warnings.push("something odd".to_string());
        config
    }

    #[test]
    fn test_report_counts_items_per_kind() {
        let mut config = config_with_warning();
        let valid = config.run();
        let report = CheckReport::new(&config, &[PathBuf::from("a.cfg")], valid, false);

        assert!(report.valid);
        assert_eq!(report.objects.get("command"), Some(&1));
        assert!(!report.objects.contains_key("host"));
        assert_eq!(report.files, vec!["a.cfg"]);
        assert_eq!(report.warnings, vec!["something odd"]);
    }

    #[test]
    fn test_strict_report_fails_on_warnings() {
        let mut config = config_with_warning();
        let valid = config.run();
        let report = CheckReport::new(&config, &[], valid, true);
        assert!(!report.valid);
        assert!(report.errors.is_empty());
    }
}
