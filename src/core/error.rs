//! Error handling for monconf
//!
//! Two very different kinds of failure exist in this crate and they are kept apart:
//!
//! 1. **Configuration problems** (a missing required property, a duplicate name, a
//!    dependency cycle, ...) are *data*. The object model accumulates them as plain
//!    strings on entities and collections so that a single run reports every
//!    problem at once. They never travel through `Result`.
//! 2. **Tooling failures** (an unreadable file, malformed settings, a definition
//!    block that never closes, an object the user asked for that does not exist)
//!    stop the current command. Those are [`MonconfError`] values carried inside
//!    [`anyhow::Error`].
//!
//! [`user_friendly_error`] turns any `anyhow::Error` into an [`ErrorContext`] with a
//! suggestion for the terminal.
//!
//! # Examples
//!
//! ```rust,no_run
//! use monconf::core::{MonconfError, ErrorContext};
//!
//! let context = ErrorContext::new(MonconfError::UnknownObjectKind {
//!     kind: "timeperiod".to_string(),
//! })
//! .with_suggestion("Use one of: host, service, hostgroup, ...");
//!
//! context.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for monconf tooling operations.
#[derive(Error, Debug)]
pub enum MonconfError {
    /// A definition file could not be split into object blocks
    #[error("Invalid object definition in {file} at line {line}: {reason}")]
    DefinitionParseError {
        /// File being read
        file: String,
        /// 1-based line of the offending text
        line: usize,
        /// What was wrong
        reason: String,
    },

    /// A `define` keyword (or CLI argument) named a kind that is not modelled
    #[error("Unknown object kind: {kind}")]
    UnknownObjectKind {
        /// The kind as written
        kind: String,
    },

    /// A lookup by name found nothing
    #[error("No {kind} named '{name}'")]
    ObjectNotFound {
        /// Kind searched
        kind: String,
        /// Name searched
        name: String,
    },

    /// The object configuration was processed and found unusable
    #[error("Configuration is invalid: {errors} error(s), {warnings} warning(s)")]
    ConfigurationInvalid {
        /// Number of errors reported
        errors: usize,
        /// Number of warnings reported
        warnings: usize,
    },

    /// The tool settings file is wrong
    #[error("Settings error: {message}")]
    SettingsError {
        /// Description of the problem
        message: String,
    },

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

/// User-facing wrapper adding a suggestion and details to a [`MonconfError`].
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: MonconfError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: MonconfError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with terminal colors.
    ///
    /// - Error message: red and bold
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`].
///
/// [`MonconfError`] values get tailored suggestions, IO and TOML errors found
/// anywhere in the chain get generic guidance, everything else is reported with its
/// full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let error = match error.downcast::<MonconfError>() {
        Ok(monconf_error) => return create_error_context(monconf_error),
        Err(error) => error,
    };

    if let Some(io_error) = error.chain().find_map(|e| e.downcast_ref::<std::io::Error>()) {
        let suggestion = match io_error.kind() {
            std::io::ErrorKind::NotFound => {
                "Check that the definition file or directory exists and the path is correct"
            }
            std::io::ErrorKind::PermissionDenied => {
                "Check the file permissions of the configuration files"
            }
            _ => "Check the files passed on the command line and in the settings file",
        };
        return ErrorContext::new(MonconfError::Other {
            message: full_message(&error),
        })
        .with_suggestion(suggestion);
    }

    if error.chain().any(|e| e.downcast_ref::<toml::de::Error>().is_some()) {
        return ErrorContext::new(MonconfError::Other {
            message: full_message(&error),
        })
        .with_suggestion("Check the TOML syntax of the settings file")
        .with_details("Every settings table is optional; unknown keys are rejected");
    }

    ErrorContext::new(MonconfError::Other {
        message: full_message(&error),
    })
}

fn full_message(error: &anyhow::Error) -> String {
    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }
    message
}

fn create_error_context(error: MonconfError) -> ErrorContext {
    match error {
        MonconfError::DefinitionParseError { .. } => ErrorContext::new(error)
            .with_suggestion("Each object must be written as 'define <kind> {' ... '}' with one 'key value' pair per line")
            .with_details("Lines starting with '#' or ';' are comments; text after an unescaped ';' is ignored"),

        MonconfError::UnknownObjectKind { .. } => {
            let known: Vec<&str> =
                crate::core::ObjectKind::ALL.iter().map(|k| k.keyword()).collect();
            ErrorContext::new(error).with_suggestion(format!("Use one of: {}", known.join(", ")))
        }

        MonconfError::ObjectNotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Templates are looked up by their 'name' property, objects by their kind's name property (e.g. host_name)"),

        MonconfError::ConfigurationInvalid { .. } => ErrorContext::new(error)
            .with_suggestion("Fix the errors listed above; run with --verbose for the processing steps"),

        other => ErrorContext::new(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context_display_includes_suggestion() {
        let context = ErrorContext::new(MonconfError::ObjectNotFound {
            kind: "host".to_string(),
            name: "web01".to_string(),
        })
        .with_details("details here")
        .with_suggestion("try again");

        let text = context.to_string();
        assert!(text.contains("No host named 'web01'"));
        assert!(text.contains("Details: details here"));
        assert!(text.contains("Suggestion: try again"));
    }

    #[test]
    fn test_user_friendly_error_for_unknown_kind_lists_kinds() {
        let error = anyhow::Error::from(MonconfError::UnknownObjectKind {
            kind: "timeperiod".to_string(),
        });
        let context = user_friendly_error(error);

        assert!(matches!(context.error, MonconfError::UnknownObjectKind { .. }));
        assert!(context.suggestion.unwrap().contains("hostgroup"));
    }

    #[test]
    fn test_user_friendly_error_keeps_cause_chain() {
        let error = anyhow::anyhow!("inner failure").context("outer failure");
        let context = user_friendly_error(error);

        let text = context.to_string();
        assert!(text.contains("outer failure"));
        assert!(text.contains("Caused by"));
        assert!(text.contains("inner failure"));
    }

    #[test]
    fn test_user_friendly_error_for_missing_file() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error = anyhow::Error::from(io).context("Failed to read hosts.cfg");
        let context = user_friendly_error(error);

        assert!(context.suggestion.unwrap().contains("exists"));
    }

    #[test]
    fn test_user_friendly_error_for_bad_settings_toml() {
        let toml_error = toml::from_str::<toml::Table>("strict = ").unwrap_err();
        let error = anyhow::Error::from(toml_error).context("Failed to parse config file: m.toml");
        let context = user_friendly_error(error);

        assert!(matches!(context.error, MonconfError::Other { .. }));
        assert!(context.to_string().contains("Failed to parse config file: m.toml"));
        assert!(context.suggestion.unwrap().contains("TOML syntax"));
    }
}
