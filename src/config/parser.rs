//! Generic TOML parsing with file path context.
//!
//! ```rust,no_run
//! use monconf::config::{Settings, parse_config};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let settings: Settings = parse_config(Path::new("monconf.toml"))?;
//! println!("{} definition files", settings.sources.files.len());
//! # Ok(())
//! # }
//! ```
//!
//! Failures name the file and the step that failed:
//!
//! ```text
//! Failed to parse config file: /etc/monconf/monconf.toml
//! Caused by:
//!     invalid type: string "yes", expected a boolean
//! ```

use anyhow::{Context, Result};
use std::path::Path;

/// Read `path` and deserialize its TOML content into `T`.
///
/// # Errors
///
/// Returns an error when the file cannot be read or when its content is not
/// valid TOML for `T`. Both carry the file path as context.
pub fn parse_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: T = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[derive(serde::Deserialize)]
    struct Limits {
        name: String,
        max_hosts: u32,
    }

    #[test]
    fn test_parse_config() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("limits.toml");
        std::fs::write(&path, "name = \"lab\"\nmax_hosts = 42\n").unwrap();

        let limits: Limits = parse_config(&path).unwrap();
        assert_eq!(limits.name, "lab");
        assert_eq!(limits.max_hosts, 42);
    }

    #[test]
    fn test_parse_config_errors_name_the_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("broken.toml");
        std::fs::write(&path, "name = {").unwrap();

        let error = parse_config::<Limits>(&path).err().unwrap();
        assert!(error.to_string().contains("Failed to parse config file"));
        assert!(error.to_string().contains("broken.toml"));

        let missing = parse_config::<Limits>(&temp.path().join("absent.toml")).err().unwrap();
        assert!(missing.to_string().contains("Failed to read config file"));
    }
}
