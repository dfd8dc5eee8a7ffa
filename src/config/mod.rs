//! Settings of the `monconf` binary
//!
//! The binary reads an optional `monconf.toml` given with `--config`:
//!
//! ```toml
//! [sources]
//! files = ["objects/hosts.cfg"]   # definition files
//! dirs  = ["objects/conf.d"]      # scanned recursively for *.cfg
//!
//! [validation]
//! strict = false                  # warnings also fail the check
//! ```
//!
//! Every section and key is optional. Relative paths are resolved against the
//! directory holding the settings file. Files given on the command line are
//! appended to `sources.files`.

mod parser;

pub use parser::parse_config;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Extension of object definition files found in source directories.
pub const DEFINITION_EXTENSION: &str = "cfg";

/// Root of `monconf.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub sources: Sources,
    pub validation: Validation,
}

/// Where object definitions are read from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Sources {
    pub files: Vec<PathBuf>,
    pub dirs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Validation {
    /// Treat warnings as errors
    pub strict: bool,
}

impl Settings {
    /// Load settings from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let mut settings: Self = parse_config(path)?;
        if let Some(base) = path.parent() {
            settings.sources.rebase(base);
        }
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Every definition file to read: explicit files first, then the `*.cfg`
    /// files of each directory in path order.
    pub fn definition_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = self.sources.files.clone();
        for dir in &self.sources.dirs {
            let mut found = Vec::new();
            for entry in WalkDir::new(dir).follow_links(true) {
                let entry = entry
                    .with_context(|| format!("Failed to scan definition directory: {}", dir.display()))?;
                let path = entry.path();
                if entry.file_type().is_file()
                    && path.extension().is_some_and(|ext| ext == DEFINITION_EXTENSION)
                {
                    found.push(path.to_path_buf());
                }
            }
            found.sort();
            files.extend(found);
        }
        Ok(files)
    }
}

impl Sources {
    fn rebase(&mut self, base: &Path) {
        for path in self.files.iter_mut().chain(self.dirs.iter_mut()) {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_sections_use_defaults() {
        let settings: Settings = toml::from_str("[validation]\nstrict = true\n").unwrap();
        assert!(settings.validation.strict);
        assert!(settings.sources.files.is_empty());
        assert_eq!(Settings::load(None).unwrap(), Settings::default());
    }

    #[test]
    fn test_relative_sources_follow_the_settings_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("monconf.toml");
        std::fs::write(&path, "[sources]\nfiles = [\"hosts.cfg\", \"/abs/other.cfg\"]\n").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(
            settings.sources.files,
            vec![temp.path().join("hosts.cfg"), PathBuf::from("/abs/other.cfg")]
        );
    }

    #[test]
    fn test_directories_are_scanned_for_definitions() {
        let temp = tempdir().unwrap();
        let conf = temp.path().join("conf.d");
        std::fs::create_dir_all(conf.join("nested")).unwrap();
        std::fs::write(conf.join("b.cfg"), "").unwrap();
        std::fs::write(conf.join("nested/a.cfg"), "").unwrap();
        std::fs::write(conf.join("notes.txt"), "").unwrap();

        let settings = Settings {
            sources: Sources { files: vec![PathBuf::from("first.cfg")], dirs: vec![conf.clone()] },
            ..Settings::default()
        };
        let files = settings.definition_files().unwrap();
        assert_eq!(
            files,
            vec![PathBuf::from("first.cfg"), conf.join("b.cfg"), conf.join("nested/a.cfg")]
        );
    }
}
