//! Test utilities for monconf
//!
//! Helpers shared by unit tests and the integration tests under `tests/`
//! (enabled there through the `test-utils` feature):
//!
//! - [`init_test_logging`] - opt-in tracing output for tests
//! - [`raw_params`] - terse construction of raw definition parameters
//! - [`ConfigFixture`] - definition files written into a temporary directory

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::item::RawParams;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. With `level` set, that level is used;
/// otherwise `RUST_LOG` is honoured when present and logging stays off when not.
///
/// ```bash
/// RUST_LOG=monconf=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// Build raw parameters from `(key, values)` pairs.
///
/// ```rust,ignore
/// let params = raw_params(&[("host_name", &["web01"]), ("parents", &["a", "b"])]);
/// ```
#[must_use]
pub fn raw_params(pairs: &[(&str, &[&str])]) -> RawParams {
    pairs
        .iter()
        .map(|(key, values)| {
            ((*key).to_string(), values.iter().map(|v| (*v).to_string()).collect())
        })
        .collect()
}

/// Object definition files in a temporary directory.
pub struct ConfigFixture {
    dir: tempfile::TempDir,
}

impl ConfigFixture {
    /// Create an empty fixture directory.
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `content` to `name` (creating parent directories) and return its path.
    pub fn write(&self, name: &str, content: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Render one `define` block.
    #[must_use]
    pub fn define(kind: &str, pairs: &[(&str, &str)]) -> String {
        let mut block = format!("define {kind} {{\n");
        for (key, value) in pairs {
            let _ = writeln!(block, "    {key:<24} {value}");
        }
        block.push_str("}\n");
        block
    }
}
