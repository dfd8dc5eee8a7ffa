//! Helpers shared by the CLI commands

use anyhow::Result;
use std::path::PathBuf;
use tracing::debug;

use crate::config::Settings;
use crate::core::MonconfError;
use crate::parser::read_definitions;
use crate::pipeline::ObjectConfig;

/// Definition files from the settings followed by those given on the command
/// line.
pub fn collect_files(settings: &Settings, extra: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = settings.definition_files()?;
    files.extend(extra.iter().cloned());
    if files.is_empty() {
        return Err(MonconfError::SettingsError {
            message: "no definition files given on the command line or in [sources]".to_string(),
        }
        .into());
    }
    Ok(files)
}

/// Read every file and run the pipeline over their objects.
///
/// Returns the processed configuration and whether it is free of errors.
pub fn load_objects(files: &[PathBuf]) -> Result<(ObjectConfig, bool)> {
    let mut config = ObjectConfig::new();
    for file in files {
        let objects = read_definitions(file)?;
        debug!(file = %file.display(), blocks = objects.len(), "read definitions");
        config.add_definitions(objects);
    }
    let valid = config.run();
    Ok((config, valid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Sources;
    use tempfile::tempdir;

    #[test]
    fn test_no_files_is_a_settings_error() {
        let error = collect_files(&Settings::default(), &[]).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<MonconfError>(),
            Some(MonconfError::SettingsError { .. })
        ));
    }

    #[test]
    fn test_command_line_files_come_last() {
        let settings = Settings {
            sources: Sources { files: vec![PathBuf::from("a.cfg")], dirs: Vec::new() },
            ..Settings::default()
        };
        let files = collect_files(&settings, &[PathBuf::from("b.cfg")]).unwrap();
        assert_eq!(files, vec![PathBuf::from("a.cfg"), PathBuf::from("b.cfg")]);
    }

    #[test]
    fn test_load_objects_across_files() {
        let temp = tempdir().unwrap();
        let commands = temp.path().join("commands.cfg");
        let hosts = temp.path().join("hosts.cfg");
        std::fs::write(
            &commands,
            "define command {\n command_name check_ping\n command_line /bin/ping\n}\n",
        )
        .unwrap();
        std::fs::write(
            &hosts,
            "define host {\n host_name web01\n check_command check_ping\n check_period 24x7\n notification_period 24x7\n}\n",
        )
        .unwrap();

        let (config, valid) = load_objects(&[commands, hosts]).unwrap();
        assert!(valid, "{:?}", config.diagnostics());
        assert!(config.hosts.find("web01").is_some());
    }
}
