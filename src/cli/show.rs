//! Print one resolved object.
//!
//! The object is printed as JSON after the whole pipeline has run, so the
//! output shows inherited, implicit and default values. Services are named
//! `host/description`; templates are found by their `name` when no object
//! matches. Problems found by the pipeline do not stop the command.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tracing::debug;

use super::CliConfig;
use super::common::{collect_files, load_objects};
use crate::core::{MonconfError, ObjectKind};
use crate::item::Entity;
use crate::pipeline::ObjectConfig;

/// Command to print a resolved object.
#[derive(Args)]
pub struct ShowCommand {
    /// Object kind, as written after `define` (host, service, contactgroup...)
    pub kind: String,

    /// Object name; `host/description` for services
    pub name: String,

    /// Definition files, read after the ones listed in the settings
    pub files: Vec<PathBuf>,
}

/// Find an object by kind and display name, falling back to templates.
pub fn find_object<'a>(
    config: &'a ObjectConfig,
    kind: ObjectKind,
    name: &str,
) -> Option<&'a Entity> {
    let collection = config.collection(kind);
    collection
        .items()
        .find(|item| item.get_name() == name)
        .or_else(|| collection.find_template(name))
}

impl ShowCommand {
    pub fn execute(self, config: &CliConfig) -> Result<()> {
        let kind: ObjectKind = self.kind.parse()?;
        let settings = config.settings()?;
        let files = collect_files(&settings, &self.files)?;

        let (objects, valid) = load_objects(&files)?;
        debug!(valid, "configuration processed");

        let entity = find_object(&objects, kind, &self.name).ok_or_else(|| {
            MonconfError::ObjectNotFound {
                kind: kind.to_string(),
                name: self.name.clone(),
            }
        })?;
        println!("{}", serde_json::to_string_pretty(entity)?);
        Ok(())
    }
}
