//! Command definitions.

use std::sync::LazyLock;

use crate::core::ObjectKind;
use crate::schema::{NameSpec, Property, Schema};

pub static COMMAND: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(ObjectKind::Command, NameSpec::Single("command_name"))
        .with("command_name", Property::string().required())
        .with("command_line", Property::string().required())
        .with("poller_tag", Property::string().default_str("None"))
        .with("reactionner_tag", Property::string().default_str("None"))
        .with("module_type", Property::string().default_str("fork"))
        .with("timeout", Property::integer().default_int(-1))
});
