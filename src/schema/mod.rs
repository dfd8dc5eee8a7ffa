//! Per-kind property schemas
//!
//! A [`Schema`] is the declarative description of one object kind: which property
//! names it knows, how their raw strings are converted ([`PropKind`]), which are
//! required or defaulted, which accept additive `+` composition, and which property
//! (or pair of properties) names an object.
//!
//! Schemas are built once per kind (see [`crate::objects::schema_for`]) and shared
//! read-only by every entity and collection of that kind.
//!
//! Every schema carries the base properties common to all kinds:
//!
//! | property           | kind | default     |
//! |--------------------|------|-------------|
//! | `use`              | list |             |
//! | `name`             | str  |             |
//! | `register`         | bool | `1`         |
//! | `definition_order` | int  | `100`       |
//! | `imported_from`    | str  | `unknown`   |

mod property;
mod value;

pub use property::{Merging, PropKind, Property};
pub(crate) use property::GUESSED;
pub use value::Value;

use std::collections::BTreeMap;

use crate::core::ObjectKind;

/// Default precedence of a definition when two objects claim the same name.
pub const DEFAULT_DEFINITION_ORDER: i64 = 100;

/// Which properties name an object of a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSpec {
    /// A single property, e.g. `host_name`
    Single(&'static str),
    /// A composite key, e.g. (`host_name`, `service_description`)
    Pair(&'static str, &'static str),
    /// Objects of the kind are anonymous (dependencies, escalations without a name)
    Unnamed,
}

/// Property metadata for one object kind.
#[derive(Debug)]
pub struct Schema {
    pub kind: ObjectKind,
    pub name: NameSpec,
    properties: BTreeMap<&'static str, Property>,
    special: Vec<&'static str>,
    display_backfill: Vec<(&'static str, &'static str)>,
    index_on_add: bool,
}

impl Schema {
    /// Start a schema with the base properties shared by every kind.
    #[must_use]
    pub fn new(kind: ObjectKind, name: NameSpec) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert("use", Property::list().no_additive());
        properties.insert("name", Property::string());
        properties.insert("register", Property::boolean().default_bool(true));
        properties.insert(
            "definition_order",
            Property::integer().default_int(DEFAULT_DEFINITION_ORDER),
        );
        properties.insert("imported_from", Property::string().default_str("unknown"));

        Self {
            kind,
            name,
            properties,
            special: Vec::new(),
            display_backfill: Vec::new(),
            index_on_add: true,
        }
    }

    /// Declare a property.
    #[must_use]
    pub fn with(mut self, name: &'static str, property: Property) -> Self {
        self.properties.insert(name, property);
        self
    }

    /// Properties computed by later stages; their `required` flag is not checked.
    #[must_use]
    pub fn special(mut self, names: &[&'static str]) -> Self {
        self.special.extend_from_slice(names);
        self
    }

    /// Fill `display` from `source` when an object leaves it unset.
    #[must_use]
    pub fn backfill(mut self, display: &'static str, source: &'static str) -> Self {
        self.display_backfill.push((display, source));
        self
    }

    /// Objects are indexed by name only after explosion, not when added.
    #[must_use]
    pub const fn index_after_explode(mut self) -> Self {
        self.index_on_add = false;
        self
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Declared properties in name order.
    pub fn properties(&self) -> impl Iterator<Item = (&'static str, &Property)> {
        self.properties.iter().map(|(name, prop)| (*name, prop))
    }

    #[must_use]
    pub fn is_special(&self, name: &str) -> bool {
        self.special.contains(&name)
    }

    #[must_use]
    pub fn display_backfill(&self) -> &[(&'static str, &'static str)] {
        &self.display_backfill
    }

    #[must_use]
    pub const fn index_on_add(&self) -> bool {
        self.index_on_add
    }

    /// Names of the properties forming the object name.
    #[must_use]
    pub fn name_properties(&self) -> Vec<&'static str> {
        match self.name {
            NameSpec::Single(prop) => vec![prop],
            NameSpec::Pair(first, second) => vec![first, second],
            NameSpec::Unnamed => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_properties_are_present() {
        let schema = Schema::new(ObjectKind::Command, NameSpec::Single("command_name"));

        assert!(schema.has("use"));
        assert!(schema.has("register"));
        assert_eq!(
            schema.property("definition_order").and_then(|p| p.default.clone()),
            Some(Value::Int(100))
        );
        assert!(!schema.property("use").unwrap().additive);
    }

    #[test]
    fn test_builder_declares_properties() {
        let schema = Schema::new(ObjectKind::Host, NameSpec::Single("host_name"))
            .with("host_name", Property::string().required())
            .with("parents", Property::list())
            .special(&["check_period"])
            .backfill("alias", "host_name");

        assert!(schema.property("host_name").unwrap().required);
        assert!(schema.is_special("check_period"));
        assert!(!schema.is_special("parents"));
        assert_eq!(schema.display_backfill(), &[("alias", "host_name")]);
        assert_eq!(schema.name_properties(), vec!["host_name"]);
        assert!(schema.index_on_add());
    }
}
