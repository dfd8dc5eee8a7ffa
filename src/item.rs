//! Configured object instances
//!
//! An [`Entity`] is one `define` block after type conversion: a sparse map of typed
//! property values, a map of custom variables (`_NAME` keys), the additive fragments
//! (`+value`) still waiting to be composed with inherited values, and the templates
//! it inherits from once the owning collection has linked them.
//!
//! Absence matters. A property missing from [`Entity::get`] is inherited or
//! defaulted later; a present empty list is a real value and stops inheritance.
//!
//! Construction never fails. A value that does not convert is recorded in
//! [`Entity::configuration_errors`] and skipped, so one bad line never hides the
//! problems of the rest of the configuration.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use uuid::Uuid;

use crate::core::{EntityId, IdGenerator, ObjectKind};
use crate::schema::{DEFAULT_DEFINITION_ORDER, GUESSED, NameSpec, PropKind, Schema, Value};

/// Raw `key -> values` pairs of one definition block, before conversion.
///
/// A key given on several lines keeps every value in order.
pub type RawParams = BTreeMap<String, Vec<String>>;

/// Characters never allowed in object names.
pub const ILLEGAL_NAME_CHARS: &str = "`~!$%^&*\"|'<>?,()=";

/// Logical name of an entity inside its collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NameKey {
    Single(String),
    /// Composite key such as (`host_name`, `service_description`)
    Pair(String, String),
}

impl fmt::Display for NameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameKey::Single(name) => f.write_str(name),
            NameKey::Pair(first, second) => write!(f, "{first}/{second}"),
        }
    }
}

/// One configured object (or template).
#[derive(Debug, Clone, Serialize)]
pub struct Entity {
    pub id: EntityId,
    pub uuid: Uuid,
    pub kind: ObjectKind,
    #[serde(rename = "properties")]
    attrs: BTreeMap<String, Value>,
    customs: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    plus: BTreeMap<String, Vec<String>>,
    #[serde(skip)]
    pub(crate) templates: Vec<EntityId>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub configuration_errors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub configuration_warnings: Vec<String>,
}

impl Entity {
    /// Build an entity from raw parameters.
    ///
    /// - keys starting with `_` become custom variables, upper-cased, keeping only
    ///   the first raw value
    /// - a leading `+` stages the rest of the value as an additive fragment; this is
    ///   only allowed on additive list properties
    /// - keys unknown to the schema are kept with a guessed type and a warning
    pub fn new(kind: ObjectKind, params: &RawParams, ids: &IdGenerator) -> Self {
        let schema = kind.schema();
        let mut entity = Self::empty(kind, ids);

        for (key, raw) in params {
            if key.starts_with('_') {
                let name = key.to_uppercase();
                let value = raw.first().map(|v| v.trim()).unwrap_or_default();
                match value.strip_prefix('+') {
                    Some(fragment) => {
                        entity.plus.insert(name, vec![fragment.to_string()]);
                    }
                    None => {
                        entity.customs.insert(name, value.to_string());
                    }
                }
                continue;
            }

            let property = match schema.property(key) {
                Some(property) => property,
                None => {
                    entity.configuration_warnings.push(format!(
                        "Guessing the property {key} type because it is not in {kind} object properties"
                    ));
                    &GUESSED
                }
            };

            let first = raw.first().map(|v| v.trim_start()).unwrap_or_default();
            if let Some(fragment) = first.strip_prefix('+') {
                if property.kind != PropKind::List || !property.additive {
                    entity
                        .configuration_errors
                        .push(format!("A + value for a single string is not handled: {key}"));
                    continue;
                }
                let mut staged = raw.clone();
                staged[0] = fragment.to_string();
                match property.pythonize(&staged) {
                    Ok(value) => {
                        entity.plus.insert(key.clone(), value.into_items());
                    }
                    Err(reason) => entity
                        .configuration_errors
                        .push(format!("Invalid value for property {key}: {reason}")),
                }
                continue;
            }

            match property.pythonize(raw) {
                Ok(value) => {
                    entity.attrs.insert(key.clone(), value);
                }
                Err(reason) => entity
                    .configuration_errors
                    .push(format!("Invalid value for property {key}: {reason}")),
            }
        }

        entity
    }

    fn empty(kind: ObjectKind, ids: &IdGenerator) -> Self {
        Self {
            id: ids.next_id(),
            uuid: Uuid::new_v4(),
            kind,
            attrs: BTreeMap::new(),
            customs: BTreeMap::new(),
            plus: BTreeMap::new(),
            templates: Vec::new(),
            tags: BTreeSet::new(),
            configuration_errors: Vec::new(),
            configuration_warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn schema(&self) -> &'static Schema {
        self.kind.schema()
    }

    #[must_use]
    pub fn get(&self, prop: &str) -> Option<&Value> {
        self.attrs.get(prop)
    }

    /// String form of a property, when set.
    #[must_use]
    pub fn get_str(&self, prop: &str) -> Option<String> {
        self.attrs.get(prop).map(ToString::to_string)
    }

    pub fn set(&mut self, prop: impl Into<String>, value: Value) {
        self.attrs.insert(prop.into(), value);
    }

    pub fn unset(&mut self, prop: &str) -> Option<Value> {
        self.attrs.remove(prop)
    }

    #[must_use]
    pub fn has(&self, prop: &str) -> bool {
        self.attrs.contains_key(prop)
    }

    /// Every set property in name order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attrs.iter().map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn customs(&self) -> &BTreeMap<String, String> {
        &self.customs
    }

    #[must_use]
    pub fn custom(&self, name: &str) -> Option<&str> {
        self.customs.get(&name.to_uppercase()).map(String::as_str)
    }

    pub fn set_custom(&mut self, name: &str, value: impl Into<String>) {
        self.customs.insert(name.to_uppercase(), value.into());
    }

    #[must_use]
    pub fn has_plus(&self, prop: &str) -> bool {
        self.plus.contains_key(prop)
    }

    /// Consume the additive fragment of a property.
    pub fn take_plus(&mut self, prop: &str) -> Option<Vec<String>> {
        self.plus.remove(prop)
    }

    pub(crate) fn take_all_plus(&mut self) -> BTreeMap<String, Vec<String>> {
        std::mem::take(&mut self.plus)
    }

    /// True once every additive fragment has been composed.
    #[must_use]
    pub fn plus_is_empty(&self) -> bool {
        self.plus.is_empty()
    }

    /// Templates linked from `use`, in declaration order.
    #[must_use]
    pub fn templates(&self) -> &[EntityId] {
        &self.templates
    }

    /// Template names listed in `use`.
    #[must_use]
    pub fn use_names(&self) -> Vec<String> {
        self.get("use").map(Value::to_names).unwrap_or_default()
    }

    /// Templates have `register` set to false.
    #[must_use]
    pub fn is_template(&self) -> bool {
        matches!(self.get("register"), Some(Value::Bool(false)))
    }

    /// The `name` of a template.
    #[must_use]
    pub fn template_name(&self) -> Option<&str> {
        self.get("name").and_then(Value::as_str).filter(|name| !name.is_empty())
    }

    #[must_use]
    pub fn definition_order(&self) -> i64 {
        self.get("definition_order").and_then(Value::as_int).unwrap_or(DEFAULT_DEFINITION_ORDER)
    }

    #[must_use]
    pub fn imported_from(&self) -> &str {
        self.get("imported_from").and_then(Value::as_str).unwrap_or("unknown")
    }

    /// Key under which the collection indexes this (non-template) entity.
    #[must_use]
    pub fn name_key(&self) -> Option<NameKey> {
        let part = |prop: &str| {
            self.get(prop).map(ToString::to_string).filter(|name| !name.trim().is_empty())
        };
        match self.schema().name {
            NameSpec::Single(prop) => part(prop).map(NameKey::Single),
            NameSpec::Pair(first, second) => Some(NameKey::Pair(part(first)?, part(second)?)),
            NameSpec::Unnamed => None,
        }
    }

    /// Human readable name, with a fallback for anonymous objects.
    #[must_use]
    pub fn get_name(&self) -> String {
        if self.is_template() {
            return match self.template_name() {
                Some(name) => name.to_string(),
                None => format!("unnamed {} template", self.kind),
            };
        }
        match self.name_key() {
            Some(key) => key.to_string(),
            None => match self.template_name() {
                Some(name) => name.to_string(),
                None => format!("unnamed {}", self.kind),
            },
        }
    }

    /// A new entity with a fresh identity and the same content.
    ///
    /// Diagnostics are not copied; they stay with the source.
    #[must_use]
    pub fn copy(&self, ids: &IdGenerator) -> Self {
        let mut copy = self.clone();
        copy.id = ids.next_id();
        copy.uuid = Uuid::new_v4();
        copy.configuration_errors.clear();
        copy.configuration_warnings.clear();
        copy
    }

    /// A concrete copy of a template: registered, with open additive chains closed.
    #[must_use]
    pub fn copy_as_item(&self, ids: &IdGenerator) -> Self {
        let mut copy = self.copy(ids);
        copy.set("register", Value::Bool(true));
        copy.unset("name");
        let attrs = std::mem::take(&mut copy.attrs);
        copy.attrs = attrs.into_iter().map(|(k, v)| (k, v.close())).collect();
        copy
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.configuration_errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.configuration_warnings.push(message.into());
    }

    /// Schema-level checks: required properties and legal names.
    ///
    /// Properties the kind declares as special are computed by later stages and
    /// are not required here.
    #[must_use]
    pub fn is_correct(&self) -> Vec<String> {
        let schema = self.schema();
        let mut problems: Vec<String> = schema
            .properties()
            .filter(|(name, prop)| prop.required && !schema.is_special(name) && !self.has(name))
            .map(|(name, _)| format!("{name} property is missing"))
            .collect();

        for prop in schema.name_properties() {
            if let Some(Value::Str(name)) = self.get(prop)
                && let Some(bad) = name.chars().find(|c| ILLEGAL_NAME_CHARS.contains(*c))
            {
                problems.push(format!(
                    "{prop} '{name}' contains an illegal character: '{bad}'"
                ));
            }
        }

        problems
    }
}
