//! Template inheritance resolution
//!
//! [`InheritanceResolver::resolve`] computes the final value of one property of one
//! entity from its own value, its pending additive fragment (`+value`) and the
//! values of the templates listed in its `use` property.
//!
//! # Rules
//!
//! 1. `register` and `name` are never inherited.
//! 2. An own value wins. A pending fragment is prepended to it; on a template the
//!    result is an open chain ([`Value::Open`]) so inheriting objects keep composing.
//! 3. Without an own value, templates are walked in `use` order. Templates yielding
//!    nothing (or an empty list) are skipped. An open chain is merged and the walk
//!    continues; the first closed value is merged, the entity's own fragment is
//!    appended, and the walk stops.
//! 4. If only open chains were found, they are combined with the entity's fragment.
//! 5. If no template provides anything, the fragment alone is the value.
//!
//! Resolved values are stored on the entity, so resolving twice returns the same
//! value and fragments are consumed exactly once.
//!
//! # Example
//!
//! ```text
//! define host { name A  parents x       register 0 }
//! define host { name B  use A  parents +y  register 0 }
//! define host { host_name C  use B  parents +z }
//! ```
//!
//! resolves `parents` of `C` to `x,y,z`.

use std::collections::{BTreeMap, HashSet};

use crate::collection::EntityCollection;
use crate::core::EntityId;
use crate::schema::Value;

/// Properties that identify an entity rather than describe it.
pub const NOT_INHERITED: [&str; 2] = ["register", "name"];

/// Resolves properties across the templates of one collection.
pub struct InheritanceResolver<'a> {
    collection: &'a mut EntityCollection,
    visiting: HashSet<EntityId>,
    visiting_customs: HashSet<EntityId>,
}

impl<'a> InheritanceResolver<'a> {
    pub fn new(collection: &'a mut EntityCollection) -> Self {
        Self {
            collection,
            visiting: HashSet::new(),
            visiting_customs: HashSet::new(),
        }
    }

    /// Final value of `prop` on entity `id`, stored on the entity.
    ///
    /// Template loops are cut: an entity reached again while it is being resolved
    /// contributes nothing.
    pub fn resolve(&mut self, id: EntityId, prop: &str) -> Option<Value> {
        if NOT_INHERITED.contains(&prop) {
            return None;
        }

        let entity = self.collection.entity_mut(id)?;
        let is_template = entity.is_template();

        if let Some(current) = entity.get(prop).cloned() {
            let Some(mut items) = entity.take_plus(prop) else {
                return Some(current);
            };
            items.extend(current.into_items());
            let value = chain(items, is_template);
            entity.set(prop, value.clone());
            return Some(value);
        }

        let templates = entity.templates.clone();
        if !self.visiting.insert(id) {
            return None;
        }

        let mut gathered: Option<Value> = None;
        for template in templates {
            let Some(value) = self.resolve(template, prop) else {
                continue;
            };
            if value.is_empty_list() {
                continue;
            }

            let still_open = value.is_open();
            let value = if is_template { value } else { value.close() };
            let merged = match gathered.take() {
                Some(previous) => merge(previous, value, is_template),
                None => value,
            };

            if !still_open {
                self.visiting.remove(&id);
                let entity = self.collection.entity_mut(id)?;
                let value = match entity.take_plus(prop) {
                    Some(fragment) => {
                        let mut items = merged.into_items();
                        items.extend(fragment);
                        chain(items, is_template)
                    }
                    None => merged,
                };
                entity.set(prop, value.clone());
                return Some(value);
            }
            gathered = Some(merged);
        }
        self.visiting.remove(&id);

        let entity = self.collection.entity_mut(id)?;
        let value = match (gathered, entity.take_plus(prop)) {
            (Some(gathered), Some(fragment)) => {
                let mut items = gathered.into_items();
                items.extend(fragment);
                chain(items, is_template)
            }
            (None, Some(fragment)) => chain(fragment, is_template),
            (Some(gathered), None) => gathered,
            (None, None) => return entity.get(prop).cloned(),
        };
        entity.set(prop, value.clone());
        Some(value)
    }

    /// Merge custom variables from templates into entity `id` and return them.
    ///
    /// Own customs override inherited ones; a pending `+` fragment for a custom is
    /// prepended, comma separated. Fragments left for keys that are not schema
    /// properties become customs themselves.
    pub fn resolve_customs(&mut self, id: EntityId) -> BTreeMap<String, String> {
        let Some(entity) = self.collection.entity(id) else {
            return BTreeMap::new();
        };
        let templates = entity.templates.clone();
        if !self.visiting_customs.insert(id) {
            return entity.customs().clone();
        }

        for template in templates {
            let inherited = self.resolve_customs(template);
            let Some(entity) = self.collection.entity_mut(id) else {
                break;
            };
            for (key, value) in inherited {
                let mut value = entity.customs().get(&key).cloned().unwrap_or(value);
                if let Some(fragment) = entity.take_plus(&key) {
                    value = prepend(&fragment, &value);
                }
                entity.set_custom(&key, value);
            }
        }
        self.visiting_customs.remove(&id);

        let Some(entity) = self.collection.entity_mut(id) else {
            return BTreeMap::new();
        };
        let own: Vec<String> = entity.customs().keys().cloned().collect();
        for key in own {
            if let Some(fragment) = entity.take_plus(&key) {
                let value = prepend(&fragment, entity.customs().get(&key).map_or("", String::as_str));
                entity.set_custom(&key, value);
            }
        }

        let schema = entity.schema();
        for (key, fragment) in entity.take_all_plus() {
            if schema.has(&key) {
                entity.add_error(format!("additive value for {key} was never resolved"));
            } else {
                entity.set_custom(&key, fragment.join(","));
            }
        }
        entity.customs().clone()
    }
}

fn chain(items: Vec<String>, open: bool) -> Value {
    if open { Value::Open(items) } else { Value::List(items) }
}

fn merge(previous: Value, next: Value, is_template: bool) -> Value {
    let open = is_template && (previous.is_open() || next.is_open());
    let mut items = previous.into_items();
    items.extend(next.into_items());
    chain(items, open)
}

fn prepend(fragment: &[String], value: &str) -> String {
    let fragment = fragment.join(",");
    if value.is_empty() { fragment } else { format!("{fragment},{value}") }
}
