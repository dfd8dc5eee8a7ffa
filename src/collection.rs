//! Indexed collections of entities
//!
//! An [`EntityCollection`] owns every entity of one kind. Concrete objects live in
//! `items`, templates in `templates`, each with its own name index:
//!
//! - items are indexed by the kind's name key (`host_name`, or the
//!   (`host_name`, `service_description`) pair for services)
//! - templates are indexed by their `name`
//!
//! A name always maps to exactly one entity. When two definitions claim the same
//! name, the one with the lower `definition_order` wins; on a tie the most recently
//! added definition wins and a warning tells the user how to disambiguate. The
//! loser is removed from the collection.
//!
//! The collection also drives the per-collection pipeline stages: template linking,
//! inheritance, default filling and validation.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, error, warn};

use crate::core::{EntityId, IdGenerator, ObjectKind};
use crate::graph::{CycleChecker, Endpoint, check_no_cycle};
use crate::inheritance::InheritanceResolver;
use crate::item::{Entity, NameKey, RawParams};
use crate::schema::{Schema, Value};

/// Errors and warnings gathered from a collection and its members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Diagnostics {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn extend(&mut self, other: Self) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// All entities of one kind.
///
/// Serializes as its kind, its templates and items in id order, and its own
/// diagnostics; the name indexes are not part of the output.
#[derive(Debug, Clone, Serialize)]
pub struct EntityCollection {
    pub kind: ObjectKind,
    #[serde(skip)]
    ids: IdGenerator,
    #[serde(serialize_with = "entities_in_order")]
    items: BTreeMap<EntityId, Entity>,
    #[serde(serialize_with = "entities_in_order")]
    templates: BTreeMap<EntityId, Entity>,
    #[serde(skip)]
    name_to_item: HashMap<NameKey, EntityId>,
    #[serde(skip)]
    name_to_template: HashMap<String, EntityId>,
    pub configuration_errors: Vec<String>,
    pub configuration_warnings: Vec<String>,
}

impl EntityCollection {
    /// Create an empty collection minting ids from `ids`.
    #[must_use]
    pub fn new(kind: ObjectKind, ids: IdGenerator) -> Self {
        Self {
            kind,
            ids,
            items: BTreeMap::new(),
            templates: BTreeMap::new(),
            name_to_item: HashMap::new(),
            name_to_template: HashMap::new(),
            configuration_errors: Vec::new(),
            configuration_warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn schema(&self) -> &'static Schema {
        self.kind.schema()
    }

    #[must_use]
    pub fn ids(&self) -> &IdGenerator {
        &self.ids
    }

    /// Convert raw parameters into an entity and add it.
    pub fn add_raw(&mut self, params: &RawParams) -> EntityId {
        let entity = Entity::new(self.kind, params, &self.ids);
        let id = entity.id;
        self.add(entity);
        id
    }

    /// Add an entity, routing templates to the template index.
    pub fn add(&mut self, entity: Entity) {
        if entity.is_template() {
            self.add_template(entity);
        } else {
            self.add_item(entity, self.schema().index_on_add());
        }
    }

    pub fn add_template(&mut self, entity: Entity) {
        let id = entity.id;
        self.templates.insert(id, entity);
        self.index_template(id);
    }

    pub fn add_item(&mut self, entity: Entity, index: bool) {
        let id = entity.id;
        self.items.insert(id, entity);
        if index {
            self.index_item(id);
        }
    }

    /// Index an item by its name key, resolving conflicts.
    ///
    /// Returns the id that owns the name afterwards. Items without a name key are
    /// kept (unindexed) and an error is recorded on them, unless the kind is
    /// anonymous.
    pub fn index_item(&mut self, id: EntityId) -> Option<EntityId> {
        let entity = self.items.get_mut(&id)?;
        let Some(key) = entity.name_key() else {
            if !entity.schema().name_properties().is_empty() {
                let props = entity.schema().name_properties().join(", ");
                entity.add_error(format!("a {} item has been defined without {props}", self.kind));
            }
            return None;
        };

        let winner = match self.name_to_item.get(&key).copied() {
            Some(existing) if existing != id => {
                let winner = self.manage_conflict(existing, id, &key.to_string(), false);
                let loser = if winner == id { existing } else { id };
                self.items.remove(&loser);
                winner
            }
            _ => id,
        };
        self.name_to_item.insert(key, winner);
        Some(winner)
    }

    /// Index a template by its `name`, resolving conflicts.
    pub fn index_template(&mut self, id: EntityId) -> Option<EntityId> {
        let entity = self.templates.get_mut(&id)?;
        let Some(name) = entity.template_name().map(String::from) else {
            entity.add_error(format!("a {} template has been defined without name", self.kind));
            return None;
        };

        let winner = match self.name_to_template.get(&name).copied() {
            Some(existing) if existing != id => {
                let winner = self.manage_conflict(existing, id, &name, true);
                let loser = if winner == id { existing } else { id };
                self.templates.remove(&loser);
                winner
            }
            _ => id,
        };
        self.name_to_template.insert(name, winner);
        Some(winner)
    }

    /// Pick which of two same-named entities survives.
    fn manage_conflict(
        &mut self,
        existing: EntityId,
        candidate: EntityId,
        name: &str,
        templates: bool,
    ) -> EntityId {
        let pool = if templates { &mut self.templates } else { &mut self.items };
        let (Some(old), Some(new)) = (pool.get(&existing), pool.get(&candidate)) else {
            return candidate;
        };

        let (old_order, new_order) = (old.definition_order(), new.definition_order());
        if old_order < new_order {
            return existing;
        }
        if new_order < old_order {
            return candidate;
        }

        let what = if templates { format!("{} template", self.kind) } else { self.kind.to_string() };
        let message = format!(
            "duplicate {what} name {name} (from {} and {}), using lastly defined. \
             You may manually set the definition_order parameter to avoid this message.",
            old.imported_from(),
            new.imported_from()
        );
        if let Some(winner) = pool.get_mut(&candidate) {
            winner.add_warning(message);
        }
        candidate
    }

    /// Drop an item and its name index entry. Unknown ids are ignored.
    pub fn remove_item(&mut self, id: EntityId) -> Option<Entity> {
        self.name_to_item.retain(|_, indexed| *indexed != id);
        self.items.remove(&id)
    }

    /// Drop a template and its name index entry. Unknown ids are ignored.
    pub fn remove_template(&mut self, id: EntityId) -> Option<Entity> {
        self.name_to_template.retain(|_, indexed| *indexed != id);
        self.templates.remove(&id)
    }

    /// Rebuild the item name index, resolving any conflict it reveals.
    pub fn reindex(&mut self) {
        self.name_to_item.clear();
        let ids: Vec<EntityId> = self.items.keys().copied().collect();
        for id in ids {
            self.index_item(id);
        }
    }

    #[must_use]
    pub fn find_by_name(&self, key: &NameKey) -> Option<&Entity> {
        self.name_to_item.get(key).and_then(|id| self.items.get(id))
    }

    pub fn find_by_name_mut(&mut self, key: &NameKey) -> Option<&mut Entity> {
        let id = self.name_to_item.get(key)?;
        self.items.get_mut(id)
    }

    /// Look up an item of a single-named kind.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Entity> {
        self.find_by_name(&NameKey::Single(name.to_string()))
    }

    #[must_use]
    pub fn find_template(&self, name: &str) -> Option<&Entity> {
        self.name_to_template.get(name).and_then(|id| self.templates.get(id))
    }

    /// Item or template with this id.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.items.get(&id).or_else(|| self.templates.get(&id))
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        match self.items.get_mut(&id) {
            Some(entity) => Some(entity),
            None => self.templates.get_mut(&id),
        }
    }

    pub fn items(&self) -> impl Iterator<Item = &Entity> {
        self.items.values()
    }

    pub fn items_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.items.values_mut()
    }

    pub fn templates(&self) -> impl Iterator<Item = &Entity> {
        self.templates.values()
    }

    #[must_use]
    pub fn item_ids(&self) -> Vec<EntityId> {
        self.items.keys().copied().collect()
    }

    #[must_use]
    pub fn template_ids(&self) -> Vec<EntityId> {
        self.templates.keys().copied().collect()
    }

    /// Names of every indexed item.
    #[must_use]
    pub fn item_names(&self) -> BTreeSet<String> {
        self.name_to_item.keys().map(ToString::to_string).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Resolve `use` names into template links and compute template tags.
    ///
    /// Unknown template names are warnings; a template using itself is an error and
    /// the reference is dropped. Template loops are reported as errors.
    pub fn link_templates(&mut self) {
        let all: Vec<EntityId> = self.templates.keys().chain(self.items.keys()).copied().collect();
        let known: Vec<String> = self.name_to_template.keys().cloned().collect();

        for id in &all {
            let Some(entity) = self.entity(*id) else {
                continue;
            };
            let mut linked = Vec::new();
            let mut errors = Vec::new();
            let mut warnings = Vec::new();

            for name in entity.use_names() {
                match self.name_to_template.get(&name) {
                    Some(tpl) if tpl == id => {
                        errors.push(format!(
                            "Error: the {} template '{name}' is using itself as a template",
                            self.kind
                        ));
                    }
                    Some(tpl) => linked.push(*tpl),
                    None => {
                        let mut message = format!(
                            "the {} template '{name}' defined for '{}' is unknown",
                            self.kind,
                            entity.get_name()
                        );
                        if let Some(similar) = closest(&name, &known) {
                            message.push_str(&format!(" (did you mean '{similar}'?)"));
                        }
                        warnings.push(message);
                    }
                }
            }

            if let Some(entity) = self.entity_mut(*id) {
                entity.templates = linked;
                entity.configuration_errors.extend(errors);
                entity.configuration_warnings.extend(warnings);
            }
        }

        self.check_template_loops();

        for id in &all {
            let tags = self.template_tags(*id);
            if let Some(entity) = self.entity_mut(*id) {
                entity.tags = tags;
            }
        }
        debug!(kind = %self.kind, templates = self.templates.len(), "linked templates");
    }

    fn check_template_loops(&mut self) {
        let mut checker = CycleChecker::new();
        for template in self.templates.values() {
            let name = template.get_name();
            for linked in &template.templates {
                if let Some(parent) = self.templates.get(linked) {
                    checker.add_edge(template.id, &name, &parent.get_name());
                }
            }
        }
        for member in checker.implicated() {
            if let Some(entity) = self.templates.get_mut(&member.entity) {
                entity.add_error(format!(
                    "the {} template '{}' is part of a template loop ('{}' uses '{}')",
                    self.kind, member.from, member.from, member.to
                ));
            }
        }
    }

    /// Names of every ancestor template, transitively.
    fn template_tags(&self, id: EntityId) -> BTreeSet<String> {
        let mut tags = BTreeSet::new();
        let mut seen = HashSet::new();
        let mut pending: Vec<EntityId> =
            self.entity(id).map(|e| e.templates.clone()).unwrap_or_default();

        while let Some(tpl) = pending.pop() {
            if !seen.insert(tpl) {
                continue;
            }
            if let Some(template) = self.templates.get(&tpl) {
                if let Some(name) = template.template_name() {
                    tags.insert(name.to_string());
                }
                pending.extend(template.templates.iter().copied());
            }
        }
        tags
    }

    /// Resolve every schema property, then custom variables, on every entity.
    ///
    /// A resolved value equal to `null` removes the property.
    pub fn apply_inheritance(&mut self) {
        let ids: Vec<EntityId> = self.items.keys().chain(self.templates.keys()).copied().collect();
        let props: Vec<&'static str> = self.schema().properties().map(|(name, _)| name).collect();

        let mut resolver = InheritanceResolver::new(self);
        for prop in props {
            for id in &ids {
                resolver.resolve(*id, prop);
            }
        }
        for id in &ids {
            resolver.resolve_customs(*id);
        }

        for id in &ids {
            if let Some(entity) = self.entity_mut(*id) {
                let nulls: Vec<String> = entity
                    .attrs()
                    .filter(|(_, value)| value.is_null())
                    .map(|(name, _)| name.to_string())
                    .collect();
                for name in nulls {
                    entity.unset(&name);
                }
            }
        }
        debug!(kind = %self.kind, "applied inheritance");
    }

    /// Give every unset property its schema default. Templates are left alone.
    pub fn fill_default(&mut self) {
        let schema = self.schema();
        for entity in self.items.values_mut() {
            for (name, prop) in schema.properties() {
                if let Some(default) = &prop.default
                    && !entity.has(name)
                {
                    entity.set(name, default.clone());
                }
            }
        }
    }

    /// Report dependency cycles between items as errors on the implicated items.
    pub fn check_loops(&mut self, from: Endpoint, to: Endpoint, relation: &str) -> usize {
        let members = check_no_cycle(self.items.values(), from, to);
        let count = members.len();
        for member in members {
            if let Some(entity) = self.items.get_mut(&member.entity) {
                entity.add_error(format!(
                    "Loop detected while checking {relation}: '{}' -> '{}'",
                    member.from, member.to
                ));
            }
        }
        count
    }

    /// Every diagnostic of the collection and its members, prefixed with the
    /// kind and name of the entity they belong to.
    #[must_use]
    pub fn diagnostics(&self) -> Diagnostics {
        let mut diagnostics = Diagnostics {
            errors: self.configuration_errors.iter().map(|e| format!("[{}] {e}", self.kind)).collect(),
            warnings: self
                .configuration_warnings
                .iter()
                .map(|w| format!("[{}] {w}", self.kind))
                .collect(),
        };
        for entity in self.templates.values().chain(self.items.values()) {
            let prefix = format!("[{}::{}]", self.kind, entity.get_name());
            diagnostics
                .errors
                .extend(entity.configuration_errors.iter().map(|e| format!("{prefix} {e}")));
            diagnostics
                .warnings
                .extend(entity.configuration_warnings.iter().map(|w| format!("{prefix} {w}")));
        }
        diagnostics
    }

    /// Check every item and report whether the collection is usable.
    ///
    /// Display attributes missing on items are filled from their source property
    /// first. Returns true iff no error is recorded on the collection, its items or
    /// its templates.
    pub fn validate(&mut self) -> bool {
        let schema = self.schema();
        for entity in self.items.values_mut() {
            for (display, source) in schema.display_backfill() {
                if !entity.has(display)
                    && let Some(value) = entity.get(source).cloned()
                {
                    entity.set(*display, Value::Str(value.to_string()));
                }
            }
            let problems = entity.is_correct();
            entity.configuration_errors.extend(problems);
            let extra = crate::objects::kind_checks(entity);
            entity.configuration_errors.extend(extra);
            if !entity.plus_is_empty() {
                entity.add_error("additive values were left unresolved after inheritance");
            }
        }

        let diagnostics = self.diagnostics();
        for message in &diagnostics.warnings {
            warn!("{message}");
        }
        for message in &diagnostics.errors {
            error!("{message}");
        }
        diagnostics.is_clean()
    }
}

fn entities_in_order<S: serde::Serializer>(
    entities: &BTreeMap<EntityId, Entity>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(entities.values())
}

/// The known name most similar to `name`, if any is close enough.
fn closest<'a>(name: &str, known: &'a [String]) -> Option<&'a str> {
    known
        .iter()
        .map(|candidate| (candidate, strsim::jaro_winkler(name, candidate)))
        .filter(|(_, score)| *score > 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(candidate, _)| candidate.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::raw_params;

    fn hosts() -> EntityCollection {
        EntityCollection::new(ObjectKind::Host, IdGenerator::new())
    }

    #[test]
    fn test_tie_keeps_last_definition_with_warning() {
        let mut hosts = hosts();
        let first = hosts.add_raw(&raw_params(&[("host_name", &["web01"]), ("alias", &["first"])]));
        let second =
            hosts.add_raw(&raw_params(&[("host_name", &["web01"]), ("alias", &["second"])]));

        assert_eq!(hosts.len(), 1);
        assert!(hosts.entity(first).is_none());
        let survivor = hosts.find("web01").unwrap();
        assert_eq!(survivor.id, second);
        assert_eq!(survivor.get_str("alias").as_deref(), Some("second"));
        assert!(survivor.configuration_warnings[0].contains("using lastly defined"));
    }

    #[test]
    fn test_lower_definition_order_wins_regardless_of_order() {
        let mut hosts = hosts();
        let preferred = hosts.add_raw(&raw_params(&[
            ("host_name", &["web01"]),
            ("definition_order", &["10"]),
        ]));
        hosts.add_raw(&raw_params(&[("host_name", &["web01"])]));

        assert_eq!(hosts.find("web01").unwrap().id, preferred);

        let mut hosts = self::hosts();
        hosts.add_raw(&raw_params(&[("host_name", &["web01"])]));
        let preferred = hosts.add_raw(&raw_params(&[
            ("host_name", &["web01"]),
            ("definition_order", &["10"]),
        ]));
        assert_eq!(hosts.find("web01").unwrap().id, preferred);
        assert!(hosts.find("web01").unwrap().configuration_warnings.is_empty());
    }

    #[test]
    fn test_template_tie_keeps_last_definition_with_warning() {
        let mut hosts = hosts();
        let first = hosts.add_raw(&raw_params(&[("name", &["generic"]), ("register", &["0"])]));
        let second = hosts.add_raw(&raw_params(&[
            ("name", &["generic"]),
            ("register", &["0"]),
            ("check_period", &["24x7"]),
        ]));

        assert_eq!(hosts.templates().count(), 1);
        assert!(hosts.entity(first).is_none());
        let survivor = hosts.find_template("generic").unwrap();
        assert_eq!(survivor.id, second);
        assert_eq!(survivor.get_str("check_period").as_deref(), Some("24x7"));
        assert!(survivor.configuration_warnings[0].contains("using lastly defined"));
    }

    #[test]
    fn test_template_lower_definition_order_wins_regardless_of_order() {
        for preferred_first in [true, false] {
            let mut hosts = hosts();
            let preferred_params = raw_params(&[
                ("name", &["generic"]),
                ("register", &["0"]),
                ("definition_order", &["5"]),
            ]);
            let plain_params = raw_params(&[("name", &["generic"]), ("register", &["0"])]);

            let preferred = if preferred_first {
                let id = hosts.add_raw(&preferred_params);
                hosts.add_raw(&plain_params);
                id
            } else {
                hosts.add_raw(&plain_params);
                hosts.add_raw(&preferred_params)
            };

            let survivor = hosts.find_template("generic").unwrap();
            assert_eq!(survivor.id, preferred);
            assert!(survivor.configuration_warnings.is_empty());
            assert_eq!(hosts.templates().count(), 1);
        }
    }

    #[test]
    fn test_nameless_template_is_kept_with_error() {
        let mut hosts = hosts();
        let id = hosts.add_raw(&raw_params(&[("register", &["0"]), ("check_period", &["24x7"])]));

        assert_eq!(hosts.templates().count(), 1);
        let template = hosts.entity(id).unwrap();
        assert!(template.is_template());
        assert_eq!(
            template.configuration_errors,
            vec!["a host template has been defined without name".to_string()]
        );
        assert!(!hosts.validate());
    }

    #[test]
    fn test_templates_have_their_own_namespace() {
        let mut hosts = hosts();
        hosts.add_raw(&raw_params(&[("name", &["web01"]), ("register", &["0"])]));
        hosts.add_raw(&raw_params(&[("host_name", &["web01"])]));

        assert!(hosts.find_template("web01").is_some());
        assert!(hosts.find("web01").is_some());
        assert_eq!(hosts.len(), 1);
    }

    #[test]
    fn test_unnamed_item_is_kept_with_error() {
        let mut hosts = hosts();
        let id = hosts.add_raw(&raw_params(&[("alias", &["nameless"])]));

        let entity = hosts.entity(id).unwrap();
        assert!(entity.configuration_errors[0].contains("without host_name"));
        assert!(!hosts.validate());
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut hosts = hosts();
        let id = hosts.add_raw(&raw_params(&[("host_name", &["a"])]));
        assert!(hosts.remove_item(id).is_some());
        assert!(hosts.remove_item(id).is_none());
        assert!(hosts.remove_template(id).is_none());
        assert!(hosts.find("a").is_none());
    }

    #[test]
    fn test_self_inheritance_is_rejected() {
        let mut hosts = hosts();
        hosts.add_raw(&raw_params(&[("name", &["base"]), ("register", &["0"])]));
        let looping = hosts.add_raw(&raw_params(&[
            ("name", &["loop"]),
            ("register", &["0"]),
            ("use", &["base,loop"]),
        ]));
        hosts.link_templates();

        let tpl = hosts.entity(looping).unwrap();
        assert_eq!(tpl.templates().len(), 1);
        assert!(tpl.configuration_errors.iter().any(|e| e.contains("using itself")));
    }

    #[test]
    fn test_unknown_template_is_a_warning_with_suggestion() {
        let mut hosts = hosts();
        hosts.add_raw(&raw_params(&[("name", &["generic-host"]), ("register", &["0"])]));
        let id = hosts.add_raw(&raw_params(&[("host_name", &["a"]), ("use", &["generic-hots"])]));
        hosts.link_templates();

        let host = hosts.entity(id).unwrap();
        assert!(host.templates().is_empty());
        assert!(host.configuration_errors.is_empty());
        assert!(host.configuration_warnings[0].contains("did you mean 'generic-host'"));
    }

    #[test]
    fn test_tags_are_transitive() {
        let mut hosts = hosts();
        hosts.add_raw(&raw_params(&[("name", &["a"]), ("register", &["0"])]));
        hosts.add_raw(&raw_params(&[("name", &["b"]), ("register", &["0"]), ("use", &["a"])]));
        let id = hosts.add_raw(&raw_params(&[("host_name", &["h"]), ("use", &["b"])]));
        hosts.link_templates();

        let tags: Vec<&str> = hosts.entity(id).unwrap().tags.iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["a", "b"]);
    }

    #[test]
    fn test_template_loop_is_reported() {
        let mut hosts = hosts();
        hosts.add_raw(&raw_params(&[("name", &["a"]), ("register", &["0"]), ("use", &["b"])]));
        hosts.add_raw(&raw_params(&[("name", &["b"]), ("register", &["0"]), ("use", &["a"])]));
        hosts.link_templates();
        hosts.apply_inheritance();

        let errors = hosts.diagnostics().errors;
        assert_eq!(errors.iter().filter(|e| e.contains("template loop")).count(), 2);
    }

    #[test]
    fn test_fill_default_skips_templates() {
        let mut hosts = hosts();
        let tpl = hosts.add_raw(&raw_params(&[("name", &["t"]), ("register", &["0"])]));
        let item = hosts.add_raw(&raw_params(&[("host_name", &["a"])]));
        hosts.fill_default();

        assert_eq!(hosts.entity(item).unwrap().get("max_check_attempts"), Some(&Value::Int(1)));
        assert!(!hosts.entity(tpl).unwrap().has("max_check_attempts"));
    }

    #[test]
    fn test_validate_backfills_display_attributes() {
        let mut hosts = hosts();
        let id = hosts.add_raw(&raw_params(&[("host_name", &["web01"])]));
        hosts.fill_default();

        assert!(hosts.validate());
        let host = hosts.entity(id).unwrap();
        assert_eq!(host.get_str("alias").as_deref(), Some("web01"));
        assert_eq!(host.get_str("address").as_deref(), Some("web01"));
    }

    #[test]
    fn test_parent_cycle_fails_validation() {
        let mut hosts = hosts();
        for (name, parent) in [("A", "B"), ("B", "C"), ("C", "A")] {
            hosts.add_raw(&raw_params(&[("host_name", &[name]), ("parents", &[parent])]));
        }
        hosts.fill_default();

        let found = hosts.check_loops(Endpoint::SelfName, Endpoint::Attr("parents"), "parents");
        assert_eq!(found, 3);
        assert!(!hosts.validate());
        let errors = hosts.diagnostics().errors;
        for name in ["A", "B", "C"] {
            assert!(errors.iter().any(|e| e.starts_with(&format!("[host::{name}]")) && e.contains("Loop")));
        }
    }

    #[test]
    fn test_collection_serializes_templates_then_items() {
        let mut hosts = hosts();
        hosts.add_raw(&raw_params(&[("name", &["generic"]), ("register", &["0"])]));
        hosts.add_raw(&raw_params(&[("host_name", &["web01"]), ("use", &["generic"])]));

        let json = serde_json::to_value(&hosts).unwrap();
        assert_eq!(json["kind"], "host");
        assert_eq!(json["templates"][0]["properties"]["name"], "generic");
        assert_eq!(json["items"][0]["properties"]["host_name"], "web01");
        assert!(json.get("name_to_item").is_none());
    }
}
