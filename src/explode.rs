//! Turning declarations into concrete objects
//!
//! One declaration may stand for many objects: a service attached to a hostgroup,
//! a dependency between two host lists, a service generated for every disk listed
//! on a host. Exploding replaces such a declaration by one fresh copy per target.
//! The source declaration never remains a member of its collection.

use tracing::trace;

use crate::collection::EntityCollection;
use crate::core::{EntityId, IdGenerator};
use crate::generator::parse_key_value_sequence;
use crate::groups::{GroupIndex, Leaf};
use crate::item::Entity;
use crate::schema::{PropKind, Value};

/// Properties of a generated service in which `$KEY$` and `$VALUE$` are replaced.
pub const EXPANDABLE: [&str; 4] =
    ["check_command", "aggregation", "event_handler", "service_dependencies"];

/// Resolve `name_prop` (a name expression) and `group_prop` (a group expression)
/// of `entity` into one list of target names.
///
/// The list is written back to `name_prop` (which is removed when nothing matched)
/// and `group_prop` is removed, so running this again yields the same names.
/// Unknown groups are recorded as warnings and malformed expressions as errors on
/// the entity.
pub fn explode_group_into_names(
    entity: &mut Entity,
    index: &GroupIndex,
    name_prop: &str,
    group_prop: &str,
) -> Vec<String> {
    let names_expr = entity.get_str(name_prop);
    let groups_expr = entity.get_str(group_prop);
    if names_expr.is_none() && groups_expr.is_none() {
        return Vec::new();
    }

    let mut from_groups = Vec::new();
    if let Some(expr) = &groups_expr {
        match index.resolve(expr, Leaf::Groups) {
            Ok(resolution) => {
                for group in resolution.unknown {
                    entity.add_warning(format!("the {group_prop} '{group}' is unknown"));
                }
                from_groups = resolution.names;
            }
            Err(reason) => entity.add_error(format!("invalid {group_prop} '{expr}': {reason}")),
        }
    }

    let names = match &names_expr {
        Some(expr) => match index.resolve_with(expr, Leaf::Names, &from_groups) {
            Ok(resolution) => resolution.names,
            Err(reason) => {
                entity.add_error(format!("invalid {name_prop} '{expr}': {reason}"));
                from_groups
            }
        },
        None => from_groups,
    };

    if names.is_empty() {
        entity.unset(name_prop);
    } else {
        let value = match entity.schema().property(name_prop).map(|p| p.kind) {
            Some(PropKind::List) => Value::List(names.clone()),
            _ => Value::Str(names.join(",")),
        };
        entity.set(name_prop, value);
    }
    entity.unset(group_prop);
    names
}

/// Replace item `id` with one copy per variant, each copy receiving the
/// variant's property values.
///
/// Copies are added unindexed; the caller reindexes once the whole collection is
/// exploded. Diagnostics of the source move to the collection. Returns the ids of
/// the copies.
pub fn explode_into_copies(
    collection: &mut EntityCollection,
    id: EntityId,
    variants: Vec<Vec<(&'static str, Value)>>,
) -> Vec<EntityId> {
    let Some(source) = collection.remove_item(id) else {
        return Vec::new();
    };
    let ids = collection.ids().clone();

    let mut created = Vec::with_capacity(variants.len());
    for variant in variants {
        let mut copy = source.copy(&ids);
        for (prop, value) in variant {
            copy.set(prop, value);
        }
        created.push(copy.id);
        collection.add_item(copy, false);
    }

    move_diagnostics(collection, &source);
    trace!(source = %source.get_name(), copies = created.len(), "exploded");
    created
}

/// Replace item `id` with one copy per name, each with `prop` set to that name.
pub fn explode_multi_name_entity(
    collection: &mut EntityCollection,
    id: EntityId,
    prop: &'static str,
    names: &[String],
) -> Vec<EntityId> {
    let variants = names.iter().map(|name| vec![(prop, Value::Str(name.clone()))]).collect();
    explode_into_copies(collection, id, variants)
}

/// Generate the copies of `generator` driven by the custom variable named in its
/// `duplicate_foreach` property, read on `reference`.
///
/// Keys listed in the matching exclusion variable (`_!NAME`) are skipped. A
/// generator the reference does not feed produces nothing. Malformed sequences
/// are returned as an error message meant for the reference object.
pub fn explode_duplicate_foreach(
    generator: &Entity,
    reference: &Entity,
    ids: &IdGenerator,
) -> Result<Vec<Entity>, String> {
    let Some(custom) = generator.get_str("duplicate_foreach").filter(|c| !c.trim().is_empty())
    else {
        return Ok(Vec::new());
    };
    let custom = custom.trim().to_uppercase();
    let bare = custom.trim_start_matches('_');
    let key = format!("_{bare}");
    let Some(entry) = reference.custom(&key) else {
        return Ok(Vec::new());
    };

    let invalid = |name: &str, value: &str, reason: String| {
        format!(
            "The custom property '{name}' of the {} '{}' is not a valid entry '{value}' for a service generator: {reason}",
            reference.kind,
            reference.get_name()
        )
    };

    let default = generator.get_str("default_value").filter(|d| !d.is_empty());
    let entries = parse_key_value_sequence(entry, default.as_deref())
        .map_err(|e| invalid(&key, entry, e.to_string()))?;

    let exclusion_key = format!("_!{bare}");
    let excluded: Vec<String> = match reference.custom(&exclusion_key) {
        Some(value) => parse_key_value_sequence(value, None)
            .map_err(|e| invalid(&exclusion_key, value, e.to_string()))?
            .into_iter()
            .map(|kv| kv.key)
            .collect(),
        None => Vec::new(),
    };

    let mut copies = Vec::new();
    for kv in entries.into_iter().filter(|kv| !excluded.contains(&kv.key)) {
        let mut copy = generator.copy(ids);
        copy.unset("duplicate_foreach");
        if let Some(description) = generator.get("service_description") {
            copy.set("service_description", description.map_text(|s| kv.substitute_name(s)));
        }
        for prop in EXPANDABLE {
            if let Some(value) = generator.get(prop) {
                copy.set(prop, value.map_text(|s| kv.substitute(s)));
            }
        }
        copies.push(copy);
    }
    Ok(copies)
}

/// Move the diagnostics of a removed source entity onto the collection.
pub fn move_diagnostics(collection: &mut EntityCollection, source: &Entity) {
    let name = source.get_name();
    collection
        .configuration_errors
        .extend(source.configuration_errors.iter().map(|e| format!("{name}: {e}")));
    collection
        .configuration_warnings
        .extend(source.configuration_warnings.iter().map(|w| format!("{name}: {w}")));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ObjectKind;
    use crate::test_utils::raw_params;

    fn generator(ids: &IdGenerator) -> Entity {
        Entity::new(
            ObjectKind::Service,
            &raw_params(&[
                ("service_description", &["Disk $KEY$"]),
                ("check_command", &["check_disk!$KEY$"]),
                ("duplicate_foreach", &["_disks"]),
            ]),
            ids,
        )
    }

    fn host(ids: &IdGenerator, customs: &[(&str, &[&str])]) -> Entity {
        let mut params = raw_params(&[("host_name", &["srv1"])]);
        params.extend(raw_params(customs));
        Entity::new(ObjectKind::Host, &params, ids)
    }

    #[test]
    fn test_duplicate_foreach_creates_one_copy_per_key() {
        let ids = IdGenerator::new();
        let host = host(&ids, &[("_DISKS", &["sda,sdb,sdc"])]);
        let copies = explode_duplicate_foreach(&generator(&ids), &host, &ids).unwrap();

        let commands: Vec<String> =
            copies.iter().filter_map(|c| c.get_str("check_command")).collect();
        assert_eq!(commands, vec!["check_disk!sda", "check_disk!sdb", "check_disk!sdc"]);
        assert_eq!(copies[0].get_str("service_description").as_deref(), Some("Disk sda"));
        assert!(copies.iter().all(|c| !c.has("duplicate_foreach")));
    }

    #[test]
    fn test_duplicate_foreach_honours_exclusions() {
        let ids = IdGenerator::new();
        let host = host(&ids, &[("_DISKS", &["sda,sdb,sdc"]), ("_!DISKS", &["sdb"])]);
        let copies = explode_duplicate_foreach(&generator(&ids), &host, &ids).unwrap();

        let keys: Vec<String> = copies.iter().filter_map(|c| c.get_str("check_command")).collect();
        assert_eq!(keys, vec!["check_disk!sda", "check_disk!sdc"]);
    }

    #[test]
    fn test_duplicate_foreach_without_custom_creates_nothing() {
        let ids = IdGenerator::new();
        let host = host(&ids, &[]);
        assert!(explode_duplicate_foreach(&generator(&ids), &host, &ids).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_foreach_reports_bad_syntax() {
        let ids = IdGenerator::new();
        let host = host(&ids, &[("_DISKS", &["sda$(oops"])]);
        let error = explode_duplicate_foreach(&generator(&ids), &host, &ids).unwrap_err();

        assert!(error.contains("'_DISKS' of the host 'srv1'"));
    }

    #[test]
    fn test_group_explosion_is_idempotent() {
        let ids = IdGenerator::new();
        let mut index = GroupIndex::new(["h1", "h2", "h3"].map(String::from));
        index.insert_group("grpA", ["h1", "h2"].map(String::from));
        index.insert_group("grpB", ["h2", "h3"].map(String::from));
        let mut service = Entity::new(
            ObjectKind::Service,
            &raw_params(&[("hostgroup_name", &["grpA,grpB"]), ("host_name", &["!h2"])]),
            &ids,
        );

        let first = explode_group_into_names(&mut service, &index, "host_name", "hostgroup_name");
        let second = explode_group_into_names(&mut service, &index, "host_name", "hostgroup_name");
        assert_eq!(first, vec!["h1", "h3"]);
        assert_eq!(first, second);
        assert_eq!(service.get_str("host_name").as_deref(), Some("h1,h3"));
        assert!(!service.has("hostgroup_name"));
    }

    #[test]
    fn test_unknown_group_is_a_warning() {
        let ids = IdGenerator::new();
        let index = GroupIndex::new(["h1".to_string()]);
        let mut service =
            Entity::new(ObjectKind::Service, &raw_params(&[("hostgroup_name", &["ghost"])]), &ids);

        let names = explode_group_into_names(&mut service, &index, "host_name", "hostgroup_name");
        assert!(names.is_empty());
        assert!(!service.has("host_name"));
        assert!(service.configuration_errors.is_empty());
        assert!(service.configuration_warnings.iter().any(|w| w.contains("'ghost' is unknown")));
    }

    #[test]
    fn test_multi_name_explosion_replaces_source() {
        let mut services = EntityCollection::new(ObjectKind::Service, IdGenerator::new());
        let source = services.add_raw(&raw_params(&[
            ("host_name", &["h1,h2"]),
            ("service_description", &["HTTP"]),
        ]));

        let names = vec!["h1".to_string(), "h2".to_string()];
        let copies = explode_multi_name_entity(&mut services, source, "host_name", &names);
        services.reindex();

        assert_eq!(copies.len(), 2);
        assert!(services.entity(source).is_none());
        assert_eq!(services.item_names().into_iter().collect::<Vec<_>>(), vec!["h1/HTTP", "h2/HTTP"]);
    }
}
