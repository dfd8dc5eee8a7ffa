//! Services
//!
//! Services are the most derived objects of a configuration. One service block
//! may stand for many services:
//!
//! - `host_name` and `hostgroup_name` attach it to any number of hosts
//! - a service *template* whose `host_name` names host templates is attached to
//!   every host built from those templates
//! - `duplicate_foreach` generates one service per entry of a host custom variable
//!
//! [`explode`] turns every block into services bound to exactly one host, which
//! is also when services enter the name index. Afterwards
//! [`apply_implicit_inheritance`] copies the host's notification and scheduling
//! settings onto its services and [`apply_service_overrides`] applies the
//! `service_overrides` declared on hosts.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::collection::EntityCollection;
use crate::core::ObjectKind;
use crate::explode::{
    explode_duplicate_foreach, explode_group_into_names, explode_multi_name_entity,
    move_diagnostics,
};
use crate::groups::GroupIndex;
use crate::item::{Entity, NameKey};
use crate::schema::{GUESSED, Merging, NameSpec, Property, Schema, Value};

pub static SERVICE: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(ObjectKind::Service, NameSpec::Pair("host_name", "service_description"))
        .with("host_name", Property::string())
        .with("hostgroup_name", Property::string())
        .with("service_description", Property::string().required())
        .with("display_name", Property::string())
        .with("servicegroups", Property::list())
        .with("is_volatile", Property::boolean().default_bool(false))
        .with("check_command", Property::string().required())
        .with("initial_state", Property::character().default_str("o"))
        .with("max_check_attempts", Property::integer().default_int(1))
        .with("check_interval", Property::integer().default_int(0))
        .with("retry_interval", Property::integer().default_int(0))
        .with("active_checks_enabled", Property::boolean().default_bool(true))
        .with("passive_checks_enabled", Property::boolean().default_bool(true))
        .with("check_period", Property::string().required())
        .with("obsess_over_service", Property::boolean().default_bool(false))
        .with("check_freshness", Property::boolean().default_bool(false))
        .with("freshness_threshold", Property::integer().default_int(0))
        .with("event_handler", Property::string().default_str(""))
        .with("event_handler_enabled", Property::boolean().default_bool(false))
        .with("flap_detection_enabled", Property::boolean().default_bool(true))
        .with("low_flap_threshold", Property::integer().default_int(-1))
        .with("high_flap_threshold", Property::integer().default_int(-1))
        .with("process_perf_data", Property::boolean().default_bool(true))
        .with("notification_interval", Property::integer().default_int(60))
        .with("first_notification_delay", Property::integer().default_int(0))
        .with("notification_period", Property::string().required())
        .with("notification_options", Property::list().default_list(&["w", "u", "c", "r", "f"]))
        .with("notifications_enabled", Property::boolean().default_bool(true))
        .with("contacts", Property::list())
        .with("contact_groups", Property::list())
        .with("notes", Property::string().default_str(""))
        .with("notes_url", Property::string().default_str(""))
        .with("action_url", Property::string().default_str(""))
        .with("maintenance_period", Property::string().default_str(""))
        .with("business_impact", Property::integer().default_int(2))
        .with("poller_tag", Property::string().default_str("None"))
        .with("reactionner_tag", Property::string().default_str("None"))
        .with("escalations", Property::list())
        .with("aggregation", Property::string().default_str(""))
        .with("service_dependencies", Property::list().merging(Merging::Join))
        .with("duplicate_foreach", Property::string().default_str(""))
        .with("default_value", Property::string().default_str(""))
        .special(&["host_name", "check_period", "notification_period"])
        .backfill("display_name", "service_description")
        .index_after_explode()
});

/// Settings a service takes from its host when it does not set them itself.
pub const IMPLICIT_FROM_HOST: [&str; 10] = [
    "contacts",
    "contact_groups",
    "notification_interval",
    "notification_period",
    "check_period",
    "maintenance_period",
    "business_impact",
    "poller_tag",
    "reactionner_tag",
    "escalations",
];

/// Properties a host `service_overrides` entry may not touch.
const NOT_OVERRIDABLE: [&str; 9] = [
    "host_name",
    "service_description",
    "use",
    "name",
    "register",
    "definition_order",
    "imported_from",
    "duplicate_foreach",
    "hostgroup_name",
];

const NOTIFICATION_OPTIONS: &str = "wucrfsn";

pub fn checks(service: &Entity) -> Vec<String> {
    let mut problems = Vec::new();
    if !service.has("host_name") {
        problems.push("a service has been defined without host_name nor hostgroup_name".to_string());
    }
    let options = service.get("notification_options").map(Value::to_names).unwrap_or_default();
    for option in options {
        if option.len() != 1 || !NOTIFICATION_OPTIONS.contains(option.as_str()) {
            problems.push(format!("notification_options contains an invalid option '{option}'"));
        }
    }
    problems
}

/// Attach every service to its hosts, one service per host, then index them.
///
/// Errors found while reading generator entries are recorded on the host that
/// carries the faulty custom variable.
pub fn explode(
    services: &mut EntityCollection,
    hosts: &mut EntityCollection,
    hostgroups: &GroupIndex,
) {
    let tagged = services_from_host_tags(services, hosts);
    let ids = services.ids().clone();
    let mut host_errors: Vec<(String, String)> = Vec::new();

    for id in services.item_ids() {
        let Some(service) = services.entity_mut(id) else {
            continue;
        };
        if !service.has("host_name") && !service.has("hostgroup_name") {
            continue;
        }

        let names = explode_group_into_names(service, hostgroups, "host_name", "hostgroup_name");
        let description = service.get_str("service_description").unwrap_or_default();
        let targets: Vec<String> = names
            .into_iter()
            .filter(|host| !excludes(hosts.find(host), &description))
            .collect();
        let is_generator = service.get_str("duplicate_foreach").is_some_and(|d| !d.trim().is_empty());

        if is_generator {
            let Some(generator) = services.remove_item(id) else {
                continue;
            };
            for host_name in &targets {
                let Some(host) = hosts.find(host_name) else {
                    continue;
                };
                match explode_duplicate_foreach(&generator, host, &ids) {
                    Ok(copies) => {
                        for mut copy in copies {
                            copy.set("host_name", Value::Str(host_name.clone()));
                            let generated = copy.get_str("service_description").unwrap_or_default();
                            if !excludes(Some(host), &generated) {
                                services.add_item(copy, false);
                            }
                        }
                    }
                    Err(message) => host_errors.push((host_name.clone(), message)),
                }
            }
            move_diagnostics(services, &generator);
        } else if targets.len() > 1 {
            explode_multi_name_entity(services, id, "host_name", &targets);
        } else if let [host_name] = targets.as_slice() {
            service.set("host_name", Value::Str(host_name.clone()));
        } else if let Some(source) = services.remove_item(id) {
            services
                .configuration_warnings
                .push(format!("the service '{description}' is attached to no host and is ignored"));
            move_diagnostics(services, &source);
        }
    }

    for (host_name, message) in host_errors {
        if let Some(host) = hosts.find_by_name_mut(&NameKey::Single(host_name)) {
            host.add_error(message);
        }
    }

    services.reindex();
    debug!(services = services.len(), from_tags = tagged, "exploded services");
}

/// Registered copies of service templates for every host built from the host
/// templates they name. Returns the number of copies added.
fn services_from_host_tags(services: &mut EntityCollection, hosts: &EntityCollection) -> usize {
    let ids = services.ids().clone();
    let mut copies = Vec::new();
    for template in services.templates() {
        let Some(targets) = template.get("host_name").map(Value::to_names) else {
            continue;
        };
        for host in hosts.items() {
            if targets.iter().any(|target| host.tags.contains(target)) {
                let mut copy = template.copy_as_item(&ids);
                copy.set("host_name", Value::Str(host.get_name()));
                copies.push(copy);
            }
        }
    }

    let count = copies.len();
    for copy in copies {
        services.add_item(copy, false);
    }
    count
}

/// Whether `host` lists `description` in its `service_excludes`.
fn excludes(host: Option<&Entity>, description: &str) -> bool {
    host.and_then(|h| h.get("service_excludes"))
        .is_some_and(|excluded| excluded.to_names().iter().any(|d| d == description))
}

/// Give each service the host settings it does not define itself.
pub fn apply_implicit_inheritance(services: &mut EntityCollection, hosts: &EntityCollection) {
    for service in services.items_mut() {
        let Some(host) = service.get_str("host_name").and_then(|name| hosts.find(&name)) else {
            continue;
        };
        for prop in IMPLICIT_FROM_HOST {
            if !service.has(prop)
                && let Some(value) = host.get(prop)
            {
                service.set(prop, value.clone());
            }
        }
    }
}

/// Apply the `service_overrides` of every host.
///
/// Each entry reads `description,property value`. Malformed entries and
/// forbidden properties are errors on the host; an entry naming a service the
/// host does not have is a warning.
pub fn apply_service_overrides(services: &mut EntityCollection, hosts: &mut EntityCollection) {
    let schema = services.schema();
    for host in hosts.items_mut() {
        let Some(entries) = host.get("service_overrides").and_then(Value::items).map(<[String]>::to_vec)
        else {
            continue;
        };
        let host_name = host.get_name();

        for entry in entries {
            let Some((description, prop, raw)) = parse_override(&entry) else {
                host.add_error(format!("Error: invalid service override syntax: {entry}"));
                continue;
            };
            if NOT_OVERRIDABLE.contains(&prop.as_str()) {
                host.add_error(format!(
                    "Error: trying to override '{prop}', a forbidden property for service '{description}'"
                ));
                continue;
            }

            let key = NameKey::Pair(host_name.clone(), description.clone());
            let Some(service) = services.find_by_name_mut(&key) else {
                host.add_warning(format!(
                    "service override on host '{host_name}': service '{description}' not found"
                ));
                continue;
            };
            let property = schema.property(&prop).unwrap_or(&GUESSED);
            match property.pythonize(&[raw]) {
                Ok(value) => service.set(prop, value),
                Err(reason) => {
                    host.add_error(format!("Invalid value for overridden property {prop}: {reason}"));
                }
            }
        }
    }
}

/// `description,property value`
static OVERRIDE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^,]+),(\S+)\s+(.*)$").unwrap());

fn parse_override(entry: &str) -> Option<(String, String, String)> {
    let captures = OVERRIDE_RE.captures(entry.trim())?;
    Some((
        captures[1].trim().to_string(),
        captures[2].to_string(),
        captures[3].trim().to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::IdGenerator;
    use crate::test_utils::raw_params;

    struct World {
        hosts: EntityCollection,
        services: EntityCollection,
        index: GroupIndex,
    }

    fn world(hosts: &[&[(&str, &[&str])]]) -> World {
        let ids = IdGenerator::new();
        let mut collection = EntityCollection::new(ObjectKind::Host, ids.clone());
        for params in hosts {
            collection.add_raw(&raw_params(params));
        }
        collection.link_templates();
        let index = GroupIndex::new(collection.item_names());
        World {
            hosts: collection,
            services: EntityCollection::new(ObjectKind::Service, ids),
            index,
        }
    }

    fn service_names(services: &EntityCollection) -> Vec<String> {
        services.item_names().into_iter().collect()
    }

    #[test]
    fn test_service_is_copied_per_host() {
        let mut w = world(&[&[("host_name", &["h1"])], &[("host_name", &["h2"])]]);
        w.services.add_raw(&raw_params(&[
            ("host_name", &["h1,h2"]),
            ("service_description", &["HTTP"]),
        ]));

        explode(&mut w.services, &mut w.hosts, &w.index);
        assert_eq!(service_names(&w.services), vec!["h1/HTTP", "h2/HTTP"]);
    }

    #[test]
    fn test_service_excludes_skip_hosts() {
        let mut w = world(&[
            &[("host_name", &["h1"])],
            &[("host_name", &["h2"]), ("service_excludes", &["HTTP,SSH"])],
        ]);
        w.services.add_raw(&raw_params(&[("host_name", &["*"]), ("service_description", &["HTTP"])]));

        explode(&mut w.services, &mut w.hosts, &w.index);
        assert_eq!(service_names(&w.services), vec!["h1/HTTP"]);
    }

    #[test]
    fn test_service_without_host_is_ignored_with_warning() {
        let mut w = world(&[&[("host_name", &["h1"]), ("service_excludes", &["HTTP"])]]);
        w.services.add_raw(&raw_params(&[("host_name", &["h1"]), ("service_description", &["HTTP"])]));

        explode(&mut w.services, &mut w.hosts, &w.index);
        assert!(w.services.is_empty());
        assert!(w.services.diagnostics().warnings[0].contains("attached to no host"));
    }

    #[test]
    fn test_generator_creates_services_per_host_entry() {
        let mut w = world(&[
            &[("host_name", &["srv1"]), ("_disks", &["sda,sdb"])],
            &[("host_name", &["srv2"]), ("_disks", &["sdc"]), ("service_excludes", &["Disk sdc"])],
        ]);
        w.services.add_raw(&raw_params(&[
            ("host_name", &["srv1,srv2"]),
            ("service_description", &["Disk $KEY$"]),
            ("check_command", &["check_disk!$KEY$"]),
            ("duplicate_foreach", &["_disks"]),
        ]));

        explode(&mut w.services, &mut w.hosts, &w.index);
        assert_eq!(service_names(&w.services), vec!["srv1/Disk sda", "srv1/Disk sdb"]);
    }

    #[test]
    fn test_generator_syntax_error_lands_on_host() {
        let mut w = world(&[&[("host_name", &["srv1"]), ("_disks", &["sda$(x"])]]);
        w.services.add_raw(&raw_params(&[
            ("host_name", &["srv1"]),
            ("service_description", &["Disk $KEY$"]),
            ("duplicate_foreach", &["_disks"]),
        ]));

        explode(&mut w.services, &mut w.hosts, &w.index);
        assert!(w.services.is_empty());
        let errors = w.hosts.diagnostics().errors;
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("[host::srv1]"));
    }

    #[test]
    fn test_service_template_follows_host_tags() {
        let mut w = world(&[
            &[("name", &["linux"]), ("register", &["0"])],
            &[("host_name", &["web01"]), ("use", &["linux"])],
            &[("host_name", &["win01"])],
        ]);
        w.services.add_raw(&raw_params(&[
            ("name", &["linux-ssh"]),
            ("register", &["0"]),
            ("host_name", &["linux"]),
            ("service_description", &["SSH"]),
        ]));

        explode(&mut w.services, &mut w.hosts, &w.index);
        assert_eq!(service_names(&w.services), vec!["web01/SSH"]);
    }

    #[test]
    fn test_implicit_inheritance_fills_only_missing_settings() {
        let mut w = world(&[&[
            ("host_name", &["h1"]),
            ("contacts", &["alice"]),
            ("business_impact", &["5"]),
        ]]);
        w.services.add_raw(&raw_params(&[
            ("host_name", &["h1"]),
            ("service_description", &["HTTP"]),
            ("business_impact", &["1"]),
        ]));
        explode(&mut w.services, &mut w.hosts, &w.index);

        apply_implicit_inheritance(&mut w.services, &w.hosts);
        let service = w.services.items().next().unwrap();
        assert_eq!(service.get("contacts"), Some(&Value::list(&["alice"])));
        assert_eq!(service.get("business_impact"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_service_overrides() {
        let mut w = world(&[&[
            ("host_name", &["h1"]),
            (
                "service_overrides",
                &["HTTP,check_interval 5", "HTTP,host_name other", "FTP,check_interval 1", "garbage"],
            ),
        ]]);
        w.services.add_raw(&raw_params(&[("host_name", &["h1"]), ("service_description", &["HTTP"])]));
        explode(&mut w.services, &mut w.hosts, &w.index);

        apply_service_overrides(&mut w.services, &mut w.hosts);
        let service = w.services.items().next().unwrap();
        assert_eq!(service.get("check_interval"), Some(&Value::Int(5)));
        assert_eq!(service.get_str("host_name").as_deref(), Some("h1"));

        let diagnostics = w.hosts.diagnostics();
        assert_eq!(diagnostics.errors.len(), 2);
        assert!(diagnostics.errors.iter().any(|e| e.contains("forbidden property")));
        assert!(diagnostics.errors.iter().any(|e| e.contains("invalid service override syntax")));
        assert!(diagnostics.warnings.iter().any(|w| w.contains("'FTP' not found")));
    }

    #[test]
    fn test_parse_override_entries() {
        assert_eq!(
            parse_override(" Disk /var,check_command check_disk!20%!10% "),
            Some((
                "Disk /var".to_string(),
                "check_command".to_string(),
                "check_disk!20%!10%".to_string()
            ))
        );
        assert_eq!(
            parse_override("HTTP,check_interval 5"),
            Some(("HTTP".to_string(), "check_interval".to_string(), "5".to_string()))
        );
        assert_eq!(parse_override("HTTP check_interval 5"), None);
        assert_eq!(parse_override("HTTP,check_interval"), None);
    }

    #[test]
    fn test_checks_reject_unknown_notification_options() {
        let ids = IdGenerator::new();
        let service = Entity::new(
            ObjectKind::Service,
            &raw_params(&[("host_name", &["h1"]), ("notification_options", &["w,x"])]),
            &ids,
        );
        assert_eq!(checks(&service), vec!["notification_options contains an invalid option 'x'"]);
    }
}
