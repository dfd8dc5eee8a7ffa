//! Host and service escalations
//!
//! Escalations are exploded like dependencies: one escalation per host (and per
//! service description for service escalations).

use std::sync::LazyLock;
use tracing::debug;

use crate::collection::EntityCollection;
use crate::core::ObjectKind;
use crate::explode::{explode_group_into_names, explode_into_copies};
use crate::groups::GroupIndex;
use crate::item::Entity;
use crate::schema::{NameSpec, Property, Schema, Value};

fn escalation_schema(kind: ObjectKind) -> Schema {
    Schema::new(kind, NameSpec::Unnamed)
        .with("host_name", Property::string().required())
        .with("hostgroup_name", Property::string())
        .with("contacts", Property::list())
        .with("contact_groups", Property::list())
        .with("first_notification", Property::integer().required())
        .with("last_notification", Property::integer().required())
        .with("notification_interval", Property::integer().default_int(30))
        .with("escalation_period", Property::string().default_str(""))
        .with("escalation_options", Property::list().default_list(&["d", "u", "r", "w", "c"]))
}

pub static HOST_ESCALATION: LazyLock<Schema> =
    LazyLock::new(|| escalation_schema(ObjectKind::HostEscalation));

pub static SERVICE_ESCALATION: LazyLock<Schema> = LazyLock::new(|| {
    escalation_schema(ObjectKind::ServiceEscalation)
        .with("service_description", Property::string().required())
});

/// `last_notification` is either 0 (never stop) or not before the first one.
pub fn checks(escalation: &Entity) -> Vec<String> {
    let first = escalation.get("first_notification").and_then(Value::as_int);
    let last = escalation.get("last_notification").and_then(Value::as_int);
    match (first, last) {
        (Some(first), Some(last)) if last != 0 && last < first => vec![format!(
            "last_notification ({last}) is lower than first_notification ({first})"
        )],
        _ => Vec::new(),
    }
}

/// One escalation per host, and per service description when the kind has
/// one.
pub fn explode_escalations(escalations: &mut EntityCollection, hostgroups: &GroupIndex) {
    let per_service = escalations.schema().has("service_description");
    for id in escalations.item_ids() {
        let Some(escalation) = escalations.entity_mut(id) else {
            continue;
        };
        let hosts = explode_group_into_names(escalation, hostgroups, "host_name", "hostgroup_name");
        let services = if per_service {
            escalation.get("service_description").map(Value::to_names).unwrap_or_default()
        } else {
            vec![String::new()]
        };

        let mut variants = Vec::new();
        for host in &hosts {
            for service in &services {
                let mut variant = vec![("host_name", Value::Str(host.clone()))];
                if per_service {
                    variant.push(("service_description", Value::Str(service.clone())));
                }
                variants.push(variant);
            }
        }

        if variants.len() > 1 {
            explode_into_copies(escalations, id, variants);
        } else if let Some(variant) = variants.pop() {
            for (prop, value) in variant {
                escalation.set(prop, value);
            }
        }
    }
    debug!(kind = %escalations.kind, count = escalations.len(), "exploded escalations");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::IdGenerator;
    use crate::test_utils::raw_params;

    #[test]
    fn test_service_escalation_is_exploded_per_host_and_service() {
        let mut index = GroupIndex::new(["h1", "h2"].map(String::from));
        index.insert_group("web", ["h1", "h2"].map(String::from));
        let mut escalations =
            EntityCollection::new(ObjectKind::ServiceEscalation, IdGenerator::new());
        escalations.add_raw(&raw_params(&[
            ("hostgroup_name", &["web"]),
            ("service_description", &["HTTP,HTTPS"]),
            ("first_notification", &["3"]),
            ("last_notification", &["0"]),
        ]));

        explode_escalations(&mut escalations, &index);
        let mut targets: Vec<String> = escalations
            .items()
            .map(|e| format!("{}/{}", e.get_str("host_name").unwrap(), e.get_str("service_description").unwrap()))
            .collect();
        targets.sort();
        assert_eq!(targets, vec!["h1/HTTP", "h1/HTTPS", "h2/HTTP", "h2/HTTPS"]);
    }

    #[test]
    fn test_last_notification_before_first_is_an_error() {
        let ids = IdGenerator::new();
        let escalation = |last: &str| {
            Entity::new(
                ObjectKind::HostEscalation,
                &raw_params(&[("first_notification", &["5"]), ("last_notification", &[last])]),
                &ids,
            )
        };

        assert!(checks(&escalation("0")).is_empty());
        assert!(checks(&escalation("8")).is_empty());
        assert_eq!(checks(&escalation("2")).len(), 1);
    }
}
