//! Contacts and notification ways
//!
//! Objects that notify (hosts, services, escalations) name their recipients
//! through `contacts` and `contact_groups`. Once contact groups are flattened,
//! [`explode_contact_groups_into_contacts`] folds the members of every listed
//! group into `contacts`, so later consumers only read one property.

use std::sync::LazyLock;

use crate::collection::EntityCollection;
use crate::core::ObjectKind;
use crate::groups::{GroupIndex, Leaf};
use crate::item::Entity;
use crate::schema::{NameSpec, Property, Schema, Value};

pub static CONTACT: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(ObjectKind::Contact, NameSpec::Single("contact_name"))
        .with("contact_name", Property::string().required())
        .with("alias", Property::string())
        .with("contactgroups", Property::list())
        .with("host_notifications_enabled", Property::boolean().default_bool(true))
        .with("service_notifications_enabled", Property::boolean().default_bool(true))
        .with("host_notification_period", Property::string())
        .with("service_notification_period", Property::string())
        .with("host_notification_options", Property::list())
        .with("service_notification_options", Property::list())
        .with("host_notification_commands", Property::list())
        .with("service_notification_commands", Property::list())
        .with("notificationways", Property::list())
        .with("min_business_impact", Property::integer().default_int(0))
        .with("email", Property::string().default_str("none"))
        .with("pager", Property::string().default_str("none"))
        .with("can_submit_commands", Property::boolean().default_bool(false))
        .with("is_admin", Property::boolean().default_bool(false))
        .backfill("alias", "contact_name")
});

pub static NOTIFICATION_WAY: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(ObjectKind::NotificationWay, NameSpec::Single("notificationway_name"))
        .with("notificationway_name", Property::string().required())
        .with("host_notifications_enabled", Property::boolean().default_bool(true))
        .with("service_notifications_enabled", Property::boolean().default_bool(true))
        .with("host_notification_period", Property::string().required())
        .with("service_notification_period", Property::string().required())
        .with("host_notification_options", Property::list().default_list(&[""]))
        .with("service_notification_options", Property::list().default_list(&[""]))
        .with("host_notification_commands", Property::list())
        .with("service_notification_commands", Property::list())
        .with("min_business_impact", Property::integer().default_int(0))
});

/// A contact notifies either through notification ways or through its own
/// notification commands.
pub fn checks(contact: &Entity) -> Vec<String> {
    let has = |prop: &str| contact.get(prop).is_some_and(|v| !v.to_names().is_empty());
    if has("notificationways") {
        return Vec::new();
    }

    let mut problems = Vec::new();
    let host_enabled = contact.get("host_notifications_enabled").and_then(Value::as_bool);
    if host_enabled != Some(false) && !has("host_notification_commands") {
        problems.push("host_notification_commands property is missing".to_string());
    }
    let service_enabled = contact.get("service_notifications_enabled").and_then(Value::as_bool);
    if service_enabled != Some(false) && !has("service_notification_commands") {
        problems.push("service_notification_commands property is missing".to_string());
    }
    problems
}

/// Add the members of each item's `contact_groups` to its `contacts`.
///
/// Unknown contact groups are warnings on the item.
pub fn explode_contact_groups_into_contacts(
    collection: &mut EntityCollection,
    contact_groups: &GroupIndex,
) {
    for item in collection.items_mut() {
        let Some(expression) = item.get_str("contact_groups") else {
            continue;
        };
        let resolution = match contact_groups.resolve(&expression, Leaf::Groups) {
            Ok(resolution) => resolution,
            Err(reason) => {
                item.add_error(format!("invalid contact_groups '{expression}': {reason}"));
                continue;
            }
        };
        for group in &resolution.unknown {
            item.add_warning(format!("the contact group '{group}' is unknown"));
        }

        let mut contacts = item.get("contacts").map(|c| c.to_names()).unwrap_or_default();
        for name in resolution.names {
            if !contacts.contains(&name) {
                contacts.push(name);
            }
        }
        item.set("contacts", Value::List(contacts));
    }
}
