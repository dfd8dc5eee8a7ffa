//! Hosts
//!
//! Besides their schema, hosts carry two pieces of behaviour used by the
//! pipeline: their `parents` form a tree checked for loops, and every parent must
//! name a known host.

use std::sync::LazyLock;

use crate::collection::EntityCollection;
use crate::core::ObjectKind;
use crate::schema::{NameSpec, Property, Schema};

pub static HOST: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(ObjectKind::Host, NameSpec::Single("host_name"))
        .with("host_name", Property::string().required())
        .with("alias", Property::string().required())
        .with("display_name", Property::string())
        .with("address", Property::string().required())
        .with("parents", Property::list())
        .with("hostgroups", Property::list())
        .with("check_command", Property::string().default_str("_internal_host_up"))
        .with("initial_state", Property::character().default_str("u"))
        .with("max_check_attempts", Property::integer().default_int(1))
        .with("check_interval", Property::integer().default_int(0))
        .with("retry_interval", Property::integer().default_int(0))
        .with("active_checks_enabled", Property::boolean().default_bool(true))
        .with("passive_checks_enabled", Property::boolean().default_bool(true))
        .with("check_period", Property::string().required())
        .with("obsess_over_host", Property::boolean().default_bool(false))
        .with("check_freshness", Property::boolean().default_bool(false))
        .with("freshness_threshold", Property::integer().default_int(0))
        .with("event_handler", Property::string().default_str(""))
        .with("event_handler_enabled", Property::boolean().default_bool(false))
        .with("flap_detection_enabled", Property::boolean().default_bool(true))
        .with("low_flap_threshold", Property::integer().default_int(25))
        .with("high_flap_threshold", Property::integer().default_int(50))
        .with("process_perf_data", Property::boolean().default_bool(true))
        .with("contacts", Property::list())
        .with("contact_groups", Property::list())
        .with("notification_interval", Property::integer().default_int(60))
        .with("first_notification_delay", Property::integer().default_int(0))
        .with("notification_period", Property::string().required())
        .with("notification_options", Property::list().default_list(&["d", "u", "r", "f"]))
        .with("notifications_enabled", Property::boolean().default_bool(true))
        .with("notes", Property::string().default_str(""))
        .with("notes_url", Property::string().default_str(""))
        .with("action_url", Property::string().default_str(""))
        .with("icon_image", Property::string().default_str(""))
        .with("realm", Property::string().default_str(""))
        .with("maintenance_period", Property::string().default_str(""))
        .with("business_impact", Property::integer().default_int(2))
        .with("poller_tag", Property::string().default_str("None"))
        .with("reactionner_tag", Property::string().default_str("None"))
        .with("escalations", Property::list())
        .with("service_excludes", Property::list())
        .with("service_overrides", Property::list().no_split())
        .special(&["check_period", "notification_period"])
        .backfill("alias", "host_name")
        .backfill("address", "host_name")
        .backfill("display_name", "host_name")
});

/// Record an error on every host whose parent is not a known host.
pub fn check_parents(hosts: &mut EntityCollection) {
    let known = hosts.item_names();
    for host in hosts.items_mut() {
        let parents = host.get("parents").map(|p| p.to_names()).unwrap_or_default();
        for parent in parents {
            if !known.contains(&parent) {
                host.add_error(format!("the parent '{parent}' is unknown"));
            }
        }
    }
}
