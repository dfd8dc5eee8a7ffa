//! Host and service dependencies
//!
//! A dependency names its master side (`host_name`, `service_description`) and
//! its dependent side (`dependent_host_name`, `dependent_service_description`).
//! Any host side may be given through host groups and any side may list several
//! names. Explosion replaces each declaration with one dependency per
//! combination, so that the dependency graph can be checked for loops.
//!
//! A service dependency without a dependent host ties services of the same
//! host. With `explode_hostgroup` set, a service dependency given on a host
//! group is applied on each host of the group separately.

use std::sync::LazyLock;
use tracing::debug;

use crate::collection::EntityCollection;
use crate::core::{EntityId, ObjectKind};
use crate::explode::{explode_group_into_names, explode_into_copies};
use crate::groups::GroupIndex;
use crate::item::Entity;
use crate::schema::{NameSpec, Property, Schema, Value};

pub static HOST_DEPENDENCY: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(ObjectKind::HostDependency, NameSpec::Unnamed)
        .with("host_name", Property::string().required())
        .with("hostgroup_name", Property::string())
        .with("dependent_host_name", Property::string().required())
        .with("dependent_hostgroup_name", Property::string())
        .with("inherits_parent", Property::boolean().default_bool(false))
        .with("execution_failure_criteria", Property::list().default_list(&["n"]))
        .with("notification_failure_criteria", Property::list().default_list(&["n"]))
        .with("dependency_period", Property::string().default_str(""))
});

pub static SERVICE_DEPENDENCY: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(ObjectKind::ServiceDependency, NameSpec::Unnamed)
        .with("host_name", Property::string().required())
        .with("hostgroup_name", Property::string())
        .with("service_description", Property::string().required())
        .with("dependent_host_name", Property::string().required())
        .with("dependent_hostgroup_name", Property::string())
        .with("dependent_service_description", Property::string().required())
        .with("inherits_parent", Property::boolean().default_bool(false))
        .with("execution_failure_criteria", Property::list().default_list(&["n"]))
        .with("notification_failure_criteria", Property::list().default_list(&["n"]))
        .with("dependency_period", Property::string().default_str(""))
        .with("explode_hostgroup", Property::boolean().default_bool(false))
});

type Variant = Vec<(&'static str, Value)>;

/// Replace `id` by one dependency per variant. A single variant is applied in
/// place.
fn apply_variants(deps: &mut EntityCollection, id: EntityId, variants: Vec<Variant>) {
    if variants.len() > 1 {
        explode_into_copies(deps, id, variants);
    } else if let Some(variant) = variants.into_iter().next()
        && let Some(dep) = deps.entity_mut(id)
    {
        for (prop, value) in variant {
            dep.set(prop, value);
        }
    }
}

fn names(dep: &Entity, prop: &str) -> Vec<String> {
    dep.get(prop).map(Value::to_names).unwrap_or_default()
}

/// One host dependency per (host, dependent host) pair.
pub fn explode_host_dependencies(deps: &mut EntityCollection, hostgroups: &GroupIndex) {
    for id in deps.item_ids() {
        let Some(dep) = deps.entity_mut(id) else {
            continue;
        };
        let hosts = explode_group_into_names(dep, hostgroups, "host_name", "hostgroup_name");
        let dependents = explode_group_into_names(
            dep,
            hostgroups,
            "dependent_host_name",
            "dependent_hostgroup_name",
        );

        let mut variants = Vec::new();
        for host in &hosts {
            for dependent in &dependents {
                variants.push(vec![
                    ("host_name", Value::Str(host.clone())),
                    ("dependent_host_name", Value::Str(dependent.clone())),
                ]);
            }
        }
        apply_variants(deps, id, variants);
    }
    debug!(count = deps.len(), "exploded host dependencies");
}

/// One service dependency per (host, service, dependent host, dependent service)
/// combination.
pub fn explode_service_dependencies(deps: &mut EntityCollection, hostgroups: &GroupIndex) {
    for id in deps.item_ids() {
        let Some(dep) = deps.entity_mut(id) else {
            continue;
        };
        let per_host = dep.get("explode_hostgroup").and_then(Value::as_bool) == Some(true)
            && dep.has("hostgroup_name");
        let same_host = per_host
            || (!dep.has("dependent_host_name") && !dep.has("dependent_hostgroup_name"));

        let hosts = explode_group_into_names(dep, hostgroups, "host_name", "hostgroup_name");
        let dependents = if same_host {
            dep.unset("dependent_hostgroup_name");
            Vec::new()
        } else {
            explode_group_into_names(
                dep,
                hostgroups,
                "dependent_host_name",
                "dependent_hostgroup_name",
            )
        };
        let services = names(dep, "service_description");
        let dependent_services = names(dep, "dependent_service_description");

        let mut variants = Vec::new();
        for host in &hosts {
            let dependent_hosts =
                if same_host { std::slice::from_ref(host) } else { dependents.as_slice() };
            for dependent_host in dependent_hosts {
                for service in &services {
                    for dependent_service in &dependent_services {
                        variants.push(vec![
                            ("host_name", Value::Str(host.clone())),
                            ("service_description", Value::Str(service.clone())),
                            ("dependent_host_name", Value::Str(dependent_host.clone())),
                            ("dependent_service_description", Value::Str(dependent_service.clone())),
                        ]);
                    }
                }
            }
        }
        apply_variants(deps, id, variants);
    }
    debug!(count = deps.len(), "exploded service dependencies");
}
