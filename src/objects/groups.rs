//! Host, service and contact groups
//!
//! Group membership can be declared from both sides: a group lists its
//! `members`, and a member lists its groups (`hostgroups` on a host,
//! `servicegroups` on a service, `contactgroups` on a contact). Groups may also
//! include other groups through `hostgroup_members` and friends.
//!
//! Before group expressions are evaluated, [`flatten_nested`] and
//! [`backfill_members`] bring every group to its complete, flat member list and
//! [`group_index`] turns the collection into a [`GroupIndex`].
//!
//! Service groups list services as `host,description` pairs, which is why their
//! `members` are merged with [`Merging::Join`] instead of being deduplicated.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;
use tracing::debug;

use crate::collection::EntityCollection;
use crate::core::ObjectKind;
use crate::graph::CycleChecker;
use crate::groups::GroupIndex;
use crate::item::{Entity, NameKey};
use crate::schema::{Merging, NameSpec, Property, Schema, Value};

pub static HOST_GROUP: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(ObjectKind::HostGroup, NameSpec::Single("hostgroup_name"))
        .with("hostgroup_name", Property::string().required())
        .with("alias", Property::string().required())
        .with("members", Property::list())
        .with("hostgroup_members", Property::list())
        .with("notes", Property::string().default_str(""))
        .with("notes_url", Property::string().default_str(""))
        .with("action_url", Property::string().default_str(""))
        .with("realm", Property::string().default_str(""))
        .backfill("alias", "hostgroup_name")
});

pub static SERVICE_GROUP: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(ObjectKind::ServiceGroup, NameSpec::Single("servicegroup_name"))
        .with("servicegroup_name", Property::string().required())
        .with("alias", Property::string().required())
        .with("members", Property::list().merging(Merging::Join))
        .with("servicegroup_members", Property::list())
        .with("notes", Property::string().default_str(""))
        .with("notes_url", Property::string().default_str(""))
        .with("action_url", Property::string().default_str(""))
        .backfill("alias", "servicegroup_name")
});

pub static CONTACT_GROUP: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(ObjectKind::ContactGroup, NameSpec::Single("contactgroup_name"))
        .with("contactgroup_name", Property::string().required())
        .with("alias", Property::string().required())
        .with("members", Property::list())
        .with("contactgroup_members", Property::list())
        .backfill("alias", "contactgroup_name")
});

/// Merge `extra` into `members` following the `members` merging policy.
fn merge_members(
    members: &mut Vec<String>,
    extra: impl IntoIterator<Item = String>,
    merging: Merging,
) {
    for member in extra {
        if merging == Merging::Join || !members.contains(&member) {
            members.push(member);
        }
    }
}

fn members_merging(groups: &EntityCollection) -> Merging {
    groups.schema().property("members").map(|p| p.merging).unwrap_or_default()
}

/// Fold the members of nested groups (named by `nested_prop`) into `members`.
///
/// Loops between groups are errors on every group involved; the members
/// reachable without going around the loop are still merged. Unknown nested
/// groups are warnings.
pub fn flatten_nested(groups: &mut EntityCollection, nested_prop: &'static str) {
    let merging = members_merging(groups);
    let own: BTreeMap<String, (Vec<String>, Vec<String>)> = groups
        .items()
        .map(|group| {
            let members = group.get("members").map(Value::to_names).unwrap_or_default();
            let nested = group.get(nested_prop).map(Value::to_names).unwrap_or_default();
            (group.get_name(), (members, nested))
        })
        .collect();

    let mut checker = CycleChecker::new();
    for group in groups.items() {
        let name = group.get_name();
        for sub in group.get(nested_prop).map(Value::to_names).unwrap_or_default() {
            checker.add_edge(group.id, &name, &sub);
        }
    }
    for member in checker.implicated() {
        if let Some(group) = groups.entity_mut(member.entity) {
            group.add_error(format!(
                "the {} '{}' is part of a loop in {nested_prop} ('{}' includes '{}')",
                group.kind, member.from, member.from, member.to
            ));
        }
    }

    for group in groups.items_mut() {
        let name = group.get_name();
        let Some((members, nested)) = own.get(&name) else {
            continue;
        };
        if nested.is_empty() {
            continue;
        }

        let mut flat = members.clone();
        let mut seen = HashSet::from([name.clone()]);
        let mut pending: Vec<String> = nested.iter().rev().cloned().collect();
        while let Some(sub) = pending.pop() {
            if !seen.insert(sub.clone()) {
                continue;
            }
            match own.get(&sub) {
                Some((sub_members, sub_nested)) => {
                    merge_members(&mut flat, sub_members.iter().cloned(), merging);
                    pending.extend(sub_nested.iter().rev().cloned());
                }
                None => group.add_warning(format!(
                    "the {} '{sub}' listed in {nested_prop} is unknown",
                    group.kind
                )),
            }
        }
        group.set("members", Value::List(flat));
    }
    debug!(kind = %groups.kind, "flattened nested groups");
}

/// Add each member of `members` to the groups it names in `attr`.
///
/// `member_value` gives what a member contributes to a group's `members`: its
/// name, or the `host,description` pair of a service. A group unknown to
/// `groups` is a warning on the member.
pub fn backfill_members(
    groups: &mut EntityCollection,
    members: &mut EntityCollection,
    attr: &str,
    member_value: impl Fn(&Entity) -> Vec<String>,
) {
    let merging = members_merging(groups);
    let kind = groups.kind;
    for member in members.items_mut() {
        let wanted = member.get(attr).map(Value::to_names).unwrap_or_default();
        for group_name in wanted {
            match groups.find_by_name_mut(&NameKey::Single(group_name.clone())) {
                Some(group) => {
                    let mut current = group.get("members").map(Value::to_names).unwrap_or_default();
                    merge_members(&mut current, member_value(member), merging);
                    group.set("members", Value::List(current));
                }
                None => member.add_warning(format!(
                    "the {kind} '{group_name}' listed in {attr} is unknown"
                )),
            }
        }
    }
}

/// The member name a host or contact contributes to its groups.
#[must_use]
pub fn by_name(member: &Entity) -> Vec<String> {
    vec![member.get_name()]
}

/// The `host,description` pair a service contributes to its groups.
#[must_use]
pub fn by_host_and_description(service: &Entity) -> Vec<String> {
    match (service.get_str("host_name"), service.get_str("service_description")) {
        (Some(host), Some(description)) => vec![host, description],
        _ => Vec::new(),
    }
}

/// Evaluate group expressions against `groups` over the names in `universe`.
#[must_use]
pub fn group_index(
    groups: &EntityCollection,
    universe: impl IntoIterator<Item = String>,
) -> GroupIndex {
    let mut index = GroupIndex::new(universe);
    for group in groups.items() {
        let members = group.get("members").map(Value::to_names).unwrap_or_default();
        index.insert_group(&group.get_name(), members);
    }
    index
}
