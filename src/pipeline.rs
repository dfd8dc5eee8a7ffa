//! The object configuration pipeline
//!
//! [`ObjectConfig`] owns one [`EntityCollection`] per object kind and runs the
//! whole load in a fixed order:
//!
//! 1. **Templates**: `use` names are linked and every property (and custom
//!    variable) is resolved through the template chains.
//! 2. **Groups**: members that name their groups are added to them, then
//!    nested groups are flattened.
//! 3. **Explosion**: services, dependencies and escalations are turned into
//!    objects bound to single hosts; contact groups are expanded into contacts.
//! 4. **Completion**: services take missing settings from their host, host
//!    service overrides are applied and defaults fill the remaining gaps.
//! 5. **Checks**: loops in host parents and dependencies, references to unknown
//!    objects, then per-kind validation.
//!
//! Nothing in the pipeline fails early. Every problem is recorded on the object
//! or collection it concerns, and [`ObjectConfig::run`] reports whether the
//! configuration is free of errors once every stage has run.
//!
//! # Example
//!
//! ```rust,no_run
//! use monconf::core::ObjectKind;
//! use monconf::item::RawParams;
//! use monconf::pipeline::ObjectConfig;
//!
//! let mut host = RawParams::new();
//! host.insert("host_name".to_string(), vec!["web01".to_string()]);
//!
//! let mut config = ObjectConfig::new();
//! config.add_raw(ObjectKind::Host, &host);
//! if !config.run() {
//!     for error in config.diagnostics().errors {
//!         eprintln!("{error}");
//!     }
//! }
//! ```

use tracing::{debug, info};

use crate::collection::{Diagnostics, EntityCollection};
use crate::core::{EntityId, IdGenerator, ObjectKind};
use crate::graph::Endpoint;
use crate::groups::GroupIndex;
use crate::item::RawParams;
use crate::parser::RawObject;
use crate::objects::{contact, dependency, escalation, groups, host, service};

/// Every collection of one configuration load.
#[derive(Debug, Clone)]
pub struct ObjectConfig {
    ids: IdGenerator,
    pub commands: EntityCollection,
    pub contacts: EntityCollection,
    pub notification_ways: EntityCollection,
    pub contact_groups: EntityCollection,
    pub hosts: EntityCollection,
    pub host_groups: EntityCollection,
    pub services: EntityCollection,
    pub service_groups: EntityCollection,
    pub host_dependencies: EntityCollection,
    pub service_dependencies: EntityCollection,
    pub host_escalations: EntityCollection,
    pub service_escalations: EntityCollection,
    /// Problems not tied to one collection, such as blocks of unknown kinds
    pub configuration_warnings: Vec<String>,
}

impl Default for ObjectConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectConfig {
    /// Empty collections sharing one id generator.
    #[must_use]
    pub fn new() -> Self {
        let ids = IdGenerator::new();
        let collection = |kind| EntityCollection::new(kind, ids.clone());
        Self {
            commands: collection(ObjectKind::Command),
            contacts: collection(ObjectKind::Contact),
            notification_ways: collection(ObjectKind::NotificationWay),
            contact_groups: collection(ObjectKind::ContactGroup),
            hosts: collection(ObjectKind::Host),
            host_groups: collection(ObjectKind::HostGroup),
            services: collection(ObjectKind::Service),
            service_groups: collection(ObjectKind::ServiceGroup),
            host_dependencies: collection(ObjectKind::HostDependency),
            service_dependencies: collection(ObjectKind::ServiceDependency),
            host_escalations: collection(ObjectKind::HostEscalation),
            service_escalations: collection(ObjectKind::ServiceEscalation),
            configuration_warnings: Vec::new(),
            ids,
        }
    }

    /// Add one raw definition block of `kind`.
    pub fn add_raw(&mut self, kind: ObjectKind, params: &RawParams) -> EntityId {
        self.collection_mut(kind).add_raw(params)
    }

    /// Add parsed definition blocks. Blocks of kinds that are not modelled are
    /// skipped with a warning.
    pub fn add_definitions(&mut self, objects: impl IntoIterator<Item = RawObject>) {
        for object in objects {
            match object.kind.parse::<ObjectKind>() {
                Ok(kind) => {
                    self.add_raw(kind, &object.params);
                }
                Err(_) => self.configuration_warnings.push(format!(
                    "objects of kind '{}' are not handled, the block at {} is skipped",
                    object.kind, object.source
                )),
            }
        }
    }

    #[must_use]
    pub fn ids(&self) -> &IdGenerator {
        &self.ids
    }

    #[must_use]
    pub fn collection(&self, kind: ObjectKind) -> &EntityCollection {
        match kind {
            ObjectKind::Command => &self.commands,
            ObjectKind::Contact => &self.contacts,
            ObjectKind::NotificationWay => &self.notification_ways,
            ObjectKind::ContactGroup => &self.contact_groups,
            ObjectKind::Host => &self.hosts,
            ObjectKind::HostGroup => &self.host_groups,
            ObjectKind::Service => &self.services,
            ObjectKind::ServiceGroup => &self.service_groups,
            ObjectKind::HostDependency => &self.host_dependencies,
            ObjectKind::ServiceDependency => &self.service_dependencies,
            ObjectKind::HostEscalation => &self.host_escalations,
            ObjectKind::ServiceEscalation => &self.service_escalations,
        }
    }

    pub fn collection_mut(&mut self, kind: ObjectKind) -> &mut EntityCollection {
        match kind {
            ObjectKind::Command => &mut self.commands,
            ObjectKind::Contact => &mut self.contacts,
            ObjectKind::NotificationWay => &mut self.notification_ways,
            ObjectKind::ContactGroup => &mut self.contact_groups,
            ObjectKind::Host => &mut self.hosts,
            ObjectKind::HostGroup => &mut self.host_groups,
            ObjectKind::Service => &mut self.services,
            ObjectKind::ServiceGroup => &mut self.service_groups,
            ObjectKind::HostDependency => &mut self.host_dependencies,
            ObjectKind::ServiceDependency => &mut self.service_dependencies,
            ObjectKind::HostEscalation => &mut self.host_escalations,
            ObjectKind::ServiceEscalation => &mut self.service_escalations,
        }
    }

    fn collections_mut(&mut self) -> [&mut EntityCollection; 12] {
        [
            &mut self.commands,
            &mut self.contacts,
            &mut self.notification_ways,
            &mut self.contact_groups,
            &mut self.hosts,
            &mut self.host_groups,
            &mut self.services,
            &mut self.service_groups,
            &mut self.host_dependencies,
            &mut self.service_dependencies,
            &mut self.host_escalations,
            &mut self.service_escalations,
        ]
    }

    /// Run every stage. Returns true iff no error was recorded anywhere.
    pub fn run(&mut self) -> bool {
        self.resolve_templates();
        self.explode();
        self.complete();
        self.check_loops();
        self.check_references();

        let mut usable = true;
        for collection in self.collections_mut() {
            usable &= collection.validate();
        }
        info!(
            hosts = self.hosts.len(),
            services = self.services.len(),
            usable,
            "configuration processed"
        );
        usable
    }

    fn resolve_templates(&mut self) {
        for collection in self.collections_mut() {
            collection.link_templates();
            collection.apply_inheritance();
        }
        debug!("templates resolved");
    }

    fn explode(&mut self) {
        groups::backfill_members(
            &mut self.host_groups,
            &mut self.hosts,
            "hostgroups",
            groups::by_name,
        );
        groups::backfill_members(
            &mut self.contact_groups,
            &mut self.contacts,
            "contactgroups",
            groups::by_name,
        );
        groups::flatten_nested(&mut self.host_groups, "hostgroup_members");
        groups::flatten_nested(&mut self.contact_groups, "contactgroup_members");

        let hostgroups = self.host_group_index();
        service::explode(&mut self.services, &mut self.hosts, &hostgroups);
        groups::backfill_members(
            &mut self.service_groups,
            &mut self.services,
            "servicegroups",
            groups::by_host_and_description,
        );
        groups::flatten_nested(&mut self.service_groups, "servicegroup_members");
        dependency::explode_host_dependencies(&mut self.host_dependencies, &hostgroups);
        dependency::explode_service_dependencies(&mut self.service_dependencies, &hostgroups);
        escalation::explode_escalations(&mut self.host_escalations, &hostgroups);
        escalation::explode_escalations(&mut self.service_escalations, &hostgroups);

        let contactgroups =
            groups::group_index(&self.contact_groups, self.contacts.item_names());
        for collection in [
            &mut self.hosts,
            &mut self.services,
            &mut self.host_escalations,
            &mut self.service_escalations,
        ] {
            contact::explode_contact_groups_into_contacts(collection, &contactgroups);
        }
        debug!("objects exploded");
    }

    /// The host group index over every known host.
    #[must_use]
    pub fn host_group_index(&self) -> GroupIndex {
        groups::group_index(&self.host_groups, self.hosts.item_names())
    }

    fn complete(&mut self) {
        service::apply_implicit_inheritance(&mut self.services, &self.hosts);
        service::apply_service_overrides(&mut self.services, &mut self.hosts);
        for collection in self.collections_mut() {
            collection.fill_default();
        }
    }

    fn check_loops(&mut self) {
        self.hosts.check_loops(Endpoint::SelfName, Endpoint::Attr("parents"), "parents");
        self.host_dependencies.check_loops(
            Endpoint::Attr("host_name"),
            Endpoint::Attr("dependent_host_name"),
            "host dependencies",
        );
        self.service_dependencies.check_loops(
            Endpoint::Pair("host_name", "service_description"),
            Endpoint::Pair("dependent_host_name", "dependent_service_description"),
            "service dependencies",
        );
    }

    /// Names used across collections must designate existing objects.
    fn check_references(&mut self) {
        host::check_parents(&mut self.hosts);

        let hosts = self.hosts.item_names();
        let commands = self.commands.item_names();
        let contacts = self.contacts.item_names();

        let host_refs: [(&mut EntityCollection, &[&str]); 5] = [
            (&mut self.services, &["host_name"]),
            (&mut self.host_dependencies, &["host_name", "dependent_host_name"]),
            (&mut self.service_dependencies, &["host_name", "dependent_host_name"]),
            (&mut self.host_escalations, &["host_name"]),
            (&mut self.service_escalations, &["host_name"]),
        ];
        for (collection, props) in host_refs {
            for entity in collection.items_mut() {
                for prop in props {
                    for name in entity.get(prop).map(|v| v.to_names()).unwrap_or_default() {
                        if !hosts.contains(&name) {
                            entity.add_error(format!("{prop}: the host '{name}' is unknown"));
                        }
                    }
                }
            }
        }

        for collection in [&mut self.hosts, &mut self.services] {
            for entity in collection.items_mut() {
                for prop in ["check_command", "event_handler"] {
                    let Some(command) = entity.get_str(prop).filter(|c| !c.is_empty()) else {
                        continue;
                    };
                    let name = command.split('!').next().unwrap_or_default().trim().to_string();
                    if name != "_internal_host_up" && !commands.contains(&name) {
                        entity.add_error(format!("{prop}: the command '{name}' is unknown"));
                    }
                }
            }
        }

        for collection in [
            &mut self.hosts,
            &mut self.services,
            &mut self.host_escalations,
            &mut self.service_escalations,
        ] {
            for entity in collection.items_mut() {
                for name in entity.get("contacts").map(|v| v.to_names()).unwrap_or_default() {
                    if !contacts.contains(&name) {
                        entity.add_warning(format!("contacts: the contact '{name}' is unknown"));
                    }
                }
            }
        }
    }

    /// Every diagnostic of every collection.
    #[must_use]
    pub fn diagnostics(&self) -> Diagnostics {
        let mut all = Diagnostics {
            errors: Vec::new(),
            warnings: self.configuration_warnings.clone(),
        };
        for kind in ObjectKind::ALL {
            all.extend(self.collection(kind).diagnostics());
        }
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Value;
    use crate::test_utils::raw_params;

    fn base_config() -> ObjectConfig {
        let mut config = ObjectConfig::new();
        config.add_raw(
            ObjectKind::Command,
            &raw_params(&[("command_name", &["check_ping"]), ("command_line", &["/bin/ping"])]),
        );
        config.add_raw(
            ObjectKind::Host,
            &raw_params(&[
                ("name", &["generic-host"]),
                ("register", &["0"]),
                ("check_period", &["24x7"]),
                ("notification_period", &["24x7"]),
                ("check_command", &["check_ping"]),
            ]),
        );
        config
    }

    #[test]
    fn test_minimal_configuration_is_usable() {
        let mut config = base_config();
        config.add_raw(
            ObjectKind::Host,
            &raw_params(&[("host_name", &["web01"]), ("use", &["generic-host"])]),
        );
        config.add_raw(
            ObjectKind::Service,
            &raw_params(&[
                ("host_name", &["web01"]),
                ("service_description", &["PING"]),
                ("check_command", &["check_ping!100"]),
            ]),
        );

        assert!(config.run(), "{:?}", config.diagnostics());
        let service = config.services.items().next().unwrap();
        assert_eq!(service.get_str("check_period").as_deref(), Some("24x7"));
        assert_eq!(service.get_str("display_name").as_deref(), Some("PING"));
    }

    #[test]
    fn test_unknown_references_are_errors() {
        let mut config = base_config();
        config.add_raw(
            ObjectKind::Service,
            &raw_params(&[
                ("host_name", &["ghost"]),
                ("service_description", &["PING"]),
                ("check_command", &["check_nothing"]),
                ("check_period", &["24x7"]),
                ("notification_period", &["24x7"]),
            ]),
        );

        assert!(!config.run());
        let errors = config.diagnostics().errors;
        assert!(errors.iter().any(|e| e.contains("the host 'ghost' is unknown")));
        assert!(errors.iter().any(|e| e.contains("the command 'check_nothing' is unknown")));
    }

    #[test]
    fn test_hostgroup_members_and_contact_groups_flow_into_services() {
        let mut config = base_config();
        for name in ["web01", "web02"] {
            config.add_raw(
                ObjectKind::Host,
                &raw_params(&[
                    ("host_name", &[name]),
                    ("use", &["generic-host"]),
                    ("hostgroups", &["web"]),
                ]),
            );
        }
        config.add_raw(ObjectKind::HostGroup, &raw_params(&[("hostgroup_name", &["web"])]));
        config.add_raw(
            ObjectKind::Contact,
            &raw_params(&[("contact_name", &["alice"]), ("notificationways", &["email"])]),
        );
        config.add_raw(
            ObjectKind::ContactGroup,
            &raw_params(&[("contactgroup_name", &["ops"]), ("members", &["alice"])]),
        );
        config.add_raw(
            ObjectKind::Service,
            &raw_params(&[
                ("hostgroup_name", &["web"]),
                ("service_description", &["HTTP"]),
                ("check_command", &["check_ping"]),
                ("contact_groups", &["ops"]),
            ]),
        );

        config.run();
        let names: Vec<String> = config.services.item_names().into_iter().collect();
        assert_eq!(names, vec!["web01/HTTP", "web02/HTTP"]);
        for service in config.services.items() {
            assert_eq!(service.get("contacts"), Some(&Value::list(&["alice"])));
        }
    }

    #[test]
    fn test_unknown_kinds_are_skipped_with_warning() {
        let mut config = ObjectConfig::new();
        let objects = crate::parser::parse_definitions(
            "define timeperiod {\n timeperiod_name 24x7\n}\ndefine command {\n command_name c\n command_line /bin/true\n}\n",
            "mixed.cfg",
        )
        .unwrap();
        config.add_definitions(objects);

        assert_eq!(config.commands.len(), 1);
        assert!(config.run());
        let warnings = config.diagnostics().warnings;
        assert!(warnings[0].contains("'timeperiod' are not handled, the block at mixed.cfg:1"));
    }

    #[test]
    fn test_service_dependency_loop_is_detected() {
        let mut config = base_config();
        config.add_raw(
            ObjectKind::Host,
            &raw_params(&[("host_name", &["h1"]), ("use", &["generic-host"])]),
        );
        for (master, dependent) in [("A", "B"), ("B", "A")] {
            config.add_raw(
                ObjectKind::ServiceDependency,
                &raw_params(&[
                    ("host_name", &["h1"]),
                    ("service_description", &[master]),
                    ("dependent_service_description", &[dependent]),
                ]),
            );
        }

        assert!(!config.run());
        let errors = config.diagnostics().errors;
        assert_eq!(errors.iter().filter(|e| e.contains("Loop detected")).count(), 2);
    }
}
