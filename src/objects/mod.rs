//! Object kinds
//!
//! One submodule per family of kinds. Each declares the property schema of its
//! kinds and the kind-specific steps of the pipeline that the generic engine
//! (collections, inheritance, explosion) does not know about:
//!
//! | module         | kinds                                   | specific steps                         |
//! |----------------|-----------------------------------------|----------------------------------------|
//! | [`command`]    | command                                 |                                        |
//! | [`contact`]    | contact, notificationway                | contact groups expanded into contacts  |
//! | [`groups`]     | hostgroup, servicegroup, contactgroup   | nesting, membership back-fill          |
//! | [`host`]       | host                                    | parent references                      |
//! | [`service`]    | service                                 | explosion, implicit inheritance, overrides |
//! | [`dependency`] | hostdependency, servicedependency       | explosion into pairs                   |
//! | [`escalation`] | hostescalation, serviceescalation       | explosion per host and service         |

pub mod command;
pub mod contact;
pub mod dependency;
pub mod escalation;
pub mod groups;
pub mod host;
pub mod service;

use crate::core::ObjectKind;
use crate::item::Entity;
use crate::schema::Schema;

/// The shared schema of a kind.
#[must_use]
pub fn schema_for(kind: ObjectKind) -> &'static Schema {
    match kind {
        ObjectKind::Command => &*command::COMMAND,
        ObjectKind::Contact => &*contact::CONTACT,
        ObjectKind::NotificationWay => &*contact::NOTIFICATION_WAY,
        ObjectKind::ContactGroup => &*groups::CONTACT_GROUP,
        ObjectKind::Host => &*host::HOST,
        ObjectKind::HostGroup => &*groups::HOST_GROUP,
        ObjectKind::Service => &*service::SERVICE,
        ObjectKind::ServiceGroup => &*groups::SERVICE_GROUP,
        ObjectKind::HostDependency => &*dependency::HOST_DEPENDENCY,
        ObjectKind::ServiceDependency => &*dependency::SERVICE_DEPENDENCY,
        ObjectKind::HostEscalation => &*escalation::HOST_ESCALATION,
        ObjectKind::ServiceEscalation => &*escalation::SERVICE_ESCALATION,
    }
}

/// Checks specific to a kind, run on items during validation.
#[must_use]
pub fn kind_checks(entity: &Entity) -> Vec<String> {
    match entity.kind {
        ObjectKind::Service => service::checks(entity),
        ObjectKind::HostEscalation | ObjectKind::ServiceEscalation => escalation::checks(entity),
        ObjectKind::Contact => contact::checks(entity),
        _ => Vec::new(),
    }
}
