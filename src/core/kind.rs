//! Object kinds understood by monconf
//!
//! Every `define <kind> { ... }` block in a Nagios-style configuration maps to one
//! [`ObjectKind`]. The kind selects the property schema used to convert raw values,
//! the property that names an object, and the kind-specific explosion and
//! validation rules applied by the pipeline.
//!
//! # Examples
//!
//! ```rust
//! use monconf::core::ObjectKind;
//!
//! let kind: ObjectKind = "hostgroup".parse().unwrap();
//! assert_eq!(kind, ObjectKind::HostGroup);
//! assert_eq!(kind.to_string(), "hostgroup");
//!
//! assert!("timeperiod".parse::<ObjectKind>().is_err());
//! ```

use serde::{Deserialize, Serialize};

use crate::schema::Schema;

/// Enumeration of the object kinds handled by the object model.
///
/// `ObjectKind` implements [`serde::Serialize`] and [`serde::Deserialize`] using the
/// lowercase keyword that appears after `define` in configuration files.
///
/// The declaration order is the order in which the pipeline processes collections,
/// so groups always come after the members they collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Check and notification command lines
    Command,
    /// Contacts receiving notifications
    Contact,
    /// Named sets of notification settings attached to contacts
    NotificationWay,
    /// Groups of contacts
    ContactGroup,
    /// Monitored hosts
    Host,
    /// Groups of hosts
    HostGroup,
    /// Services attached to hosts
    Service,
    /// Groups of services, stored as `host,service` pairs
    ServiceGroup,
    /// Execution/notification dependencies between hosts
    HostDependency,
    /// Execution/notification dependencies between services
    ServiceDependency,
    /// Escalated notification rules for hosts
    HostEscalation,
    /// Escalated notification rules for services
    ServiceEscalation,
}

impl ObjectKind {
    /// All kinds in pipeline order.
    pub const ALL: [ObjectKind; 12] = [
        ObjectKind::Command,
        ObjectKind::Contact,
        ObjectKind::NotificationWay,
        ObjectKind::ContactGroup,
        ObjectKind::Host,
        ObjectKind::HostGroup,
        ObjectKind::Service,
        ObjectKind::ServiceGroup,
        ObjectKind::HostDependency,
        ObjectKind::ServiceDependency,
        ObjectKind::HostEscalation,
        ObjectKind::ServiceEscalation,
    ];

    /// The keyword used after `define` for this kind.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            ObjectKind::Command => "command",
            ObjectKind::Contact => "contact",
            ObjectKind::NotificationWay => "notificationway",
            ObjectKind::ContactGroup => "contactgroup",
            ObjectKind::Host => "host",
            ObjectKind::HostGroup => "hostgroup",
            ObjectKind::Service => "service",
            ObjectKind::ServiceGroup => "servicegroup",
            ObjectKind::HostDependency => "hostdependency",
            ObjectKind::ServiceDependency => "servicedependency",
            ObjectKind::HostEscalation => "hostescalation",
            ObjectKind::ServiceEscalation => "serviceescalation",
        }
    }

    /// The property schema shared by every object of this kind.
    #[must_use]
    pub fn schema(self) -> &'static Schema {
        crate::objects::schema_for(self)
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

impl std::str::FromStr for ObjectKind {
    type Err = crate::core::MonconfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        ObjectKind::ALL.into_iter().find(|kind| kind.keyword() == lowered).ok_or_else(|| {
            crate::core::MonconfError::UnknownObjectKind {
                kind: s.to_string(),
            }
        })
    }
}
