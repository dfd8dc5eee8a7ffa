//! Core types for monconf
//!
//! This module holds the small vocabulary shared by every other module:
//!
//! - [`ObjectKind`] - the kinds of objects a configuration can define
//! - [`EntityId`] / [`IdGenerator`] - identity of entities, minted per load
//! - [`MonconfError`] / [`ErrorContext`] - tooling failures and their presentation
//!
//! Configuration *problems* are not errors in the `Result` sense; see
//! [`crate::item::Entity::configuration_errors`] and
//! [`crate::collection::EntityCollection::diagnostics`].

pub mod error;
pub mod ids;
pub mod kind;

pub use error::{ErrorContext, MonconfError, user_friendly_error};
pub use ids::{EntityId, IdGenerator};
pub use kind::ObjectKind;
