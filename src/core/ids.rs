//! Entity identifiers.
//!
//! Identifiers come from an [`IdGenerator`] handle that the caller creates once per
//! configuration load and hands to every collection. Clones of the handle share the
//! same counter, so ids minted by different collections of one load never collide,
//! and separate loads (or tests) never observe each other's counters.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique identifier of an [`Entity`](crate::item::Entity).
///
/// Ids are ordered by creation, which collections rely on to iterate members in
/// definition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Raw numeric value of the id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared monotonic id source.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: Arc<AtomicU64>,
}

impl IdGenerator {
    /// Create a generator whose first id is `#1`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint the next id.
    pub fn next_id(&self) -> EntityId {
        EntityId(self.last.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic_and_shared_between_clones() {
        let ids = IdGenerator::new();
        let other = ids.clone();

        let a = ids.next_id();
        let b = other.next_id();
        let c = ids.next_id();

        assert!(a < b && b < c);
        assert_eq!(a.get(), 1);
        assert_eq!(c.get(), 3);
    }

    #[test]
    fn test_independent_generators_do_not_leak() {
        let first = IdGenerator::new();
        first.next_id();
        first.next_id();

        let second = IdGenerator::new();
        assert_eq!(second.next_id().get(), 1);
    }
}
