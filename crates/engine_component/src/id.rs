//! Component and entity identifiers.
//!
//! Both identifier spaces are monotonically increasing and never reuse a
//! value. Component ids start at 0; entity ids start at 1 so that 0 can serve
//! as the "no owner" sentinel.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A unique entity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl EntityId {
    /// The null / invalid entity sentinel. No entity is ever allocated with it.
    pub const INVALID: EntityId = EntityId(0);

    /// Returns the raw `u64` identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }

    /// Returns `true` if this is a valid (non-zero) entity.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// A unique component identifier, assigned once by the component store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub u64);

impl ComponentId {
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.0)
    }
}

/// Hands out strictly increasing raw ids from a shared counter.
///
/// Safe to share between threads; two callers never observe the same value.
#[derive(Debug)]
pub struct IdSequence {
    next: AtomicU64,
}

impl IdSequence {
    /// A sequence whose first value is `first`.
    #[must_use]
    pub const fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Sequence for component ids, starting at 0.
    #[must_use]
    pub const fn components() -> Self {
        Self::starting_at(0)
    }

    /// Sequence for entity ids, starting at 1.
    #[must_use]
    pub const fn entities() -> Self {
        Self::starting_at(1)
    }

    /// Take the next raw value.
    pub fn next_raw(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    pub fn next_component(&self) -> ComponentId {
        ComponentId(self.next_raw())
    }

    pub fn next_entity(&self) -> EntityId {
        EntityId(self.next_raw())
    }

    /// The value the next call will return.
    #[must_use]
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_entity_invalid() {
        assert!(!EntityId::INVALID.is_valid());
        assert_eq!(EntityId::INVALID.id(), 0);
        assert!(EntityId(3).is_valid());
    }

    #[test]
    fn test_entity_sequence_starts_at_one() {
        let seq = IdSequence::entities();
        assert_eq!(seq.next_entity(), EntityId(1));
        assert_eq!(seq.next_entity(), EntityId(2));
        assert_eq!(seq.peek(), 3);
    }

    #[test]
    fn test_component_sequence_starts_at_zero() {
        let seq = IdSequence::components();
        assert_eq!(seq.next_component(), ComponentId(0));
        assert_eq!(seq.next_component(), ComponentId(1));
    }

    #[test]
    fn test_sequence_unique_across_threads() {
        let seq = Arc::new(IdSequence::components());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let seq = Arc::clone(&seq);
                std::thread::spawn(move || (0..250).map(|_| seq.next_raw()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 1000);
    }

    #[test]
    fn test_display() {
        assert_eq!(EntityId(7).to_string(), "Entity(7)");
        assert_eq!(ComponentId(2).to_string(), "Component(2)");
    }
}
