//! Graph Nodes
//!
//! The dependency graph has two kinds of nodes: observable fields
//! ([`DependencyKey`]) and the effects that read them ([`EffectId`]).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a structured value (record or list).
///
/// Assigned once when the target is created and never reused, so it is safe
/// to key caches and registry entries by it even after the target is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u64);

impl TargetId {
    /// Generate a new unique target ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(u64);

impl EffectId {
    /// Generate a new unique effect ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for EffectId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u64> for EffectId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One observable slot on a target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    /// A named field of a record.
    Name(String),

    /// A position in a list.
    Index(usize),

    /// The key set of a record or the length of a list.
    ///
    /// Read by anything that iterates or counts; notified whenever a field
    /// is added or removed.
    Keys,
}

impl From<&str> for Field {
    fn from(name: &str) -> Self {
        Field::Name(name.to_owned())
    }
}

impl From<String> for Field {
    fn from(name: String) -> Self {
        Field::Name(name)
    }
}

impl From<usize> for Field {
    fn from(index: usize) -> Self {
        Field::Index(index)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Name(name) => write!(f, ".{name}"),
            Field::Index(index) => write!(f, "[{index}]"),
            Field::Keys => f.write_str(".<keys>"),
        }
    }
}

/// Identifies one field on one target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyKey {
    pub target: TargetId,
    pub field: Field,
}

impl DependencyKey {
    pub fn new(target: TargetId, field: impl Into<Field>) -> Self {
        Self {
            target,
            field: field.into(),
        }
    }

    /// The "has-any-key" key of a target.
    pub fn keys(target: TargetId) -> Self {
        Self {
            target,
            field: Field::Keys,
        }
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target{}{}", self.target.0, self.field)
    }
}

/// How an effect reacts when one of its dependencies changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    /// Queued on the scheduler and re-run at the next flush.
    Eager,

    /// Only marked stale. Used by computed values, which recompute on the
    /// next read and forward the notification to their own readers.
    Lazy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(TargetId::new(), TargetId::new());
        assert_ne!(EffectId::new(), EffectId::new());
    }

    #[test]
    fn keys_compare_by_target_and_field() {
        let target = TargetId::new();
        let other = TargetId::new();

        assert_eq!(DependencyKey::new(target, "x"), DependencyKey::new(target, "x"));
        assert_ne!(DependencyKey::new(target, "x"), DependencyKey::new(target, "y"));
        assert_ne!(DependencyKey::new(target, "x"), DependencyKey::new(other, "x"));
        assert_ne!(DependencyKey::new(target, 0usize), DependencyKey::keys(target));
    }

    #[test]
    fn fields_convert_from_names_and_indices() {
        assert_eq!(Field::from("name"), Field::Name("name".into()));
        assert_eq!(Field::from(3usize), Field::Index(3));
        assert_eq!(Field::from(3usize).to_string(), "[3]");
        assert_eq!(Field::Keys.to_string(), ".<keys>");
    }
}
