//! Dependency Registry
//!
//! Maps each observable field to the effects that read it during their most
//! recent run, and keeps the reverse index (effect to fields) so that an
//! effect's edges can be dropped without scanning the whole map.
//!
//! Every operation is total: unknown keys and effects are no-ops.

use std::collections::HashMap;

use indexmap::IndexSet;
use smallvec::SmallVec;

use super::node::{DependencyKey, EffectId};

/// Keys read by one effect. Most effects read a handful of fields.
type KeyList = SmallVec<[DependencyKey; 4]>;

/// Bidirectional index between dependency keys and effects.
#[derive(Debug, Default)]
pub struct DependencyRegistry {
    /// Key -> effects reading it, in the order they first read it.
    dependents: HashMap<DependencyKey, IndexSet<EffectId>>,

    /// Effect -> keys it read. Mirrors `dependents`.
    dependencies: HashMap<EffectId, KeyList>,
}

impl DependencyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `effect` reads `key`.
    ///
    /// Returns `false` if the edge already existed.
    pub fn track(&mut self, key: DependencyKey, effect: EffectId) -> bool {
        let inserted = self
            .dependents
            .entry(key.clone())
            .or_default()
            .insert(effect);

        if inserted {
            self.dependencies.entry(effect).or_default().push(key);
        }
        inserted
    }

    /// The effects currently depending on `key`, in insertion order.
    pub fn trigger(&self, key: &DependencyKey) -> Vec<EffectId> {
        self.dependents
            .get(key)
            .map(|effects| effects.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Remove every edge involving `effect`.
    ///
    /// Entries left without dependents are dropped.
    pub fn untrack(&mut self, effect: EffectId) {
        let Some(keys) = self.dependencies.remove(&effect) else {
            return;
        };

        for key in keys {
            if let Some(effects) = self.dependents.get_mut(&key) {
                effects.shift_remove(&effect);
                if effects.is_empty() {
                    self.dependents.remove(&key);
                }
            }
        }
    }

    /// Number of keys `effect` currently reads.
    pub fn dependency_count(&self, effect: EffectId) -> usize {
        self.dependencies.get(&effect).map_or(0, |keys| keys.len())
    }

    /// Number of effects currently reading `key`.
    pub fn dependent_count(&self, key: &DependencyKey) -> usize {
        self.dependents.get(key).map_or(0, |effects| effects.len())
    }

    /// Number of keys with at least one dependent.
    pub fn len(&self) -> usize {
        self.dependents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }
}
