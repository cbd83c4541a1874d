//! Computed Values
//!
//! A `Computed` is a cached derived value that re-evaluates only when its
//! dependencies change.
//!
//! # How Computed Values Work
//!
//! 1. On first access, the computation runs inside its own tracking context
//!    and the result is cached.
//!
//! 2. When accessed again, if no dependency has changed, the cached value
//!    is returned.
//!
//! 3. When a dependency changes, the computed value is only marked dirty,
//!    and everything that read it is notified in turn. Nothing is
//!    recomputed yet.
//!
//! 4. The next access recomputes.
//!
//! # Why This Matters
//!
//! Derived state stays correct without an effect writing it back into
//! another field, and derivations nobody reads cost nothing:
//!
//! - a field changes
//! - 10 computed values depend on it
//! - only the ones actually read again will recompute

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use super::runtime::Runtime;
use crate::graph::{DependencyKey, EffectId, EffectKind, Field, TargetId};
use crate::value::Value;

/// Freshness of the cached value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputedState {
    /// The cached value is up-to-date.
    Clean,

    /// A dependency changed since the last computation.
    Dirty,
}

struct ComputedInner {
    /// The lazy effect that runs the computation.
    effect: EffectId,

    /// Identity readers subscribe to.
    target: TargetId,

    compute: Box<dyn Fn() -> Value>,
    value: RefCell<Value>,
    state: Cell<ComputedState>,
}

impl ComputedInner {
    fn key(&self) -> DependencyKey {
        DependencyKey::new(self.target, Field::Keys)
    }

    fn mark_dirty(&self) {
        if self.state.replace(ComputedState::Dirty) == ComputedState::Clean {
            Runtime::trigger(&self.key());
        }
    }
}

impl Drop for ComputedInner {
    fn drop(&mut self) {
        Runtime::dispose_on_drop(self.effect);
    }
}

/// A cached value derived from reactive state.
///
/// # Example
///
/// ```rust,ignore
/// let state = Reactive::record([("first", "Ada"), ("last", "Lovelace")]);
///
/// let s = state.clone();
/// let full = Computed::new(move || {
///     format!("{} {}", s.get("first").unwrap().as_str().unwrap(), s.get("last").unwrap().as_str().unwrap())
/// });
///
/// assert_eq!(full.get().as_str(), Some("Ada Lovelace"));
/// ```
#[derive(Clone)]
pub struct Computed {
    inner: Rc<ComputedInner>,
}

impl Computed {
    /// Create a new computed value.
    ///
    /// The computation is not run immediately. It runs on first access.
    pub fn new<F, V>(compute: F) -> Self
    where
        F: Fn() -> V + 'static,
        V: Into<Value>,
    {
        let effect = EffectId::new();
        let inner = Rc::new(ComputedInner {
            effect,
            target: TargetId::new(),
            compute: Box::new(move || compute().into()),
            value: RefCell::new(Value::Null),
            state: Cell::new(ComputedState::Dirty),
        });

        // The runtime only holds weak references; dropping the last handle
        // disposes the effect.
        let weak = Rc::downgrade(&inner);
        let recompute = move || {
            if let Some(inner) = weak.upgrade() {
                // Clean first: a write made by the computation itself must
                // leave it dirty.
                inner.state.set(ComputedState::Clean);
                let value = (inner.compute)();
                *inner.value.borrow_mut() = value;
            }
        };

        let weak = Rc::downgrade(&inner);
        let on_stale = move || {
            if let Some(inner) = weak.upgrade() {
                inner.mark_dirty();
            }
        };

        Runtime::register(
            effect,
            Rc::new(recompute),
            EffectKind::Lazy,
            Some(Rc::new(on_stale)),
        );
        Self { inner }
    }

    /// Get the current value, recomputing if necessary.
    ///
    /// Inside an effect, this also subscribes the effect to the computed
    /// value.
    pub fn get(&self) -> Value {
        Runtime::track(self.inner.key());

        if self.inner.state.get() == ComputedState::Dirty {
            Runtime::run(self.inner.effect);
        }
        self.inner.value.borrow().clone()
    }

    pub fn state(&self) -> ComputedState {
        self.inner.state.get()
    }

    /// Force a recomputation on next access and notify readers.
    pub fn mark_dirty(&self) {
        self.inner.mark_dirty();
    }

    /// Stop tracking dependencies. The last value stays cached.
    pub fn dispose(&self) {
        Runtime::dispose(self.inner.effect);
    }

    /// The key readers of this value subscribe to.
    pub fn key(&self) -> DependencyKey {
        self.inner.key()
    }

    /// Number of fields the last computation read.
    pub fn dependency_count(&self) -> usize {
        Runtime::dependency_count(self.inner.effect)
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("effect", &self.inner.effect)
            .field("state", &self.state())
            .field("value", &*self.inner.value.borrow())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
