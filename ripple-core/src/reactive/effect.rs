//! Effect Implementation
//!
//! An Effect is a side-effecting computation that re-runs whenever data it
//! read changes.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its function immediately to establish
//!    initial dependencies (unless the runtime is configured otherwise, or
//!    [`Effect::new_lazy`] is used).
//!
//! 2. When any dependency changes, the effect is queued. It re-runs at the
//!    next flush, once, no matter how many of its dependencies changed.
//!
//! 3. Before re-running, the effect drops its old dependencies and tracks
//!    new ones during execution.
//!
//! # Lifecycle
//!
//! ```text
//! Idle --run--> Running --done--> Idle
//!   \              |
//!    +--dispose----+----> Disposed (terminal)
//! ```
//!
//! # Use Cases
//!
//! Effects are how reactive state reaches the outside world. A rendering
//! layer registers one effect per output region, reads reactive fields
//! inside it, and redraws whenever the effect runs.

use std::marker::PhantomData;
use std::rc::Rc;

use super::runtime::Runtime;
use crate::graph::{EffectId, EffectKind};

/// Lifecycle state of an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectState {
    /// Registered and waiting for a dependency to change.
    Idle,

    /// Currently executing its callback.
    Running,

    /// Stopped for good.
    Disposed,
}

/// Handle to a registered effect.
///
/// The handle is a plain ID: copying it is free and dropping it does not
/// stop the effect. Call [`Effect::dispose`], or keep an [`EffectGuard`].
///
/// # Example
///
/// ```rust,ignore
/// let state = Reactive::record([("count", 0)]);
///
/// let s = state.clone();
/// let effect = Effect::new(move || {
///     println!("Count is: {:?}", s.get("count"));
/// });
///
/// state.set("count", 5)?;
/// Runtime::flush()?;  // Prints: "Count is: Some(5)"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Effect {
    id: EffectId,
    /// Effects belong to the thread-local runtime that created them.
    _not_send: PhantomData<Rc<()>>,
}

impl Effect {
    /// Create a new effect with the given function.
    ///
    /// The function runs immediately to establish initial dependencies,
    /// unless `run_on_register` is off in the runtime configuration.
    pub fn new<F>(run: F) -> Self
    where
        F: Fn() + 'static,
    {
        let effect = Self::new_lazy(run);
        if Runtime::config().run_on_register {
            effect.run();
        }
        effect
    }

    /// Create a new effect without running it.
    ///
    /// It has no dependencies until it first runs, either through
    /// [`Effect::run`] or [`Effect::schedule`] and a flush.
    pub fn new_lazy<F>(run: F) -> Self
    where
        F: Fn() + 'static,
    {
        let id = EffectId::new();
        Runtime::register(id, Rc::new(run), EffectKind::Eager, None);
        Self::from_id(id)
    }

    pub(crate) fn from_id(id: EffectId) -> Self {
        Self {
            id,
            _not_send: PhantomData,
        }
    }

    pub fn id(&self) -> EffectId {
        self.id
    }

    /// Run the effect now, rebuilding its dependencies.
    pub fn run(&self) {
        Runtime::run(self.id);
    }

    /// Queue the effect for the next flush.
    pub fn schedule(&self) {
        Runtime::schedule(self.id);
    }

    /// Stop the effect. Idempotent.
    pub fn dispose(&self) {
        Runtime::dispose(self.id);
    }

    pub fn state(&self) -> EffectState {
        Runtime::effect_state(self.id)
    }

    pub fn is_disposed(&self) -> bool {
        self.state() == EffectState::Disposed
    }

    /// Number of times the effect has run.
    pub fn run_count(&self) -> usize {
        Runtime::run_count(self.id)
    }

    /// Number of fields read during the latest run.
    pub fn dependency_count(&self) -> usize {
        Runtime::dependency_count(self.id)
    }

    /// Tie the effect's lifetime to a guard value.
    pub fn guard(self) -> EffectGuard {
        EffectGuard { effect: self }
    }
}

/// Disposes its effect when dropped.
#[derive(Debug)]
#[must_use = "dropping the guard disposes the effect immediately"]
pub struct EffectGuard {
    effect: Effect,
}

impl EffectGuard {
    pub fn effect(&self) -> Effect {
        self.effect
    }
}

impl Drop for EffectGuard {
    fn drop(&mut self) {
        Runtime::dispose_on_drop(self.effect.id());
    }
}

/// Register an effect and run it once.
pub fn effect<F>(run: F) -> Effect
where
    F: Fn() + 'static,
{
    Effect::new(run)
}

/// Dispose an effect. Same as [`Effect::dispose`].
pub fn dispose(effect: Effect) {
    effect.dispose();
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
