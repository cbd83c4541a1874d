//! Reactive Primitives
//!
//! This module implements the user-facing reactive system: wrappers over
//! structured values, effects, and the runtime that connects them.
//!
//! # Concepts
//!
//! ## Reactive Wrappers
//!
//! A [`Reactive`] wraps a record or list. When one of its fields is read
//! while an effect is running, that effect is registered as a dependent of
//! the field. When the field is written with a different value, every
//! dependent is queued to re-run.
//!
//! ## Effects
//!
//! An [`Effect`] is a side-effecting computation that re-runs whenever a
//! field it read changes. Effects are how state reaches the outside world,
//! such as a renderer redrawing one region of the screen.
//!
//! ## Flushing
//!
//! Writes never re-run effects on the spot. Dependents are queued and run
//! at the next [`Runtime::flush`], so several writes in a row cost each
//! dependent a single run that sees the final values.
//!
//! ## Derived State
//!
//! [`Ref`] is a single reactive cell. [`Computed`] caches a value derived
//! from other reactive state and recomputes it lazily.
//!
//! # Implementation Notes
//!
//! The reactive system uses a thread-local tracking context to detect
//! dependencies automatically. When a field is read, we check if there is
//! an active effect and, if so, record the dependency.

mod computed;
mod context;
mod effect;
mod reference;
mod runtime;
mod wrapper;

pub use computed::{Computed, ComputedState};
pub use context::ReactiveContext;
pub use effect::{dispose, effect, Effect, EffectGuard, EffectState};
pub use reference::Ref;
pub use runtime::{batch, untracked, Runtime};
pub use wrapper::{wrap, Reactive, Tracked};
