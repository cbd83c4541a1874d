//! Dependency Graph
//!
//! Plain data structures behind the reactive runtime, free of any global
//! state so they can be tested in isolation:
//!
//! - [`DependencyRegistry`]: which effects read which fields
//! - [`UpdateScheduler`]: which effects are waiting to re-run, and in what
//!   order
//!
//! Nodes are either observable fields ([`DependencyKey`], a target plus a
//! [`Field`]) or effects ([`EffectId`]). Edges always point from a field to
//! an effect that read it during its most recent run.

mod node;
mod registry;
mod scheduler;

pub use node::{DependencyKey, EffectId, EffectKind, Field, TargetId};
pub use registry::DependencyRegistry;
pub use scheduler::UpdateScheduler;
