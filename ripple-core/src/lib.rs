//! Ripple Core
//!
//! This crate provides a dependency-tracking reactivity core: change a
//! value, and everything that read it runs again. It implements:
//!
//! - Reactive wrappers over records and lists, with nested wrapping
//! - Effects that track what they read and re-run when it changes
//! - A batching scheduler with runaway-update detection
//! - Derived state (`Ref`, `Computed`)
//!
//! Rendering is out of scope. A rendering layer registers one effect per
//! output region, reads reactive fields inside it, and redraws whenever the
//! effect runs.
//!
//! The crate is designed to be used both as a native Rust library and, with
//! the `python` feature, as a Python extension module via PyO3.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `value`: The structured values that can be observed
//! - `graph`: Dependency registry and update scheduler
//! - `reactive`: Wrappers, effects and the per-thread runtime
//! - `config`: Runtime configuration
//! - `error`: Error types
//!
//! # Example
//!
//! ```rust,ignore
//! use ripple_core::reactive::{Effect, Reactive, Runtime};
//!
//! // Wrap some state
//! let state = Reactive::record([("first_name", "John"), ("last_name", "Doe")]);
//!
//! // Create an effect; it runs once right away
//! let s = state.clone();
//! Effect::new(move || {
//!     println!("{:?} {:?}", s.get("first_name"), s.get("last_name"));
//! });
//!
//! // Update the state
//! state.set("first_name", "Naruto")?;
//! state.set("last_name", "Uzumaki")?;
//!
//! // Effect runs once, prints the new full name
//! Runtime::flush()?;
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod reactive;
pub mod value;

#[cfg(feature = "python")]
mod python;

pub use config::RuntimeConfig;
pub use error::{CyclicUpdateError, ReactiveError, Result};
