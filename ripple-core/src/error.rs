//! Error types for the reactive core.
//!
//! The dependency registry and the scheduler queue are total, so errors only
//! surface at the edges: a flush that never settles, a list write outside
//! the list's bounds, a shape mismatch, or malformed JSON input.

use thiserror::Error;

use crate::graph::EffectId;

/// A flush re-ran the same effect more times than the configured limit.
///
/// This almost always means an effect writes to a field it also reads, so
/// every run schedules another run. The flush that detected it is aborted
/// and the pending queue is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cyclic update: effect {effect} re-ran {runs} times in a single flush")]
pub struct CyclicUpdateError {
    /// The effect that exceeded the limit.
    pub effect: EffectId,
    /// How many times it ran before the flush was aborted.
    pub runs: usize,
}

/// Errors produced by the reactive core.
#[derive(Debug, Error)]
pub enum ReactiveError {
    #[error(transparent)]
    CyclicUpdate(#[from] CyclicUpdateError),

    #[error("index {index} out of bounds for list of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("value is not a record")]
    NotARecord,

    #[error("value is not a list")]
    NotAList,

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = ReactiveError> = std::result::Result<T, E>;
