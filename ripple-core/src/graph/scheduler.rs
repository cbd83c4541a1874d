//! Update Scheduler
//!
//! The scheduler holds the effects waiting to re-run and decides the order
//! in which a flush processes them. It does not run anything itself; the
//! runtime drives it:
//!
//! 1. A write triggers dependents; each is passed to
//!    [`UpdateScheduler::schedule`].
//! 2. If a flush hook is installed, the runtime calls
//!    [`UpdateScheduler::request_flush`]; only the first call after a quiet
//!    period asks for a flush.
//! 3. During a flush the runtime pulls effects with [`UpdateScheduler::next`]
//!    until the queue is empty. Effects scheduled mid-flush are appended and
//!    processed by the same flush.
//!
//! # Ordering
//!
//! The queue is an insertion-ordered set. Scheduling an effect that is
//! already pending leaves it where it is.
//!
//! # Runaway updates
//!
//! An effect that keeps rescheduling itself would keep a flush alive forever.
//! Each flush counts runs per effect; once an effect exceeds the limit the
//! flush is aborted with [`CyclicUpdateError`] and the queue is cleared.

use std::collections::HashMap;

use indexmap::IndexSet;

use super::node::EffectId;
use crate::error::CyclicUpdateError;

/// Pending-effect queue with flush bookkeeping.
#[derive(Debug)]
pub struct UpdateScheduler {
    /// Effects waiting to run, deduplicated, in first-scheduled order.
    queue: IndexSet<EffectId>,

    /// True while a flush is draining the queue.
    flushing: bool,

    /// True once a flush has been requested and has not started yet.
    flush_requested: bool,

    /// Runs per effect in the current flush.
    runs: HashMap<EffectId, usize>,

    /// Maximum runs of one effect within a single flush.
    max_runs: usize,
}

impl UpdateScheduler {
    /// Create a new empty scheduler.
    pub fn new(max_runs: usize) -> Self {
        Self {
            queue: IndexSet::new(),
            flushing: false,
            flush_requested: false,
            runs: HashMap::new(),
            max_runs: max_runs.max(1),
        }
    }

    /// Change the per-flush run limit.
    pub fn set_max_runs(&mut self, max_runs: usize) {
        self.max_runs = max_runs.max(1);
    }

    /// Queue `effect` unless it is already pending.
    ///
    /// Returns `true` if it was not pending before.
    pub fn schedule(&mut self, effect: EffectId) -> bool {
        self.queue.insert(effect)
    }

    /// Note that a flush is being requested.
    ///
    /// Returns `true` when the request is needed: work is pending, nothing
    /// is flushing and no request has been made since the last flush. Call
    /// this only when a request can actually be delivered.
    pub fn request_flush(&mut self) -> bool {
        if self.flushing || self.flush_requested || self.queue.is_empty() {
            return false;
        }
        self.flush_requested = true;
        true
    }

    /// Forget an outstanding request, so the next call to
    /// [`request_flush`](Self::request_flush) asks again.
    pub fn cancel_request(&mut self) {
        self.flush_requested = false;
    }

    /// Drop `effect` from the queue if it is pending.
    pub fn remove(&mut self, effect: EffectId) -> bool {
        self.queue.shift_remove(&effect)
    }

    /// Start a flush.
    ///
    /// Returns `false` if a flush is already in progress; the caller must
    /// then leave the queue to the running flush.
    pub fn begin_flush(&mut self) -> bool {
        if self.flushing {
            return false;
        }
        self.flushing = true;
        self.flush_requested = false;
        self.runs.clear();
        true
    }

    /// Pull the next effect to run.
    ///
    /// Returns `None` once the queue is drained. On a cyclic update the
    /// flush is aborted before the error is returned.
    pub fn next(&mut self) -> Option<Result<EffectId, CyclicUpdateError>> {
        let effect = self.queue.shift_remove_index(0)?;

        let runs = self.runs.entry(effect).or_insert(0);
        *runs += 1;
        if *runs > self.max_runs {
            let err = CyclicUpdateError {
                effect,
                runs: self.max_runs,
            };
            self.abort();
            return Some(Err(err));
        }

        Some(Ok(effect))
    }

    /// Finish the current flush.
    pub fn end_flush(&mut self) {
        self.flushing = false;
        self.runs.clear();
    }

    /// Finish the current flush and discard everything still pending.
    pub fn abort(&mut self) {
        self.queue.clear();
        self.flush_requested = false;
        self.end_flush();
    }

    #[cfg(test)]
    fn is_flushing(&self) -> bool {
        self.flushing
    }

    #[cfg(test)]
    fn is_pending(&self, effect: EffectId) -> bool {
        self.queue.contains(&effect)
    }

    /// Number of effects waiting to run.
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }
}

impl Default for UpdateScheduler {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_RERUNS)
    }
}
