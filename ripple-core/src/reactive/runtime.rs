//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects reactive wrappers
//! and effects. It owns the dependency registry, the effect table and the
//! update scheduler, and it is the only place where effects are executed.
//!
//! # How It Works
//!
//! 1. An effect registers with the runtime and receives an [`EffectId`].
//!
//! 2. While the effect runs, every reactive read calls [`Runtime::track`],
//!    which records an edge from the field to the effect.
//!
//! 3. A reactive write calls [`Runtime::trigger`], which:
//!    a. Looks up the effects that read the field
//!    b. Queues eager effects on the scheduler
//!    c. Marks lazy effects (computed values) stale
//!
//! 4. [`Runtime::flush`] drains the queue, re-running each effect once.
//!    Before a re-run the effect's old edges are dropped so that its
//!    dependency set always reflects its latest execution.
//!
//! # Threading
//!
//! All state is thread-local and single-owner. Reactive handles are
//! `!Send`, so a value and the effects observing it always live on the same
//! thread. No user callback is ever invoked while runtime state is borrowed,
//! which is what lets callbacks read, write, create and dispose freely.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use super::context::ReactiveContext;
use super::effect::EffectState;
use crate::config::RuntimeConfig;
use crate::error::CyclicUpdateError;
use crate::graph::{DependencyKey, DependencyRegistry, EffectId, EffectKind, UpdateScheduler};

type Callback = Rc<dyn Fn()>;

/// Bookkeeping for one registered effect.
struct EffectSlot {
    callback: Callback,
    kind: EffectKind,
    state: EffectState,
    run_count: usize,
    /// Invoked instead of scheduling when a lazy effect goes stale.
    on_stale: Option<Callback>,
}

struct RuntimeState {
    registry: RefCell<DependencyRegistry>,
    scheduler: RefCell<UpdateScheduler>,
    effects: RefCell<HashMap<EffectId, EffectSlot>>,
    config: RefCell<RuntimeConfig>,
    flush_hook: RefCell<Option<Callback>>,
}

impl RuntimeState {
    fn new() -> Self {
        let config = RuntimeConfig::default();
        Self {
            registry: RefCell::new(DependencyRegistry::new()),
            scheduler: RefCell::new(UpdateScheduler::new(config.max_reruns_per_flush)),
            effects: RefCell::new(HashMap::new()),
            config: RefCell::new(config),
            flush_hook: RefCell::new(None),
        }
    }

    /// Unregister `effect`, handing back its slot.
    fn take_effect(&self, effect: EffectId) -> Option<EffectSlot> {
        let removed = self.effects.borrow_mut().remove(&effect);
        if removed.is_some() {
            self.registry.borrow_mut().untrack(effect);
            self.scheduler.borrow_mut().remove(effect);
        }
        removed
    }
}

thread_local! {
    static RUNTIME: RuntimeState = RuntimeState::new();
}

/// What to do with an effect whose dependency changed.
enum Notify {
    Schedule,
    MarkStale(Callback),
    Ignore,
}

/// Resets an effect to idle when its run ends, including by panic.
struct RunGuard {
    effect: EffectId,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let _ = RUNTIME.try_with(|rt| {
            if let Some(slot) = rt.effects.borrow_mut().get_mut(&self.effect) {
                if slot.state == EffectState::Running {
                    slot.state = EffectState::Idle;
                }
                slot.run_count += 1;
            }
        });
    }
}

/// Marks the end of a flush, including by panic.
struct FlushGuard;

impl Drop for FlushGuard {
    fn drop(&mut self) {
        let _ = RUNTIME.try_with(|rt| rt.scheduler.borrow_mut().end_flush());
    }
}

/// The per-thread reactive runtime.
///
/// All methods are associated functions operating on the current thread's
/// state.
pub struct Runtime;

impl Runtime {
    /// Install a configuration for this thread's runtime.
    pub fn configure(config: RuntimeConfig) {
        RUNTIME.with(|rt| {
            rt.scheduler
                .borrow_mut()
                .set_max_runs(config.max_reruns_per_flush);
            *rt.config.borrow_mut() = config;
        });
    }

    /// The configuration currently in effect on this thread.
    pub fn config() -> RuntimeConfig {
        RUNTIME.with(|rt| rt.config.borrow().clone())
    }

    /// Set the callback used to request a flush.
    ///
    /// The hook is called once each time work is scheduled after a quiet
    /// period. It is expected to arrange for [`Runtime::flush`] to run at
    /// the next convenient boundary (end of the current event, a
    /// `spawn_local`ed task, ...). Without a hook, flushing is manual.
    ///
    /// If effects are already pending, the new hook is asked right away.
    pub fn set_flush_hook<F>(hook: F)
    where
        F: Fn() + 'static,
    {
        let previous = RUNTIME.with(|rt| {
            rt.scheduler.borrow_mut().cancel_request();
            rt.flush_hook.borrow_mut().replace(Rc::new(hook))
        });
        drop(previous);
        Self::request_flush();
    }

    /// Remove the flush hook; flushing becomes manual again.
    pub fn clear_flush_hook() {
        let previous = RUNTIME.with(|rt| {
            rt.scheduler.borrow_mut().cancel_request();
            rt.flush_hook.borrow_mut().take()
        });
        drop(previous);
    }

    /// Ask the flush hook for a flush, if one is installed and needed.
    fn request_flush() {
        let hook = RUNTIME.with(|rt| {
            let hook = rt.flush_hook.borrow().clone()?;
            rt.scheduler.borrow_mut().request_flush().then_some(hook)
        });

        if let Some(hook) = hook {
            debug!("flush requested");
            hook();
        }
    }

    /// Register an effect without running it.
    pub(crate) fn register(
        id: EffectId,
        callback: Callback,
        kind: EffectKind,
        on_stale: Option<Callback>,
    ) {
        RUNTIME.with(|rt| {
            rt.effects.borrow_mut().insert(
                id,
                EffectSlot {
                    callback,
                    kind,
                    state: EffectState::Idle,
                    run_count: 0,
                    on_stale,
                },
            );
        });
        trace!(effect = %id, ?kind, "effect registered");
    }

    /// Record that the current effect reads `key`.
    ///
    /// Does nothing outside of an effect, or if the current effect has
    /// been disposed mid-run.
    pub fn track(key: DependencyKey) {
        let Some(effect) = ReactiveContext::current_effect() else {
            return;
        };

        RUNTIME.with(|rt| {
            if !rt.effects.borrow().contains_key(&effect) {
                return;
            }
            rt.registry.borrow_mut().track(key, effect);
        });
    }

    /// Notify every effect that depends on `key`.
    pub fn trigger(key: &DependencyKey) {
        let dependents = RUNTIME.with(|rt| rt.registry.borrow().trigger(key));
        if dependents.is_empty() {
            return;
        }
        trace!(%key, count = dependents.len(), "trigger");

        for effect in dependents {
            Self::notify(effect);
        }
    }

    fn notify(effect: EffectId) {
        let action = RUNTIME.with(|rt| match rt.effects.borrow().get(&effect) {
            None => Notify::Ignore,
            Some(slot) => match (slot.kind, &slot.on_stale) {
                (EffectKind::Eager, _) => Notify::Schedule,
                (EffectKind::Lazy, Some(on_stale)) => Notify::MarkStale(Rc::clone(on_stale)),
                (EffectKind::Lazy, None) => Notify::Ignore,
            },
        });

        match action {
            Notify::Schedule => Self::schedule(effect),
            Notify::MarkStale(on_stale) => on_stale(),
            Notify::Ignore => {}
        }
    }

    /// Queue `effect` for the next flush.
    pub fn schedule(effect: EffectId) {
        let queued = RUNTIME.with(|rt| {
            rt.effects.borrow().contains_key(&effect) && rt.scheduler.borrow_mut().schedule(effect)
        });

        if queued {
            Self::request_flush();
        }
    }

    /// Execute `effect` now, rebuilding its dependency set.
    ///
    /// A disposed effect is ignored. An effect that is already running is
    /// not re-entered; it is queued for the next flush instead.
    pub fn run(effect: EffectId) {
        let callback = RUNTIME.with(|rt| {
            let mut effects = rt.effects.borrow_mut();
            let slot = effects.get_mut(&effect)?;
            match slot.state {
                EffectState::Idle => {
                    slot.state = EffectState::Running;
                    Some(Ok(Rc::clone(&slot.callback)))
                }
                EffectState::Running => Some(Err(())),
                EffectState::Disposed => None,
            }
        });

        let callback = match callback {
            Some(Ok(callback)) => callback,
            Some(Err(())) => {
                trace!(effect = %effect, "effect already running, deferring");
                Self::schedule(effect);
                return;
            }
            None => return,
        };

        let _run = RunGuard { effect };
        RUNTIME.with(|rt| rt.registry.borrow_mut().untrack(effect));

        let _ctx = ReactiveContext::enter(effect);
        trace!(effect = %effect, "running effect");
        callback();
    }

    /// Stop `effect` permanently and drop its dependency edges.
    ///
    /// Idempotent. Safe to call from inside the effect itself: reads made
    /// after disposal are not tracked and the effect never runs again.
    pub fn dispose(effect: EffectId) {
        let removed = RUNTIME.with(|rt| rt.take_effect(effect));
        Self::release(effect, removed);
    }

    /// [`Runtime::dispose`] for use in `Drop` impls.
    ///
    /// Does nothing once this thread's runtime has been torn down, which
    /// is where handles owned by still-registered effects end up.
    pub(crate) fn dispose_on_drop(effect: EffectId) {
        if let Ok(removed) = RUNTIME.try_with(|rt| rt.take_effect(effect)) {
            Self::release(effect, removed);
        }
    }

    // The callback may own handles whose drop re-enters the runtime, so the
    // slot is dropped here, outside any borrow.
    fn release(effect: EffectId, removed: Option<EffectSlot>) {
        if removed.is_some() {
            debug!(effect = %effect, "effect disposed");
        }
        drop(removed);
    }

    /// Run every pending effect.
    ///
    /// Effects run in the order they were first scheduled. Effects
    /// scheduled while flushing run in the same flush. If one effect runs
    /// more often than `max_reruns_per_flush`, the flush stops, the queue
    /// is cleared and the cycle is reported.
    ///
    /// Calling `flush` from inside a flush returns immediately; the outer
    /// flush picks up the work.
    pub fn flush() -> Result<(), CyclicUpdateError> {
        if !RUNTIME.with(|rt| rt.scheduler.borrow_mut().begin_flush()) {
            return Ok(());
        }
        let _flush = FlushGuard;

        let mut ran = 0usize;
        loop {
            let next = RUNTIME.with(|rt| rt.scheduler.borrow_mut().next());
            match next {
                None => break,
                Some(Ok(effect)) => {
                    Self::run(effect);
                    ran += 1;
                }
                Some(Err(err)) => {
                    warn!(effect = %err.effect, runs = err.runs, "cyclic update, flush aborted");
                    return Err(err);
                }
            }
        }

        if ran > 0 {
            debug!(ran, "flush complete");
        }
        Ok(())
    }

    /// Number of effects waiting for the next flush.
    pub fn pending_count() -> usize {
        RUNTIME.with(|rt| rt.scheduler.borrow().pending_count())
    }

    /// Whether reads are currently being tracked.
    pub fn is_tracking() -> bool {
        ReactiveContext::is_active()
    }

    /// The effect currently collecting dependencies, if any.
    pub fn current_effect() -> Option<EffectId> {
        ReactiveContext::current_effect()
    }

    /// Lifecycle state of `effect`. Unknown effects report `Disposed`.
    pub fn effect_state(effect: EffectId) -> EffectState {
        RUNTIME.with(|rt| {
            rt.effects
                .borrow()
                .get(&effect)
                .map_or(EffectState::Disposed, |slot| slot.state)
        })
    }

    /// How many times `effect` has run.
    pub fn run_count(effect: EffectId) -> usize {
        RUNTIME.with(|rt| rt.effects.borrow().get(&effect).map_or(0, |slot| slot.run_count))
    }

    /// Number of fields `effect` read during its latest run.
    pub fn dependency_count(effect: EffectId) -> usize {
        RUNTIME.with(|rt| rt.registry.borrow().dependency_count(effect))
    }

    /// Number of effects currently reading `key`.
    pub fn dependent_count(key: &DependencyKey) -> usize {
        RUNTIME.with(|rt| rt.registry.borrow().dependent_count(key))
    }

    /// Number of fields with at least one dependent effect.
    pub fn tracked_key_count() -> usize {
        RUNTIME.with(|rt| rt.registry.borrow().len())
    }

    /// Number of live effects on this thread.
    pub fn effect_count() -> usize {
        RUNTIME.with(|rt| rt.effects.borrow().len())
    }
}

/// Run `f`, then flush.
///
/// Writes inside `f` are batched: each dependent effect runs once, after
/// `f` returns, and observes the final values.
pub fn batch<R>(f: impl FnOnce() -> R) -> Result<R, CyclicUpdateError> {
    let result = f();
    Runtime::flush()?;
    Ok(result)
}

/// Run `f` without tracking any reads it makes.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let _ctx = ReactiveContext::untracked();
    f()
}
