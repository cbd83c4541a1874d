//! Reactive Context
//!
//! The reactive context tracks which effect is currently running. This
//! enables automatic dependency tracking: when a reactive field is read, we
//! can register the current effect as a dependent.
//!
//! # Implementation
//!
//! We use a thread-local stack. Running an effect pushes its ID; the guard
//! returned by [`ReactiveContext::enter`] pops it again, even if the effect
//! panics. Nested runs (an effect reading a computed value that has to
//! recompute) push on top and restore the outer effect when they finish.
//!
//! [`ReactiveContext::untracked`] pushes an empty entry, which hides the
//! outer effect so reads inside it create no dependencies.

use std::cell::RefCell;

use crate::graph::EffectId;

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<Option<EffectId>>> = const { RefCell::new(Vec::new()) };
}

/// Guard that pops the context when dropped.
pub struct ReactiveContext {
    effect: Option<EffectId>,
}

impl ReactiveContext {
    /// Enter a tracking context for `effect`.
    ///
    /// While the guard is alive, reactive reads register `effect` as a
    /// dependent.
    pub fn enter(effect: EffectId) -> Self {
        Self::push(Some(effect))
    }

    /// Enter a context in which reads are not tracked.
    pub fn untracked() -> Self {
        Self::push(None)
    }

    fn push(effect: Option<EffectId>) -> Self {
        CONTEXT_STACK.with(|stack| stack.borrow_mut().push(effect));
        Self { effect }
    }

    /// Check if reads are currently being tracked.
    pub fn is_active() -> bool {
        Self::current_effect().is_some()
    }

    /// The effect that reads should be attributed to, if any.
    pub fn current_effect() -> Option<EffectId> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().copied().flatten())
    }

    /// Whether `effect` is anywhere on the stack, i.e. currently executing.
    #[cfg(test)]
    fn is_running(effect: EffectId) -> bool {
        CONTEXT_STACK.with(|stack| stack.borrow().contains(&Some(effect)))
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        // The stack is gone if the thread is being torn down.
        let _ = CONTEXT_STACK.try_with(|stack| {
            let popped = stack.borrow_mut().pop();

            debug_assert_eq!(
                popped,
                Some(self.effect),
                "ReactiveContext mismatch: expected {:?}, got {:?}",
                self.effect,
                popped
            );
        });
    }
}
