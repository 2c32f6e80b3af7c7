//! Reactive Context
//!
//! The reactive context tracks which effect is currently running.
//! This enables automatic dependency tracking: when a signal is read,
//! the effect on top of the stack is registered as a subscriber.
//!
//! # Implementation
//!
//! We use a thread-local stack of running effects. Entering an effect pushes
//! it and returns a guard; dropping the guard pops it. Because the pop lives
//! in `Drop`, the stack is restored on normal return and while unwinding from
//! a panicking effect body alike.
//!
//! Nested effects (an effect created or triggered from inside another
//! effect's body) simply deepen the stack. Only the top entry receives
//! registrations.

use std::cell::RefCell;

use smallvec::SmallVec;

use super::effect::Effect;
use super::SubscriberId;

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<ContextEntry>> = const { RefCell::new(Vec::new()) };
}

/// An entry in the reactive context stack.
struct ContextEntry {
    /// The running effect, or `None` for an untracked scope.
    effect: Option<Effect>,
    /// Signal IDs read during this run, in read order.
    dependencies: SmallVec<[u64; 8]>,
}

/// Guard that pops the context when dropped.
pub struct ReactiveContext {
    subscriber_id: Option<SubscriberId>,
}

impl ReactiveContext {
    /// Enter a new reactive context for the given effect.
    ///
    /// While this context is active, any signals that are read will
    /// register the effect as a subscriber.
    ///
    /// The context is automatically exited when the returned guard is dropped.
    pub fn enter(effect: Effect) -> Self {
        let subscriber_id = Some(effect.subscriber_id());
        Self::push(Some(effect));
        Self { subscriber_id }
    }

    /// Enter a scope in which reads register nothing.
    fn enter_untracked() -> Self {
        Self::push(None);
        Self { subscriber_id: None }
    }

    fn push(effect: Option<Effect>) {
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().push(ContextEntry {
                effect,
                dependencies: SmallVec::new(),
            });
        });
    }

    /// Check if a read right now would be tracked.
    pub fn is_active() -> bool {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .is_some_and(|entry| entry.effect.is_some())
        })
    }

    /// Get the effect that would subscribe to a read right now, if any.
    pub fn current_subscriber() -> Option<Effect> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .and_then(|entry| entry.effect.clone())
        })
    }

    /// Get the ID of the current subscriber, if any.
    pub fn current_subscriber_id() -> Option<SubscriberId> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .and_then(|entry| entry.effect.as_ref().map(Effect::subscriber_id))
        })
    }

    /// Check whether the given effect is anywhere on this thread's stack.
    pub fn is_running(subscriber_id: SubscriberId) -> bool {
        CONTEXT_STACK.with(|stack| {
            stack.borrow().iter().any(|entry| {
                entry
                    .effect
                    .as_ref()
                    .is_some_and(|effect| effect.subscriber_id() == subscriber_id)
            })
        })
    }

    /// Number of entries on the stack, untracked scopes included.
    pub fn depth() -> usize {
        CONTEXT_STACK.with(|stack| stack.borrow().len())
    }

    /// Record a dependency on the given signal.
    ///
    /// This is called by signals when they are read. Repeated reads of the
    /// same signal within one run are recorded once.
    pub fn track_dependency(signal_id: u64) {
        CONTEXT_STACK.with(|stack| {
            if let Some(entry) = stack.borrow_mut().last_mut() {
                if entry.effect.is_some() && !entry.dependencies.contains(&signal_id) {
                    entry.dependencies.push(signal_id);
                }
            }
        });
    }

    /// Get the dependencies collected in the current context.
    pub fn get_dependencies() -> Vec<u64> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .map(|entry| entry.dependencies.to_vec())
                .unwrap_or_default()
        })
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry.effect.as_ref().map(Effect::subscriber_id),
                    self.subscriber_id,
                    "ReactiveContext mismatch"
                );
            }
        });
    }
}

/// Run `f` without tracking any signal reads it performs.
///
/// Useful inside an effect body when a value is needed but changes to it
/// should not re-run the effect.
pub fn untrack<T>(f: impl FnOnce() -> T) -> T {
    let _ctx = ReactiveContext::enter_untracked();
    f()
}
