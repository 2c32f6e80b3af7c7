//! Effect Implementation
//!
//! An Effect is a side-effecting computation that re-runs whenever a signal
//! it read is written.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its function immediately. Every signal
//!    read during that run subscribes the effect.
//!
//! 2. When any of those signals is written, the effect re-runs synchronously
//!    inside the write.
//!
//! 3. Each run registers whatever it reads. Nothing is unregistered, so an
//!    effect's dependencies only ever grow across its lifetime.
//!
//! # Ownership
//!
//! An effect is kept alive by the subscriber sets it joined, and those sets
//! belong to the write side of each signal. Once every writer of every signal
//! an effect reads is gone, nothing can re-run it, and the effect is freed
//! along with whatever its body captured. [`Effect::dispose`] frees the body
//! straight away.
//!
//! # Failure
//!
//! A panicking body unwinds out of the run and into whatever triggered it
//! (the creating call or a signal write). The context stack is popped on the
//! way out. Re-triggering an effect that is still running is reported as
//! [`ReactiveError::CyclicDependency`] instead of recursing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexSet;
use parking_lot::RwLock;

use super::context::ReactiveContext;
use super::subscriber::SubscriberId;
use crate::error::{ReactiveError, Result};

type Body = Arc<dyn Fn() + Send + Sync>;

struct EffectState {
    /// Identity used for subscriber-set membership.
    subscriber_id: SubscriberId,

    /// The effect function. `None` once disposed.
    run: RwLock<Option<Body>>,

    /// Signal IDs this effect has read on any run, in first-read order.
    dependencies: RwLock<IndexSet<u64>>,

    /// Number of completed runs.
    run_count: AtomicUsize,
}

/// A side-effecting computation that runs when dependencies change.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
///
/// let c = count.clone();
/// let effect = Effect::new(move || {
///     println!("Count is: {}", c.get());
/// });
///
/// count.set(5);  // Prints: "Count is: 5"
/// ```
pub struct Effect {
    state: Arc<EffectState>,
}

/// A non-owning reference to an [`Effect`].
pub struct WeakEffect {
    state: Weak<EffectState>,
}

impl Effect {
    /// Create a new effect with the given function.
    ///
    /// The function runs immediately to establish initial dependencies.
    ///
    /// # Panics
    ///
    /// A panic from that first run propagates out of `new`. So does a
    /// cyclic dependency: if the first run writes a signal that re-triggers
    /// an effect still running, the write panics. This includes an effect
    /// writing a signal it reads itself, even conditionally, such as a clamp
    /// that only writes when the value is out of range.
    pub fn new<F>(run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let effect = Self {
            state: Arc::new(EffectState {
                subscriber_id: SubscriberId::new(),
                run: RwLock::new(Some(Arc::new(run))),
                dependencies: RwLock::new(IndexSet::new()),
                run_count: AtomicUsize::new(0),
            }),
        };
        tracing::debug!(effect = %effect.subscriber_id(), "effect created");

        // A fresh effect cannot be on the stack yet.
        if let Some(body) = effect.body() {
            effect.run_tracked(&body);
        }

        effect
    }

    /// Get the subscriber ID for this effect.
    pub fn subscriber_id(&self) -> SubscriberId {
        self.state.subscriber_id
    }

    /// Get a non-owning reference to this effect.
    pub fn downgrade(&self) -> WeakEffect {
        WeakEffect {
            state: Arc::downgrade(&self.state),
        }
    }

    fn body(&self) -> Option<Body> {
        self.state.run.read().clone()
    }

    /// Re-run the effect function.
    ///
    /// Does nothing if the effect has been disposed.
    ///
    /// # Errors
    ///
    /// Returns [`ReactiveError::CyclicDependency`] without running if this
    /// effect is already running further up the call stack.
    pub fn execute(&self) -> Result<()> {
        let Some(body) = self.body() else {
            return Ok(());
        };

        if ReactiveContext::is_running(self.subscriber_id()) {
            tracing::warn!(effect = %self.subscriber_id(), "cyclic dependency detected");
            return Err(ReactiveError::CyclicDependency {
                effect: self.subscriber_id(),
            });
        }

        self.run_tracked(&body);
        Ok(())
    }

    /// Run the body with this effect on top of the context stack.
    fn run_tracked(&self, body: &Body) {
        let run = self.run_count() + 1;
        tracing::trace!(effect = %self.subscriber_id(), run, "running effect");

        let reads = {
            let _ctx = ReactiveContext::enter(self.clone());
            body();
            ReactiveContext::get_dependencies()
        };

        self.state.dependencies.write().extend(reads);
        self.state.run_count.fetch_add(1, Ordering::SeqCst);
    }

    /// Stop the effect from running again and drop its body.
    ///
    /// Everything the body captured is released now. The effect itself stays
    /// in the subscriber sets it joined; writes to those signals skip it.
    pub fn dispose(&self) {
        let body = self.state.run.write().take();
        // Drop outside the lock; captured values may run arbitrary Drop code.
        drop(body);
    }

    /// Check if the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.state.run.read().is_none()
    }

    /// Get the number of times the effect has run to completion.
    pub fn run_count(&self) -> usize {
        self.state.run_count.load(Ordering::SeqCst)
    }

    /// Get the number of distinct signals this effect has ever read.
    pub fn dependency_count(&self) -> usize {
        self.state.dependencies.read().len()
    }

    /// IDs of every signal this effect has ever read, in first-read order.
    pub fn dependencies(&self) -> Vec<u64> {
        self.state.dependencies.read().iter().copied().collect()
    }
}

impl Clone for Effect {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.subscriber_id())
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl WeakEffect {
    /// Get the effect back if anything still owns it.
    pub fn upgrade(&self) -> Option<Effect> {
        self.state.upgrade().map(|state| Effect { state })
    }
}

impl Clone for WeakEffect {
    fn clone(&self) -> Self {
        Self {
            state: Weak::clone(&self.state),
        }
    }
}

/// Create an effect and run it once.
///
/// There is no handle to keep: the effect is owned by the subscriber sets of
/// the signals it reads and lives as long as any of their writers. Use
/// [`Effect::new`] for a handle that can report its run count or be disposed.
///
/// # Panics
///
/// Same as [`Effect::new`]. In particular, a body that writes a signal it
/// also reads panics with a cyclic dependency error, even when the write is
/// conditional and would settle after one more run.
pub fn create_effect<F>(body: F)
where
    F: Fn() + Send + Sync + 'static,
{
    Effect::new(body);
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Signal;
    use std::sync::atomic::{AtomicBool, AtomicI32};

    #[test]
    fn effect_runs_on_creation() {
        let run_count = Arc::new(AtomicI32::new(0));
        let run_count_clone = run_count.clone();

        let _effect = Effect::new(move || {
            run_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        // Effect should have run once on creation
        assert_eq!(run_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn effect_runs_on_execute() {
        let run_count = Arc::new(AtomicI32::new(0));
        let run_count_clone = run_count.clone();

        let effect = Effect::new(move || {
            run_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(run_count.load(Ordering::SeqCst), 1);

        effect.execute().unwrap();
        assert_eq!(run_count.load(Ordering::SeqCst), 2);

        effect.execute().unwrap();
        assert_eq!(run_count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn effect_does_not_run_after_disposal() {
        let signal = Signal::new(0);
        let run_count = Arc::new(AtomicI32::new(0));
        let run_count_clone = run_count.clone();

        let signal_clone = signal.clone();
        let effect = Effect::new(move || {
            signal_clone.get();
            run_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(run_count.load(Ordering::SeqCst), 1);

        effect.dispose();
        assert!(effect.is_disposed());

        // Writes skip it, and so does a direct execute
        signal.set(1);
        effect.execute().unwrap();
        assert_eq!(run_count.load(Ordering::SeqCst), 1);

        // Still registered, just inert
        assert_eq!(signal.subscriber_count(), 1);
    }

    #[test]
    fn dispose_releases_captured_values() {
        struct Sentinel(Arc<AtomicBool>);
        impl Drop for Sentinel {
            fn drop(&mut self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let dropped = Arc::new(AtomicBool::new(false));
        let sentinel = Sentinel(dropped.clone());
        let signal = Signal::new(0);

        let signal_clone = signal.clone();
        let effect = Effect::new(move || {
            let _keep = &sentinel;
            signal_clone.get();
        });
        assert!(!dropped.load(Ordering::SeqCst));

        effect.dispose();
        assert!(dropped.load(Ordering::SeqCst));

        // Writes still find the entry but skip it
        signal.set(1);
        assert_eq!(effect.run_count(), 1);
    }

    #[test]
    fn weak_effect_upgrades_while_owned() {
        let effect = Effect::new(|| {});
        let weak = effect.downgrade();

        let upgraded = weak.upgrade().unwrap();
        assert_eq!(upgraded.subscriber_id(), effect.subscriber_id());

        drop(upgraded);
        drop(effect);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn effect_tracks_run_count() {
        let effect = Effect::new(|| {});

        assert_eq!(effect.run_count(), 1);

        effect.execute().unwrap();
        assert_eq!(effect.run_count(), 2);

        effect.execute().unwrap();
        assert_eq!(effect.run_count(), 3);
    }

    #[test]
    fn effect_clone_shares_state() {
        let effect1 = Effect::new(|| {});
        let effect2 = effect1.clone();

        assert_eq!(effect1.subscriber_id(), effect2.subscriber_id());

        assert_eq!(effect1.run_count(), 1);
        assert_eq!(effect2.run_count(), 1);

        effect1.execute().unwrap();
        assert_eq!(effect1.run_count(), 2);
        assert_eq!(effect2.run_count(), 2);

        effect1.dispose();
        assert!(effect2.is_disposed());
    }

    #[test]
    fn dependencies_only_grow() {
        let toggle = Signal::new(true);
        let a = Signal::new(1);
        let b = Signal::new(2);

        let (t, a2, b2) = (toggle.clone(), a.clone(), b.clone());
        let effect = Effect::new(move || {
            if t.get() {
                a2.get();
            } else {
                b2.get();
            }
        });

        assert_eq!(effect.dependencies(), vec![toggle.id(), a.id()]);

        toggle.set(false);
        assert_eq!(effect.dependencies(), vec![toggle.id(), a.id(), b.id()]);

        toggle.set(true);
        assert_eq!(effect.dependency_count(), 3);
    }

    #[test]
    fn execute_while_running_is_a_cycle() {
        let slot: Arc<RwLock<Option<Effect>>> = Arc::new(RwLock::new(None));
        let outcome: Arc<RwLock<Option<Result<()>>>> = Arc::new(RwLock::new(None));

        let (slot_clone, outcome_clone) = (slot.clone(), outcome.clone());
        let effect = Effect::new(move || {
            let me = slot_clone.read().clone();
            if let Some(me) = me {
                *outcome_clone.write() = Some(me.execute());
            }
        });
        *slot.write() = Some(effect.clone());

        effect.execute().unwrap();

        assert_eq!(
            outcome.read().clone(),
            Some(Err(ReactiveError::CyclicDependency {
                effect: effect.subscriber_id()
            }))
        );
        assert_eq!(effect.run_count(), 2);
    }

    #[test]
    fn create_effect_runs_eagerly() {
        let signal = Signal::new(0);
        let seen = Arc::new(AtomicI32::new(-1));

        let (signal_clone, seen_clone) = (signal.clone(), seen.clone());
        create_effect(move || {
            seen_clone.store(signal_clone.get(), Ordering::SeqCst);
        });
        assert_eq!(seen.load(Ordering::SeqCst), 0);

        signal.set(9);
        assert_eq!(seen.load(Ordering::SeqCst), 9);
    }
}
