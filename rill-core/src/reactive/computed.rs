//! Computed Implementation
//!
//! A Computed is a read-only derived value. It is not a new kind of node:
//! it pairs a private [`Signal`] holding the last result with a private
//! [`Effect`] that re-derives the result and writes it into that signal.
//!
//! # How Computeds Work
//!
//! 1. On creation, the derivation runs once untracked to seed the signal.
//!
//! 2. The owning effect is then created, which runs the derivation again,
//!    this time tracked, and subscribes to everything it reads.
//!
//! 3. Each write to one of those signals re-derives exactly once and writes
//!    the result, which in turn re-runs whoever reads the computed.
//!
//! Because the effect always writes, readers of a computed re-run on every
//! upstream write even when the derived value did not change.
//!
//! The handle only holds its effect weakly. The effect is owned by the
//! signals it reads, so a computed that other effects capture does not keep
//! itself alive through them. Once every upstream writer is gone the cached
//! value stays readable but never changes again.

use std::fmt::Debug;

use super::context::untrack;
use super::effect::{Effect, WeakEffect};
use super::signal::{ReadSignal, Signal};

/// A derived value kept current by an internal effect.
///
/// # Example
///
/// ```rust,ignore
/// let (a, set_a) = create_signal(1);
/// let (b, set_b) = create_signal(2);
///
/// let sum = Computed::new(move || a.get() + b.get());
/// set_a.set(3);
/// set_b.set(4);
/// assert_eq!(sum.get(), 7);
/// ```
pub struct Computed<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// The cached result. The write half never leaves this module.
    value: ReadSignal<T>,

    /// The effect that keeps `value` current.
    effect: WeakEffect,
}

impl<T> Computed<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a computed value from the given derivation.
    ///
    /// The derivation runs twice here: once untracked to seed the value and
    /// once inside the owning effect to discover dependencies.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let signal = Signal::new(untrack(&compute));

        let writer = signal.clone();
        let effect = Effect::new(move || writer.set(compute()));

        Self {
            value: signal.read_only(),
            effect: effect.downgrade(),
        }
    }

    /// ID of the signal holding the cached value.
    pub fn id(&self) -> u64 {
        self.value.id()
    }

    /// Get the cached value, subscribing the running effect if any.
    pub fn get(&self) -> T {
        self.value.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.value.with(f)
    }

    /// Get the cached value without tracking.
    pub fn get_untracked(&self) -> T {
        self.value.get_untracked()
    }

    /// Number of distinct signals the derivation has ever read.
    ///
    /// Zero once the effect has been freed.
    pub fn dependency_count(&self) -> usize {
        self.effect
            .upgrade()
            .map_or(0, |effect| effect.dependency_count())
    }

    /// Number of tracked derivations so far, the seed excluded.
    pub fn recompute_count(&self) -> usize {
        self.effect.upgrade().map_or(0, |effect| effect.run_count())
    }
}

impl<T> Clone for Computed<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            effect: self.effect.clone(),
        }
    }
}

impl<T> Debug for Computed<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computed")
            .field("id", &self.id())
            .field("value", &self.get_untracked())
            .field("dependency_count", &self.dependency_count())
            .finish()
    }
}

/// Create a computed value. See [`Computed::new`].
pub fn create_computed<T, F>(compute: F) -> Computed<T>
where
    T: Clone + Send + Sync + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    Computed::new(compute)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
