//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and
//! tracks which effects depend on it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read while an effect is running, the signal registers
//!    that effect as a subscriber.
//!
//! 2. When a signal is written, every subscriber re-runs synchronously, in
//!    the order it first subscribed, before the write returns. Effects that
//!    subscribe while the write is propagating are run by it too.
//!
//! 3. There is no equality check. Writing the value the signal already holds
//!    still re-runs every subscriber.
//!
//! Subscribers are never removed. An effect that read this signal once stays
//! subscribed even if later runs no longer read it.
//!
//! # Ownership
//!
//! The subscriber set is owned by the handles that can write: [`Signal`] and
//! [`WriteSignal`]. A [`ReadSignal`] only holds it weakly. Effect bodies
//! normally capture read halves, so an effect and the signals it reads do not
//! keep each other alive: dropping the last writer frees the subscriber set,
//! its effects, and everything those effects captured. An effect that
//! captures a full [`Signal`] it also reads keeps itself alive for as long as
//! that capture exists.
//!
//! # Locking
//!
//! The value and the subscriber set sit behind `parking_lot` locks. No lock
//! is held while subscriber code runs, so effects are free to read and write
//! the signal that triggered them.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::context::ReactiveContext;
use super::effect::Effect;
use super::subscriber::Subscribers;
use crate::error::Result;

/// Counter for generating unique signal IDs.
static SIGNAL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique signal ID.
fn next_signal_id() -> u64 {
    SIGNAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// The running effect that a read of `signal_id` should subscribe, if any.
fn reading_effect(signal_id: u64) -> Option<Effect> {
    let effect = ReactiveContext::current_subscriber()?;
    ReactiveContext::track_dependency(signal_id);
    Some(effect)
}

/// A reactive signal holding a value of type T.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
///
/// // Read the value
/// let value = count.get();
///
/// // Update the value (re-runs subscribers)
/// count.set(5);
/// ```
pub struct Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Unique identifier for this signal.
    id: u64,

    /// The current value.
    value: Arc<RwLock<T>>,

    /// Effects to re-run on write, in subscription order.
    subscribers: Arc<RwLock<Subscribers>>,
}

impl<T> Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            id: next_signal_id(),
            value: Arc::new(RwLock::new(value)),
            subscribers: Arc::new(RwLock::new(Subscribers::new())),
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Get the current value.
    ///
    /// If called while an effect is running, this also subscribes that
    /// effect to the signal.
    pub fn get(&self) -> T {
        if let Some(effect) = reading_effect(self.id) {
            self.subscribers.write().insert(effect);
        }
        self.value.read().clone()
    }

    /// Read the current value through a reference, tracking the read like
    /// [`Signal::get`].
    ///
    /// `f` sees a copy taken before it runs, so it may write this signal or
    /// trigger writes that reach it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.get())
    }

    /// Get the current value without tracking dependencies.
    pub fn get_untracked(&self) -> T {
        self.value.read().clone()
    }

    /// Set a new value and re-run subscribers.
    ///
    /// # Panics
    ///
    /// Panics if propagation hits a cyclic dependency, that is, if the write
    /// re-triggers an effect that is still running. This covers an effect
    /// writing a signal it reads itself, even a conditional write that would
    /// settle after one more run (a clamp such as `if v > 10 { set(10) }`).
    /// Use [`Signal::try_set`] to handle that case instead. A panic from any
    /// subscriber body also propagates.
    pub fn set(&self, value: T) {
        if let Err(err) = self.try_set(value) {
            panic!("{err}");
        }
    }

    /// Set a new value and re-run subscribers, reporting propagation errors.
    ///
    /// The value is assigned before any subscriber runs and stays assigned
    /// even if propagation fails. The first failing subscriber stops the
    /// wave; subscribers after it are not run for this write.
    pub fn try_set(&self, value: T) -> Result<()> {
        *self.value.write() = value;
        self.notify_subscribers()
    }

    /// Update the value using a function.
    ///
    /// This is useful for updates that depend on the current value.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let new_value = f(&self.get_untracked());
        self.set(new_value);
    }

    /// Re-run every subscriber, including ones that join during the wave.
    fn notify_subscribers(&self) -> Result<()> {
        tracing::trace!(
            signal = self.id,
            subscribers = self.subscriber_count(),
            "signal written"
        );

        let mut index = 0;
        loop {
            // The lock is released before the effect runs.
            let next = self.subscribers.read().get(index);
            let Some(effect) = next else {
                break;
            };
            effect.execute()?;
            index += 1;
        }
        Ok(())
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Split into a read half and a write half sharing this signal.
    pub fn split(self) -> (ReadSignal<T>, WriteSignal<T>) {
        (self.read_only(), WriteSignal { inner: self })
    }

    /// Get a read-only handle to this signal.
    ///
    /// The handle does not keep the subscriber set alive.
    pub fn read_only(&self) -> ReadSignal<T> {
        ReadSignal {
            id: self.id,
            value: Arc::clone(&self.value),
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }
}

impl<T> Clone for Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            value: Arc::clone(&self.value),
            subscribers: Arc::clone(&self.subscribers),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id)
            .field("value", &self.get_untracked())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// The read half of a signal.
pub struct ReadSignal<T>
where
    T: Clone + Send + Sync + 'static,
{
    id: u64,
    value: Arc<RwLock<T>>,

    /// Gone once every writer has been dropped.
    subscribers: Weak<RwLock<Subscribers>>,
}

impl<T> ReadSignal<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Get the current value, subscribing the running effect if any.
    ///
    /// Once no writer is left the value can no longer change, and reads
    /// subscribe nothing.
    pub fn get(&self) -> T {
        if let Some(effect) = reading_effect(self.id) {
            if let Some(subscribers) = self.subscribers.upgrade() {
                subscribers.write().insert(effect);
            }
        }
        self.value.read().clone()
    }

    /// See [`Signal::with`].
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.get())
    }

    pub fn get_untracked(&self) -> T {
        self.value.read().clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .upgrade()
            .map_or(0, |subscribers| subscribers.read().len())
    }
}

impl<T> Clone for ReadSignal<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            value: Arc::clone(&self.value),
            subscribers: Weak::clone(&self.subscribers),
        }
    }
}

impl<T> Debug for ReadSignal<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadSignal")
            .field("id", &self.id)
            .field("value", &self.get_untracked())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// The write half of a signal. Owns the subscriber set.
pub struct WriteSignal<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Signal<T>,
}

impl<T> WriteSignal<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn id(&self) -> u64 {
        self.inner.id()
    }

    /// See [`Signal::set`], including its panics.
    pub fn set(&self, value: T) {
        self.inner.set(value);
    }

    /// See [`Signal::try_set`].
    pub fn try_set(&self, value: T) -> Result<()> {
        self.inner.try_set(value)
    }

    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        self.inner.update(f);
    }
}

impl<T> Clone for WriteSignal<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Debug for WriteSignal<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteSignal")
            .field("id", &self.inner.id())
            .finish()
    }
}

/// Create a signal and return its read and write halves.
///
/// The signal's subscribers live as long as the write half does.
///
/// ```rust,ignore
/// let (count, set_count) = create_signal(0);
/// set_count.set(count.get_untracked() + 1);
/// ```
pub fn create_signal<T>(initial: T) -> (ReadSignal<T>, WriteSignal<T>)
where
    T: Clone + Send + Sync + 'static,
{
    Signal::new(initial).split()
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
