//! Reactive Primitives
//!
//! This module implements the core reactive system: signals, effects, and
//! computed values.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! while an effect is running, the signal registers that effect as a
//! subscriber. When the signal is written, every subscriber re-runs before
//! the write returns.
//!
//! ## Effects
//!
//! An Effect is a side-effecting computation. It runs once when created and
//! again whenever a signal it has read is written.
//!
//! ## Computed
//!
//! A Computed is a derived value: a signal whose value is kept current by
//! an effect it owns. Reading a computed inside another effect subscribes
//! that effect, so computeds compose.
//!
//! # Implementation Notes
//!
//! Dependency tracking uses a thread-local stack of running effects. When a
//! signal is read, the effect on top of the stack (if any) subscribes.
//! Propagation is fully synchronous and depth-first: a write runs its
//! subscribers, whose own writes run theirs, all within the original call.

mod computed;
mod context;
mod effect;
mod signal;
mod subscriber;

pub use computed::{create_computed, Computed};
pub use context::{untrack, ReactiveContext};
pub use effect::{create_effect, Effect, WeakEffect};
pub use signal::{create_signal, ReadSignal, Signal, WriteSignal};
pub use subscriber::{SubscriberId, Subscribers};
