//! Rill Core
//!
//! This crate provides a fine-grained, synchronous, dependency-tracking
//! reactive engine. It implements:
//!
//! - Signals: mutable cells that remember which effects read them
//! - Effects: computations re-run whenever a signal they read is written
//! - Computed values: derived signals kept current by an internal effect
//!
//! Callers never declare dependencies. They are discovered from which
//! signals each effect reads while it runs.
//!
//! # Architecture
//!
//! - `reactive`: the primitives and the dependency context
//! - `error`: errors reported during propagation
//!
//! # Example
//!
//! ```rust,ignore
//! use rill_core::{create_computed, create_effect, create_signal};
//!
//! // Create a signal
//! let (count, set_count) = create_signal(0);
//!
//! // Create a derived value
//! let c = count.clone();
//! let doubled = create_computed(move || c.get() * 2);
//!
//! // Create an effect
//! create_effect(move || {
//!     println!("Count: {}, Doubled: {}", count.get(), doubled.get());
//! });
//!
//! // Update the signal
//! set_count.set(5);
//! // Prints "Count: 5, Doubled: 10" twice: once through `doubled`,
//! // once through `count`. There is no de-duplication.
//! ```

pub mod error;
pub mod reactive;

pub use error::{ReactiveError, Result};
pub use reactive::{
    create_computed, create_effect, create_signal, untrack, Computed, Effect, ReadSignal, Signal,
    WeakEffect, WriteSignal,
};
