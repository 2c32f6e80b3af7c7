//! Error types for the reactive engine.
//!
//! Failures raised by user code inside effect or derivation bodies are
//! panics and unwind through the engine untouched. The only error the engine
//! itself reports is structural misuse of the dependency graph.

use thiserror::Error;

use crate::reactive::SubscriberId;

/// Errors reported while propagating a signal write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactiveError {
    /// An effect was re-triggered while it was still running.
    ///
    /// Following the re-run would recurse until the stack is exhausted.
    #[error("cyclic dependency: effect {effect} was re-triggered while still running")]
    CyclicDependency { effect: SubscriberId },
}

/// Result alias used throughout the crate.
pub type Result<T, E = ReactiveError> = std::result::Result<T, E>;
