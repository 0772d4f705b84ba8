//! Error types for network construction and inference.

use thiserror::Error;

use crate::engine::network::EventId;

/// Errors that can occur while building a network or answering a query.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in the future without breaking changes.
///
/// All public APIs return `Result<T, ExecError>`; library code does not panic
/// on bad input. A network that breaks the no-sibling-edge precondition is not
/// an error by itself: it yields meaningless probabilities unless the caller
/// asks for [`BayesNet::check_structure`](crate::BayesNet::check_structure).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ExecError {
    /// Malformed network definition text.
    #[error("parse error: {0}")]
    ParseError(String),

    /// Invalid construction parameters or references (probability outside
    /// [0, 1], unknown event, duplicate influence, empty joint event).
    #[error("validation error: {0}")]
    ValidationError(String),

    /// A partial assignment was given two different truth values for the same event.
    #[error("contradictory assignment: {event} is required to be both true and false")]
    ContradictoryAssignment { event: EventId },

    /// Enumerating the configurations of this event would exceed the configured limit.
    #[error("fan-in of {event} is {fan_in}, above the configured limit of {limit}")]
    FanInTooLarge {
        event: EventId,
        fan_in: usize,
        limit: usize,
    },

    /// The query would recurse through more ancestor levels than configured.
    #[error("marginalizing {event} needs more than {limit} ancestor levels")]
    DepthTooLarge { event: EventId, limit: usize },

    /// Numerical error (NaN/Inf input, conditioning on a zero-probability event).
    #[error("numerical error: {0}")]
    Numerical(String),

    /// Internal error (programmer error, not user error).
    #[error("internal error: {0}")]
    Internal(String),
}
