//! # noisyor core
//!
//! Exact inference over Bayesian networks of binary events combined with
//! noisy-OR rules.
//!
//! A [`BayesNet`] holds binary events (a baseline success rate plus weighted
//! influences from other events) and joint events (conjunctions of events).
//! Queries ask for `P(event = 1 | assignment)` where the assignment fixes some
//! of the event's direct influences; every other influence is marginalized
//! out exactly.

#![forbid(unsafe_code)]

pub mod engine;

// Re-export commonly used types
pub use engine::assignment::Assignment;
#[cfg(feature = "serde")]
pub use engine::definition::{LoadedNetwork, NetworkDefinition, QueryOutcome};
pub use engine::errors::ExecError;
pub use engine::event::{BinaryEvent, EventNode, FullConfig, FullConfigModel, Influence, JointEvent};
pub use engine::inference::{InferenceConfig, InferenceDiagnostics};
pub use engine::network::{BayesNet, EventId};
pub use engine::probability::Probability;
pub use engine::structure::StructureViolation;
