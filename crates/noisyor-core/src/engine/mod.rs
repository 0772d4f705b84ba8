//! The inference engine for noisy-OR networks.
//!
//! This module provides:
//! - **errors**: Error types for construction and query failures
//! - **probability**: Exact rational probabilities
//! - **network**: The event arena and `EventId` handles
//! - **event**: Binary and joint events with their full-configuration probabilities
//! - **assignment**: Partial assignments and the compatibility test
//! - **inference**: Marginalization over un-pinned influences
//! - **posterior**: Diagnostic queries by Bayes' rule
//! - **structure**: Opt-in checks of the modeling preconditions
//! - **definition**: JSON network definitions (feature `serde`)

pub mod assignment;
#[cfg(feature = "serde")]
pub mod definition;
pub mod errors;
pub mod event;
pub mod inference;
pub mod network;
pub mod posterior;
pub mod probability;
pub mod structure;
