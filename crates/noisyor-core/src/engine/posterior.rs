//! Diagnostic queries by Bayes' rule.
//!
//! Inverts a forward query to ask how likely a cause is once an effect has
//! been observed:
//!
//! ```text
//! P(cause | evidence) = P(evidence | cause) * P(cause) / P(evidence)
//! ```
//!
//! The evidence is typically a joint event ("all symptoms present").

use crate::engine::assignment::Assignment;
use crate::engine::errors::ExecError;
use crate::engine::event::FullConfigModel;
use crate::engine::network::{BayesNet, EventId};
use crate::engine::probability::Probability;

impl BayesNet {
    /// `P(cause = 1 | evidence = 1)`.
    ///
    /// `cause` must be a direct influence of `evidence` (for a joint event, of
    /// one of its members): the forward term `P(evidence | cause)` is only
    /// conditioned on direct influences.
    pub fn posterior(&self, cause: EventId, evidence: EventId) -> Result<Probability, ExecError> {
        let evidence_node = self.require(evidence)?;
        self.require(cause)?;
        if !evidence_node.influences().contains(&cause) {
            return Err(ExecError::ValidationError(format!(
                "posterior: '{}' is not a direct influence of '{}'",
                self.node_unchecked(cause).name(),
                evidence_node.name()
            )));
        }

        let p_evidence = self.probability_true_exact(evidence, &Assignment::new())?;
        if p_evidence.is_zero() {
            return Err(ExecError::Numerical(format!(
                "posterior: evidence '{}' has probability zero",
                evidence_node.name()
            )));
        }
        let p_cause = self.probability_true_exact(cause, &Assignment::new())?;
        let given_cause = Assignment::from_pairs([(cause, true)])?;
        let likelihood = self.probability_true_exact(evidence, &given_cause)?;

        let value = likelihood.into_ratio() * p_cause.into_ratio() / p_evidence.into_ratio();
        Probability::new(value).map_err(|err| {
            ExecError::Internal(format!(
                "posterior of '{}' given '{}' left [0, 1]: {}",
                self.node_unchecked(cause).name(),
                evidence_node.name(),
                err
            ))
        })
    }

    /// [`BayesNet::posterior`] as an `f64`.
    pub fn posterior_f64(&self, cause: EventId, evidence: EventId) -> Result<f64, ExecError> {
        self.posterior(cause, evidence).map(|p| p.to_f64())
    }
}
