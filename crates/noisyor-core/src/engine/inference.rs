//! Exact marginalization.
//!
//! `P(X = 1 | assignment)` is computed by enumerating every subset of `X`'s
//! direct influences as a full configuration, keeping those compatible with
//! the assignment, and summing
//!
//! ```text
//! P(X = 1 | config) * Π_{i unassigned} (P(i = 1) if i ∈ config else P(i = 0))
//! ```
//!
//! where the unassigned influence marginals come from the same query with an
//! empty assignment. Treating them as independent factors is what the
//! no-sibling-edge precondition licenses.
//!
//! The algorithm is written once against [`FullConfigModel`], so binary and
//! joint events share it. Arithmetic is exact until the `f64` boundary.

use num_rational::BigRational;
use num_traits::{One, Zero};
use rustc_hash::FxHashMap;

use crate::engine::assignment::Assignment;
use crate::engine::errors::ExecError;
use crate::engine::event::{EventNode, FullConfig, FullConfigModel};
use crate::engine::network::{BayesNet, EventId};
use crate::engine::probability::Probability;

/// Enumeration masks are `u64`, one bit per influence.
const MAX_SUPPORTED_FAN_IN: usize = 63;

/// Default for [`InferenceConfig::max_depth`].
const DEFAULT_MAX_DEPTH: usize = 256;

/// Configuration for exact inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InferenceConfig {
    /// Largest direct-influence set a query may enumerate (`2^max_fan_in` configurations).
    pub max_fan_in: usize,
    /// Reuse unconditional ancestor marginals within a single query.
    pub memoize: bool,
    /// Longest chain of ancestors a query may recurse through. Marginals of
    /// open influences are computed recursively, one stack level per ancestor.
    pub max_depth: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            max_fan_in: 20,
            memoize: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl InferenceConfig {
    pub fn validate(self) -> Result<Self, ExecError> {
        if self.max_fan_in == 0 {
            return Err(ExecError::ValidationError(
                "inference: max_fan_in must be > 0".into(),
            ));
        }
        if self.max_fan_in > MAX_SUPPORTED_FAN_IN {
            return Err(ExecError::ValidationError(format!(
                "inference: max_fan_in must be <= {}",
                MAX_SUPPORTED_FAN_IN
            )));
        }
        if self.max_depth == 0 {
            return Err(ExecError::ValidationError(
                "inference: max_depth must be > 0".into(),
            ));
        }
        Ok(self)
    }
}

/// Work counters for one query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InferenceDiagnostics {
    /// Full configurations enumerated, across the query and every ancestor sub-query.
    pub configurations_enumerated: u64,
    /// Of those, the ones compatible with their assignment.
    pub configurations_compatible: u64,
    /// Unconditional ancestor marginals computed from scratch.
    pub ancestor_queries: u64,
    /// Unconditional ancestor marginals served from the per-query cache.
    pub cache_hits: u64,
}

/// One query's evaluation state.
struct Marginalizer<'a> {
    net: &'a BayesNet,
    cache: FxHashMap<EventId, BigRational>,
    depth: usize,
    diagnostics: InferenceDiagnostics,
}

impl<'a> Marginalizer<'a> {
    fn new(net: &'a BayesNet) -> Self {
        Self {
            net,
            cache: FxHashMap::default(),
            depth: 0,
            diagnostics: InferenceDiagnostics::default(),
        }
    }

    /// `P(id = 1 | assignment)`.
    fn success(&mut self, id: EventId, assignment: &Assignment) -> Result<BigRational, ExecError> {
        let net = self.net;
        let node = net.require(id)?;
        let influences = node.influences();
        let fan_in = influences.len();
        let limit = net.config().max_fan_in;
        if fan_in > limit {
            return Err(ExecError::FanInTooLarge {
                event: id,
                fan_in,
                limit,
            });
        }

        let mut total = BigRational::zero();
        for mask in 0..(1_u64 << fan_in) {
            let config = FullConfig::new(influences, mask);
            self.diagnostics.configurations_enumerated += 1;
            if !assignment.is_compatible(&config) {
                continue;
            }
            self.diagnostics.configurations_compatible += 1;
            total += self.weighted_term(node, &config, assignment)?;
        }
        Ok(total)
    }

    /// One marginalization term: the full-configuration success probability
    /// times the marginal of every influence the assignment leaves open.
    fn weighted_term(
        &mut self,
        node: &EventNode,
        config: &FullConfig<'_>,
        assignment: &Assignment,
    ) -> Result<BigRational, ExecError> {
        let mut term = node.success_given_full_config(self.net, config);
        for (bit, &influence) in config.influences().iter().enumerate() {
            if term.is_zero() {
                break;
            }
            if assignment.contains(influence) {
                continue;
            }
            let p_true = self.unconditional(influence)?;
            if config.is_set(bit) {
                term *= p_true;
            } else {
                term *= BigRational::one() - p_true;
            }
        }
        Ok(term)
    }

    /// `P(id = 1)` with nothing assigned.
    fn unconditional(&mut self, id: EventId) -> Result<BigRational, ExecError> {
        if self.net.config().memoize {
            if let Some(cached) = self.cache.get(&id) {
                self.diagnostics.cache_hits += 1;
                #[cfg(feature = "tracing")]
                tracing::trace!(event = %id, "marginal cache hit");
                return Ok(cached.clone());
            }
        }

        let limit = self.net.config().max_depth;
        if self.depth >= limit {
            return Err(ExecError::DepthTooLarge { event: id, limit });
        }
        self.diagnostics.ancestor_queries += 1;
        self.depth += 1;
        let value = self.success(id, &Assignment::new());
        self.depth -= 1;
        let value = value?;
        if self.net.config().memoize {
            self.cache.insert(id, value.clone());
        }
        Ok(value)
    }
}

impl BayesNet {
    /// `P(id = 1 | assignment)` as an `f64`.
    pub fn probability_true(&self, id: EventId, assignment: &Assignment) -> Result<f64, ExecError> {
        self.probability_true_exact(id, assignment)
            .map(|p| p.to_f64())
    }

    /// `P(id = 0 | assignment)` as an `f64`.
    pub fn probability_false(
        &self,
        id: EventId,
        assignment: &Assignment,
    ) -> Result<f64, ExecError> {
        self.probability_false_exact(id, assignment)
            .map(|p| p.to_f64())
    }

    /// `P(id = 1 | assignment)`, exact.
    pub fn probability_true_exact(
        &self,
        id: EventId,
        assignment: &Assignment,
    ) -> Result<Probability, ExecError> {
        self.probability_true_with_diagnostics(id, assignment)
            .map(|(p, _)| p)
    }

    /// `P(id = 0 | assignment)`, exact.
    pub fn probability_false_exact(
        &self,
        id: EventId,
        assignment: &Assignment,
    ) -> Result<Probability, ExecError> {
        self.probability_true_exact(id, assignment)
            .map(|p| p.complement())
    }

    /// `P(id = 1 | assignment)` together with work counters.
    ///
    /// Assigned events must belong to this network. Assigned events that are
    /// not direct influences of `id` are ignored.
    pub fn probability_true_with_diagnostics(
        &self,
        id: EventId,
        assignment: &Assignment,
    ) -> Result<(Probability, InferenceDiagnostics), ExecError> {
        let _node = self.require(id)?;
        for (event, _) in assignment.iter() {
            self.require(event)?;
        }

        let mut marginalizer = Marginalizer::new(self);
        let value = marginalizer.success(id, assignment)?;
        let probability = probability_in_range(value, id)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            event = %id,
            name = self.name(id).unwrap_or_default(),
            fan_in = _node.influences().len(),
            assigned = assignment.len(),
            configurations = marginalizer.diagnostics.configurations_enumerated,
            compatible = marginalizer.diagnostics.configurations_compatible,
            ancestor_queries = marginalizer.diagnostics.ancestor_queries,
            cache_hits = marginalizer.diagnostics.cache_hits,
            "marginalized success probability"
        );

        Ok((probability, marginalizer.diagnostics))
    }

    /// `P(id = 1 | config)` where exactly `true_events` are true among `id`'s
    /// direct influences. Events outside the influence set are ignored.
    pub fn success_given_full_config(
        &self,
        id: EventId,
        true_events: &[EventId],
    ) -> Result<Probability, ExecError> {
        let node = self.require_mask_width(id)?;
        let config = FullConfig::from_true_events(node.influences(), true_events);
        probability_in_range(node.success_given_full_config(self, &config), id)
    }

    /// `P(id = 0 | config)`, see [`BayesNet::success_given_full_config`].
    pub fn failure_given_full_config(
        &self,
        id: EventId,
        true_events: &[EventId],
    ) -> Result<Probability, ExecError> {
        let node = self.require_mask_width(id)?;
        let config = FullConfig::from_true_events(node.influences(), true_events);
        probability_in_range(node.failure_given_full_config(self, &config), id)
    }

    /// Whether the full configuration "exactly `true_events` hold among
    /// `id`'s direct influences" agrees with `assignment`.
    pub fn is_compatible(
        &self,
        id: EventId,
        true_events: &[EventId],
        assignment: &Assignment,
    ) -> Result<bool, ExecError> {
        let node = self.require_mask_width(id)?;
        let config = FullConfig::from_true_events(node.influences(), true_events);
        Ok(assignment.is_compatible(&config))
    }

    /// Looks up `id`, failing when its influences do not fit a configuration mask.
    fn require_mask_width(&self, id: EventId) -> Result<&EventNode, ExecError> {
        let node = self.require(id)?;
        let fan_in = node.influences().len();
        if fan_in > MAX_SUPPORTED_FAN_IN {
            return Err(ExecError::FanInTooLarge {
                event: id,
                fan_in,
                limit: MAX_SUPPORTED_FAN_IN,
            });
        }
        Ok(node)
    }
}

fn probability_in_range(value: BigRational, id: EventId) -> Result<Probability, ExecError> {
    Probability::new(value).map_err(|err| {
        ExecError::Internal(format!("{} produced an invalid probability: {}", id, err))
    })
}
