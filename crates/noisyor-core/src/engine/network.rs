//! # Event arena
//!
//! [`BayesNet`] owns every event of a network and hands out [`EventId`]
//! handles. Handles are the identity of an event: two events built with the
//! same parameters are still distinct.
//!
//! ## Design
//!
//! - Events are append-only. An event can only name influences that already
//!   exist, so the influence graph is acyclic by construction.
//! - Nothing is mutated after insertion; queries take `&self`.
//! - The no-sibling-edge precondition (co-influences of an event never
//!   influence each other) is a caller contract. It is only checked on request,
//!   see [`BayesNet::structure_violations`].
//!
//! ## Example
//!
//! ```rust
//! use noisyor_core::{Assignment, BayesNet, Probability};
//!
//! # fn main() -> Result<(), noisyor_core::ExecError> {
//! let mut net = BayesNet::new();
//! let burglar = net.add_root_event("Burglar", "0.001".parse()?)?;
//! let weight: Probability = "0.99".parse()?;
//! let alarm = net.add_event("Alarm", "0.001".parse()?, [(burglar, weight)])?;
//!
//! let given = Assignment::from_pairs([(burglar, true)])?;
//! let p = net.probability_true(alarm, &given)?;
//! assert!((p - (1.0 - 0.999 * 0.01)).abs() < 1e-12);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::engine::errors::ExecError;
use crate::engine::event::{BinaryEvent, EventNode, Influence, JointEvent};
use crate::engine::inference::InferenceConfig;
use crate::engine::probability::Probability;

/// A handle to an event in a [`BayesNet`].
///
/// EventId implements Ord/PartialOrd for stable, deterministic iteration.
/// Uses u32 internally; the value is the event's position in the arena.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventId(pub u32);

impl EventId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event #{}", self.0)
    }
}

/// A network of binary and joint events.
#[derive(Debug, Clone, Default)]
pub struct BayesNet {
    nodes: Vec<EventNode>,
    config: InferenceConfig,
}

impl BayesNet {
    /// Creates an empty network with the default [`InferenceConfig`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty network with an explicit configuration.
    pub fn with_config(config: InferenceConfig) -> Result<Self, ExecError> {
        Ok(Self {
            nodes: Vec::new(),
            config: config.validate()?,
        })
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Adds a binary event.
    ///
    /// `baseline` is the success probability when no influence is active.
    /// Each `(source, weight)` pair gives `source` an independent chance
    /// `weight` of causing success when it is true.
    ///
    /// Fails if a source is unknown or listed twice.
    pub fn add_event<N, I>(
        &mut self,
        name: N,
        baseline: Probability,
        influences: I,
    ) -> Result<EventId, ExecError>
    where
        N: Into<Arc<str>>,
        I: IntoIterator<Item = (EventId, Probability)>,
    {
        let name = name.into();
        let mut seen = FxHashSet::default();
        let mut edges = Vec::new();
        for (source, weight) in influences {
            self.require(source)?;
            if !seen.insert(source) {
                return Err(ExecError::ValidationError(format!(
                    "event '{}' lists influence '{}' more than once",
                    name,
                    self.node_unchecked(source).name()
                )));
            }
            edges.push(Influence { source, weight });
        }

        let id = self.next_id()?;
        let sources = edges.iter().map(|inf| inf.source).collect();
        self.nodes.push(EventNode::Binary(BinaryEvent {
            id,
            name,
            baseline,
            influences: edges,
            sources,
        }));
        Ok(id)
    }

    /// Adds a binary event without influences.
    pub fn add_root_event<N>(&mut self, name: N, baseline: Probability) -> Result<EventId, ExecError>
    where
        N: Into<Arc<str>>,
    {
        self.add_event(name, baseline, std::iter::empty())
    }

    /// Adds the conjunction of `members`.
    ///
    /// Members must exist; at least one is required. Members must not
    /// influence each other directly; like the sibling rule, this is not
    /// checked here.
    pub fn add_joint_event<N, I>(&mut self, name: N, members: I) -> Result<EventId, ExecError>
    where
        N: Into<Arc<str>>,
        I: IntoIterator<Item = EventId>,
    {
        let name = name.into();
        let members: SmallVec<[EventId; 4]> = members.into_iter().collect();
        if members.is_empty() {
            return Err(ExecError::ValidationError(format!(
                "joint event '{}' has no members",
                name
            )));
        }

        let mut influences = Vec::new();
        let mut seen = FxHashSet::default();
        for &member in &members {
            let node = self.require(member)?;
            for &source in crate::engine::event::FullConfigModel::influences(node) {
                if seen.insert(source) {
                    influences.push(source);
                }
            }
        }

        let id = self.next_id()?;
        self.nodes.push(EventNode::Joint(JointEvent {
            id,
            name,
            members,
            influences,
        }));
        Ok(id)
    }

    /// Looks up an event.
    pub fn node(&self, id: EventId) -> Option<&EventNode> {
        self.nodes.get(id.index())
    }

    /// Looks up an event, failing with a validation error for unknown handles.
    pub fn require(&self, id: EventId) -> Result<&EventNode, ExecError> {
        self.node(id).ok_or_else(|| {
            ExecError::ValidationError(format!("{} does not belong to this network", id))
        })
    }

    /// Looks up a binary event.
    pub fn event(&self, id: EventId) -> Option<&BinaryEvent> {
        self.node(id).and_then(EventNode::as_binary)
    }

    /// Looks up a joint event.
    pub fn joint(&self, id: EventId) -> Option<&JointEvent> {
        self.node(id).and_then(EventNode::as_joint)
    }

    /// First event with this name.
    pub fn find(&self, name: &str) -> Option<EventId> {
        self.nodes
            .iter()
            .find(|node| node.name() == name)
            .map(EventNode::id)
    }

    pub fn name(&self, id: EventId) -> Option<&str> {
        self.node(id).map(EventNode::name)
    }

    /// All events in insertion order.
    pub fn nodes(&self) -> &[EventNode] {
        &self.nodes
    }

    pub fn ids(&self) -> impl Iterator<Item = EventId> + '_ {
        self.nodes.iter().map(EventNode::id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Arena lookup for handles stored inside the network itself.
    ///
    /// Influence sources and joint members are validated on insertion and the
    /// arena never shrinks, so those handles always resolve.
    #[inline]
    pub(crate) fn node_unchecked(&self, id: EventId) -> &EventNode {
        &self.nodes[id.index()]
    }

    fn next_id(&self) -> Result<EventId, ExecError> {
        u32::try_from(self.nodes.len())
            .map(EventId)
            .map_err(|_| ExecError::ValidationError("network is full".into()))
    }
}
