//! Opt-in checks of the modeling preconditions.
//!
//! Marginalization treats the open influences of an event as independent.
//! That only holds when no co-influence of an event directly influences
//! another (for a joint event, across the union of its members' influences),
//! and when no member of a joint event directly influences another member. Construction does not enforce either rule; these checks report
//! violations for callers that want them.

use std::fmt;

use crate::engine::errors::ExecError;
use crate::engine::event::{EventNode, FullConfigModel};
use crate::engine::network::{BayesNet, EventId};

/// A broken modeling precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureViolation {
    /// `upstream` and `downstream` both influence `event`, and `upstream`
    /// also influences `downstream`. For a joint event the influences are the
    /// union over its members.
    SiblingEdge {
        event: EventId,
        upstream: EventId,
        downstream: EventId,
    },
    /// `upstream` and `downstream` are both members of `joint`, and
    /// `upstream` influences `downstream`.
    JointMemberEdge {
        joint: EventId,
        upstream: EventId,
        downstream: EventId,
    },
}

impl StructureViolation {
    /// Renders the violation with event names.
    pub fn describe(&self, net: &BayesNet) -> String {
        let name = |id: EventId| net.name(id).map_or_else(|| id.to_string(), str::to_owned);
        match *self {
            StructureViolation::SiblingEdge {
                event,
                upstream,
                downstream,
            } => format!(
                "'{}' influences '{}', but both are influences of '{}'",
                name(upstream),
                name(downstream),
                name(event)
            ),
            StructureViolation::JointMemberEdge {
                joint,
                upstream,
                downstream,
            } => format!(
                "'{}' influences '{}', but both are members of joint '{}'",
                name(upstream),
                name(downstream),
                name(joint)
            ),
        }
    }
}

impl fmt::Display for StructureViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureViolation::SiblingEdge {
                event,
                upstream,
                downstream,
            } => write!(
                f,
                "{} influences {}, but both are influences of {}",
                upstream, downstream, event
            ),
            StructureViolation::JointMemberEdge {
                joint,
                upstream,
                downstream,
            } => write!(
                f,
                "{} influences {}, but both are members of {}",
                upstream, downstream, joint
            ),
        }
    }
}

impl BayesNet {
    /// Every sibling edge and joint-member edge in the network, in event order.
    ///
    /// A joint event is checked on both levels: its members, and the union of
    /// the members' influences that its marginalization enumerates.
    pub fn structure_violations(&self) -> Vec<StructureViolation> {
        let mut violations = Vec::new();
        for node in self.nodes() {
            let event = node.id();
            if let EventNode::Joint(joint) = node {
                violations.extend(self.edges_within(joint.members()).map(
                    |(upstream, downstream)| StructureViolation::JointMemberEdge {
                        joint: event,
                        upstream,
                        downstream,
                    },
                ));
            }
            violations.extend(self.edges_within(node.influences()).map(
                |(upstream, downstream)| StructureViolation::SiblingEdge {
                    event,
                    upstream,
                    downstream,
                },
            ));
        }
        violations
    }

    /// Fails with the first violation found, if any.
    pub fn check_structure(&self) -> Result<(), ExecError> {
        match self.structure_violations().first() {
            Some(violation) => Err(ExecError::ValidationError(format!(
                "structure: {}",
                violation.describe(self)
            ))),
            None => Ok(()),
        }
    }

    /// `(upstream, downstream)` pairs of `ids` joined by a direct influence.
    fn edges_within<'a>(
        &'a self,
        ids: &'a [EventId],
    ) -> impl Iterator<Item = (EventId, EventId)> + 'a {
        ids.iter().flat_map(move |&downstream| {
            ids.iter()
                .filter(move |&&upstream| self.directly_influences(upstream, downstream))
                .map(move |&upstream| (upstream, downstream))
        })
    }

    fn directly_influences(&self, upstream: EventId, downstream: EventId) -> bool {
        self.event(downstream)
            .map_or(false, |event| event.weight_of(upstream).is_some())
    }
}
