//! Event kinds and their full-configuration probabilities.
//!
//! ## Key Components
//!
//! - **BinaryEvent**: a binary variable with a baseline success rate and weighted
//!   noisy-OR influences
//! - **JointEvent**: the conjunction of several events, queried like a single event
//! - **FullConfigModel**: the capability both kinds share; the marginalization in
//!   [`inference`](crate::engine::inference) is written once against it
//!
//! ## Noisy-OR
//!
//! With baseline `g` and active influences `i` of weight `w_i`:
//!
//! ```text
//! P(fail | config)    = (1 - g) * Π_{i active} (1 - w_i)
//! P(succeed | config) = 1 - P(fail | config)
//! ```

use std::fmt;
use std::sync::Arc;

use num_rational::BigRational;
use num_traits::One;
use smallvec::SmallVec;

use crate::engine::network::{BayesNet, EventId};
use crate::engine::probability::Probability;

/// A weighted edge from an upstream event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Influence {
    /// The upstream event.
    pub source: EventId,
    /// Probability that `source`, when true, causes success on its own.
    pub weight: Probability,
}

/// A concrete truth value for every event in an influence slice.
///
/// Bit `i` of the mask set means `influences[i]` is true; every other event
/// of the slice is false. Events outside the slice are not covered.
#[derive(Debug, Clone, Copy)]
pub struct FullConfig<'a> {
    influences: &'a [EventId],
    mask: u64,
}

impl<'a> FullConfig<'a> {
    pub(crate) fn new(influences: &'a [EventId], mask: u64) -> Self {
        Self { influences, mask }
    }

    /// Configuration where exactly the listed events are true. Listed events
    /// outside `influences` are ignored.
    ///
    /// The mask has 64 bits: events past the 64th of the slice always read as
    /// false. [`BayesNet`] rejects such slices before building a configuration.
    pub fn from_true_events(influences: &'a [EventId], true_events: &[EventId]) -> Self {
        let mask = influences
            .iter()
            .enumerate()
            .filter(|(_, id)| true_events.contains(*id))
            .fold(0_u64, |mask, (bit, _)| mask | bit_mask(bit));
        Self { influences, mask }
    }

    /// Whether `event` is declared true. `false` for events outside the slice.
    #[inline]
    pub fn contains(&self, event: EventId) -> bool {
        self.influences
            .iter()
            .position(|&id| id == event)
            .map_or(false, |bit| self.is_set(bit))
    }

    #[inline]
    pub(crate) fn is_set(&self, bit: usize) -> bool {
        self.mask & bit_mask(bit) != 0
    }

    pub fn influences(&self) -> &'a [EventId] {
        self.influences
    }

    /// The events declared true, in slice order.
    pub fn active(&self) -> impl Iterator<Item = EventId> + '_ {
        self.influences
            .iter()
            .enumerate()
            .filter(|(bit, _)| self.is_set(*bit))
            .map(|(_, &id)| id)
    }
}

/// `1 << bit`, or 0 when `bit` does not fit the mask.
#[inline]
fn bit_mask(bit: usize) -> u64 {
    u32::try_from(bit)
        .ok()
        .and_then(|bit| 1_u64.checked_shl(bit))
        .unwrap_or(0)
}

/// Probability of success once every direct influence has a concrete value.
pub trait FullConfigModel {
    /// Direct influences, in enumeration order.
    fn influences(&self) -> &[EventId];

    /// `P(success | config)`.
    fn success_given_full_config(&self, net: &BayesNet, config: &FullConfig<'_>) -> BigRational;

    /// `P(failure | config)`.
    fn failure_given_full_config(&self, net: &BayesNet, config: &FullConfig<'_>) -> BigRational {
        BigRational::one() - self.success_given_full_config(net, config)
    }
}

/// A binary event combining its influences with noisy-OR.
#[derive(Debug, Clone)]
pub struct BinaryEvent {
    pub(crate) id: EventId,
    pub(crate) name: Arc<str>,
    pub(crate) baseline: Probability,
    pub(crate) influences: Vec<Influence>,
    /// `influences[i].source`, kept alongside for enumeration.
    pub(crate) sources: Vec<EventId>,
}

impl BinaryEvent {
    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Probability of success when no influence is active.
    pub fn baseline(&self) -> &Probability {
        &self.baseline
    }

    pub fn influences(&self) -> &[Influence] {
        &self.influences
    }

    /// Weight of `source`, if it is a direct influence.
    pub fn weight_of(&self, source: EventId) -> Option<&Probability> {
        self.influences
            .iter()
            .find(|inf| inf.source == source)
            .map(|inf| &inf.weight)
    }
}

impl FullConfigModel for BinaryEvent {
    fn influences(&self) -> &[EventId] {
        &self.sources
    }

    fn failure_given_full_config(&self, _net: &BayesNet, config: &FullConfig<'_>) -> BigRational {
        self.influences
            .iter()
            .filter(|inf| config.contains(inf.source))
            .fold(self.baseline.complement().into_ratio(), |acc, inf| {
                acc * inf.weight.complement().into_ratio()
            })
    }

    fn success_given_full_config(&self, net: &BayesNet, config: &FullConfig<'_>) -> BigRational {
        BigRational::one() - self.failure_given_full_config(net, config)
    }
}

impl fmt::Display for BinaryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The conjunction of several events.
///
/// Members are assumed conditionally independent given a full configuration of
/// the union of their influences, so no member may directly influence another.
#[derive(Debug, Clone)]
pub struct JointEvent {
    pub(crate) id: EventId,
    pub(crate) name: Arc<str>,
    pub(crate) members: SmallVec<[EventId; 4]>,
    /// Union of the members' direct influences, first-seen order.
    pub(crate) influences: Vec<EventId>,
}

impl JointEvent {
    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[EventId] {
        &self.members
    }
}

impl FullConfigModel for JointEvent {
    fn influences(&self) -> &[EventId] {
        &self.influences
    }

    fn success_given_full_config(&self, net: &BayesNet, config: &FullConfig<'_>) -> BigRational {
        self.members
            .iter()
            .fold(BigRational::one(), |acc, &member| {
                acc * net.node_unchecked(member).success_given_full_config(net, config)
            })
    }
}

impl fmt::Display for JointEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// An event stored in a [`BayesNet`].
#[derive(Debug, Clone)]
pub enum EventNode {
    Binary(BinaryEvent),
    Joint(JointEvent),
}

impl EventNode {
    pub fn id(&self) -> EventId {
        match self {
            EventNode::Binary(event) => event.id,
            EventNode::Joint(joint) => joint.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            EventNode::Binary(event) => &event.name,
            EventNode::Joint(joint) => &joint.name,
        }
    }

    pub fn as_binary(&self) -> Option<&BinaryEvent> {
        match self {
            EventNode::Binary(event) => Some(event),
            EventNode::Joint(_) => None,
        }
    }

    pub fn as_joint(&self) -> Option<&JointEvent> {
        match self {
            EventNode::Binary(_) => None,
            EventNode::Joint(joint) => Some(joint),
        }
    }
}

impl FullConfigModel for EventNode {
    fn influences(&self) -> &[EventId] {
        match self {
            EventNode::Binary(event) => FullConfigModel::influences(event),
            EventNode::Joint(joint) => FullConfigModel::influences(joint),
        }
    }

    fn success_given_full_config(&self, net: &BayesNet, config: &FullConfig<'_>) -> BigRational {
        match self {
            EventNode::Binary(event) => event.success_given_full_config(net, config),
            EventNode::Joint(joint) => joint.success_given_full_config(net, config),
        }
    }

    fn failure_given_full_config(&self, net: &BayesNet, config: &FullConfig<'_>) -> BigRational {
        match self {
            EventNode::Binary(event) => event.failure_given_full_config(net, config),
            EventNode::Joint(joint) => joint.failure_given_full_config(net, config),
        }
    }
}

impl fmt::Display for EventNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventNode::Binary(event) => event.fmt(f),
            EventNode::Joint(joint) => joint.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(text: &str) -> Probability {
        Probability::from_decimal_str(text).expect("probability literal")
    }

    #[test]
    fn full_config_membership_follows_mask() {
        let slice = [EventId(4), EventId(7), EventId(9)];
        let config = FullConfig::new(&slice, 0b101);
        assert!(config.contains(EventId(4)));
        assert!(!config.contains(EventId(7)));
        assert!(config.contains(EventId(9)));
        assert!(!config.contains(EventId(1)));
        assert_eq!(config.active().collect::<Vec<_>>(), vec![EventId(4), EventId(9)]);
    }

    #[test]
    fn full_config_from_true_events_ignores_outsiders() {
        let slice = [EventId(0), EventId(1)];
        let config = FullConfig::from_true_events(&slice, &[EventId(1), EventId(5)]);
        assert!(!config.contains(EventId(0)));
        assert!(config.contains(EventId(1)));
        assert!(!config.contains(EventId(5)));
    }

    #[test]
    fn wide_slices_do_not_overflow_the_mask() {
        let slice: Vec<EventId> = (0..70).map(EventId).collect();
        let config = FullConfig::from_true_events(&slice, &[EventId(3), EventId(69)]);
        assert!(config.contains(EventId(3)));
        assert!(!config.contains(EventId(69)));
        assert!(!config.is_set(64));
        assert_eq!(config.active().collect::<Vec<_>>(), vec![EventId(3)]);
    }

    #[test]
    fn noisy_or_multiplies_failure_complements() {
        let mut net = BayesNet::new();
        let b = net.add_root_event("B", p("0.001")).expect("B");
        let e = net.add_root_event("E", p("0.002")).expect("E");
        let a = net
            .add_event("A", p("0.001"), [(b, p("0.99")), (e, p("0.01"))])
            .expect("A");
        let node = net.node(a).expect("A exists");
        let slice = FullConfigModel::influences(node).to_vec();

        let none = FullConfig::from_true_events(&slice, &[]);
        let only_b = FullConfig::from_true_events(&slice, &[b]);
        let both = FullConfig::from_true_events(&slice, &[b, e]);

        assert_eq!(node.failure_given_full_config(&net, &none), p("0.999").into_ratio());
        assert_eq!(
            node.failure_given_full_config(&net, &only_b),
            p("0.999").into_ratio() * p("0.01").into_ratio()
        );
        assert_eq!(
            node.failure_given_full_config(&net, &both),
            p("0.999").into_ratio() * p("0.01").into_ratio() * p("0.99").into_ratio()
        );
        assert_eq!(
            node.success_given_full_config(&net, &both),
            BigRational::one() - node.failure_given_full_config(&net, &both)
        );
    }

    #[test]
    fn joint_success_is_product_of_members() {
        let mut net = BayesNet::new();
        let a = net.add_root_event("A", p("0.3")).expect("A");
        let x = net.add_event("X", p("0.1"), [(a, p("0.5"))]).expect("X");
        let y = net.add_event("Y", p("0.2"), [(a, p("0.25"))]).expect("Y");
        let j = net.add_joint_event("XY", [x, y]).expect("joint");

        let joint = net.node(j).expect("joint exists");
        let slice = FullConfigModel::influences(joint).to_vec();
        assert_eq!(slice, vec![a]);

        for true_events in [vec![], vec![a]] {
            let config = FullConfig::from_true_events(&slice, &true_events);
            let expected = net.node_unchecked(x).success_given_full_config(&net, &config)
                * net.node_unchecked(y).success_given_full_config(&net, &config);
            assert_eq!(joint.success_given_full_config(&net, &config), expected);
            assert_eq!(
                joint.failure_given_full_config(&net, &config),
                BigRational::one() - expected
            );
        }
    }
}
