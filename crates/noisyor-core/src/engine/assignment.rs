//! Partial assignments: the conditioning side of a query.

use rustc_hash::FxHashMap;

use crate::engine::errors::ExecError;
use crate::engine::event::FullConfig;
use crate::engine::network::EventId;

/// Truth values for some events.
///
/// An event can hold one value only: inserting the opposite value for an
/// event already present is rejected, so an `Assignment` never contradicts
/// itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    values: FxHashMap<EventId, bool>,
}

impl Assignment {
    /// The empty assignment (an unconditional query).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an assignment from `(event, value)` pairs.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, ExecError>
    where
        I: IntoIterator<Item = (EventId, bool)>,
    {
        let mut assignment = Self::new();
        for (event, value) in pairs {
            assignment.insert(event, value)?;
        }
        Ok(assignment)
    }

    /// Requires `event` to be `value`. Re-inserting the same value is a no-op.
    pub fn insert(&mut self, event: EventId, value: bool) -> Result<(), ExecError> {
        match self.values.insert(event, value) {
            Some(previous) if previous != value => {
                self.values.insert(event, previous);
                Err(ExecError::ContradictoryAssignment { event })
            }
            _ => Ok(()),
        }
    }

    /// Builder form of [`Assignment::insert`].
    pub fn with(mut self, event: EventId, value: bool) -> Result<Self, ExecError> {
        self.insert(event, value)?;
        Ok(self)
    }

    pub fn get(&self, event: EventId) -> Option<bool> {
        self.values.get(&event).copied()
    }

    pub fn contains(&self, event: EventId) -> bool {
        self.values.contains_key(&event)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Pairs sorted by event for deterministic output.
    pub fn iter(&self) -> impl Iterator<Item = (EventId, bool)> {
        let mut pairs: Vec<_> = self.values.iter().map(|(&id, &v)| (id, v)).collect();
        pairs.sort_unstable_by_key(|(id, _)| *id);
        pairs.into_iter()
    }

    /// Whether `config` agrees with every assigned event it covers.
    ///
    /// Assigned events outside the configuration's influence slice are
    /// unconstrained by it and do not affect the result.
    pub fn is_compatible(&self, config: &FullConfig<'_>) -> bool {
        self.values
            .iter()
            .filter(|(id, _)| config.influences().contains(*id))
            .all(|(&id, &value)| config.contains(id) == value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: EventId = EventId(0);
    const B: EventId = EventId(1);
    const C: EventId = EventId(2);
    const OUTSIDE: EventId = EventId(9);

    #[test]
    fn conflicting_insert_is_rejected_and_keeps_first_value() {
        let mut assignment = Assignment::new();
        assignment.insert(A, true).expect("first");
        assignment.insert(A, true).expect("same value again");
        let err = assignment.insert(A, false).expect_err("conflict");
        assert!(matches!(err, ExecError::ContradictoryAssignment { event } if event == A));
        assert_eq!(assignment.get(A), Some(true));
        assert!(Assignment::from_pairs([(B, false), (B, true)]).is_err());
    }

    #[test]
    fn compatibility_matches_membership() {
        // X depends on A, B and C.
        let slice = [A, B, C];
        let ab = FullConfig::from_true_events(&slice, &[A, B]);
        let b = FullConfig::from_true_events(&slice, &[B]);
        let pairs = |p: &[(EventId, bool)]| Assignment::from_pairs(p.iter().copied()).expect("pairs");

        assert!(pairs(&[]).is_compatible(&ab));
        assert!(pairs(&[(A, true)]).is_compatible(&ab));
        assert!(!pairs(&[(A, true)]).is_compatible(&b));
        assert!(!pairs(&[(A, true), (B, true)]).is_compatible(&b));
        assert!(pairs(&[(B, true)]).is_compatible(&b));
        assert!(!pairs(&[(B, false)]).is_compatible(&b));
    }

    #[test]
    fn compatibility_ignores_events_outside_the_slice() {
        let slice = [A, B];
        let config = FullConfig::from_true_events(&slice, &[A]);
        let assignment = Assignment::from_pairs([(A, true), (OUTSIDE, true)]).expect("pairs");
        assert!(assignment.is_compatible(&config));
        let assignment = Assignment::from_pairs([(A, true), (OUTSIDE, false)]).expect("pairs");
        assert!(assignment.is_compatible(&config));
    }

    #[test]
    fn iteration_is_sorted() {
        let assignment = Assignment::new()
            .with(C, false)
            .and_then(|a| a.with(A, true))
            .expect("builder");
        assert_eq!(assignment.iter().collect::<Vec<_>>(), vec![(A, true), (C, false)]);
    }
}
