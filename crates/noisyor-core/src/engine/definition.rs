//! Declarative network definitions (JSON).
//!
//! ```json
//! {
//!   "events": [
//!     { "name": "Earthquake", "baseline": "0.001" },
//!     { "name": "Alarm", "baseline": "0.001",
//!       "influences": { "Burglar": "0.99", "Earthquake": "0.01" } }
//!   ],
//!   "joints": [ { "name": "Calls", "members": ["John", "Mary"] } ],
//!   "queries": [ { "label": "alarm_given_burglar", "event": "Alarm",
//!                  "given": { "Burglar": true } } ],
//!   "posteriors": [ { "label": "burglar_given_calls", "cause": "Burglar", "evidence": "Calls" } ]
//! }
//! ```
//!
//! Events must appear after every event they reference. Probabilities are
//! strings read exactly (`"0.001"`, `"1/3"`) or JSON numbers read as `f64`.
//! A key repeated inside `influences` or `given` is a parse error.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::engine::assignment::Assignment;
use crate::engine::errors::ExecError;
use crate::engine::inference::InferenceConfig;
use crate::engine::network::{BayesNet, EventId};
use crate::engine::probability::Probability;

/// A probability as written in a definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProbabilityValue {
    /// Decimal or rational text, read exactly.
    Exact(String),
    /// A JSON number, read as its `f64` value.
    Float(f64),
}

impl Default for ProbabilityValue {
    fn default() -> Self {
        ProbabilityValue::Exact("0".into())
    }
}

impl ProbabilityValue {
    pub fn to_probability(&self) -> Result<Probability, ExecError> {
        match self {
            ProbabilityValue::Exact(text) => Probability::from_decimal_str(text),
            ProbabilityValue::Float(value) => Probability::from_f64(*value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventDefinition {
    pub name: String,
    #[serde(default)]
    pub baseline: ProbabilityValue,
    #[serde(default, deserialize_with = "serde_helpers::unique_keys")]
    pub influences: BTreeMap<String, ProbabilityValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JointDefinition {
    /// Defaults to `Joint(a, b, ...)`.
    #[serde(default)]
    pub name: Option<String>,
    pub members: Vec<String>,
}

/// `P(event = outcome | given)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryDefinition {
    pub label: String,
    pub event: String,
    #[serde(default, deserialize_with = "serde_helpers::unique_keys")]
    pub given: BTreeMap<String, bool>,
    #[serde(default = "default_outcome")]
    pub outcome: bool,
}

fn default_outcome() -> bool {
    true
}

/// `P(cause = 1 | evidence = 1)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PosteriorDefinition {
    pub label: String,
    pub cause: String,
    pub evidence: String,
}

/// A whole network plus the questions to ask it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkDefinition {
    pub events: Vec<EventDefinition>,
    #[serde(default)]
    pub joints: Vec<JointDefinition>,
    #[serde(default)]
    pub queries: Vec<QueryDefinition>,
    #[serde(default)]
    pub posteriors: Vec<PosteriorDefinition>,
}

/// One evaluated query or posterior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub label: String,
    pub probability: f64,
}

/// A built network with its name table.
#[derive(Debug, Clone)]
pub struct LoadedNetwork {
    pub net: BayesNet,
    names: FxHashMap<String, EventId>,
}

impl NetworkDefinition {
    pub fn from_json_str(text: &str) -> Result<Self, ExecError> {
        serde_json::from_str(text).map_err(|err| ExecError::ParseError(err.to_string()))
    }

    pub fn to_json_string(&self) -> Result<String, ExecError> {
        serde_json::to_string_pretty(self).map_err(|err| ExecError::Internal(err.to_string()))
    }

    /// Builds the network with the default [`InferenceConfig`].
    pub fn build(&self) -> Result<LoadedNetwork, ExecError> {
        self.build_with_config(InferenceConfig::default())
    }

    pub fn build_with_config(&self, config: InferenceConfig) -> Result<LoadedNetwork, ExecError> {
        let mut loaded = LoadedNetwork {
            net: BayesNet::with_config(config)?,
            names: FxHashMap::default(),
        };

        for event in &self.events {
            let baseline = event
                .baseline
                .to_probability()
                .map_err(|err| in_context(err, &format!("baseline of '{}'", event.name)))?;
            let mut influences = Vec::with_capacity(event.influences.len());
            for (source, weight) in &event.influences {
                let source_id = loaded.lookup(source).map_err(|_| {
                    ExecError::ValidationError(format!(
                        "event '{}' references '{}', which is not declared before it",
                        event.name, source
                    ))
                })?;
                let weight = weight.to_probability().map_err(|err| {
                    in_context(err, &format!("weight of '{}' on '{}'", source, event.name))
                })?;
                influences.push((source_id, weight));
            }
            let id = loaded
                .net
                .add_event(event.name.as_str(), baseline, influences)?;
            loaded.register(&event.name, id)?;
        }

        for joint in &self.joints {
            let members = joint
                .members
                .iter()
                .map(|member| loaded.lookup(member))
                .collect::<Result<Vec<_>, _>>()?;
            let name = joint
                .name
                .clone()
                .unwrap_or_else(|| format!("Joint({})", joint.members.join(", ")));
            let id = loaded.net.add_joint_event(name.as_str(), members)?;
            loaded.register(&name, id)?;
        }

        Ok(loaded)
    }
}

impl LoadedNetwork {
    /// Resolves a declared name.
    pub fn lookup(&self, name: &str) -> Result<EventId, ExecError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| ExecError::ValidationError(format!("unknown event '{}'", name)))
    }

    /// Runs every query, then every posterior, in definition order.
    pub fn evaluate(&self, definition: &NetworkDefinition) -> Result<Vec<QueryOutcome>, ExecError> {
        let mut outcomes = Vec::with_capacity(definition.queries.len() + definition.posteriors.len());

        for query in &definition.queries {
            let event = self.lookup(&query.event)?;
            let mut given = Assignment::new();
            for (name, &value) in &query.given {
                given.insert(self.lookup(name)?, value)?;
            }
            let probability = if query.outcome {
                self.net.probability_true(event, &given)?
            } else {
                self.net.probability_false(event, &given)?
            };
            outcomes.push(QueryOutcome {
                label: query.label.clone(),
                probability,
            });
        }

        for posterior in &definition.posteriors {
            let cause = self.lookup(&posterior.cause)?;
            let evidence = self.lookup(&posterior.evidence)?;
            outcomes.push(QueryOutcome {
                label: posterior.label.clone(),
                probability: self.net.posterior_f64(cause, evidence)?,
            });
        }

        Ok(outcomes)
    }

    fn register(&mut self, name: &str, id: EventId) -> Result<(), ExecError> {
        if self.names.insert(name.to_owned(), id).is_some() {
            return Err(ExecError::ValidationError(format!(
                "event name '{}' is declared more than once",
                name
            )));
        }
        Ok(())
    }
}

fn in_context(err: ExecError, what: &str) -> ExecError {
    match err {
        ExecError::ParseError(msg) => ExecError::ParseError(format!("{}: {}", what, msg)),
        ExecError::ValidationError(msg) => ExecError::ValidationError(format!("{}: {}", what, msg)),
        ExecError::Numerical(msg) => ExecError::Numerical(format!("{}: {}", what, msg)),
        other => other,
    }
}

mod serde_helpers {
    use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
    use std::collections::btree_map::Entry;
    use std::collections::BTreeMap;
    use std::fmt;
    use std::marker::PhantomData;

    /// A string-keyed map that fails on repeated keys instead of keeping the last.
    pub fn unique_keys<'de, V, D>(deserializer: D) -> Result<BTreeMap<String, V>, D::Error>
    where
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        struct UniqueKeys<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for UniqueKeys<V> {
            type Value = BTreeMap<String, V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map with unique keys")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut map = BTreeMap::new();
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    match map.entry(key) {
                        Entry::Occupied(entry) => {
                            return Err(de::Error::custom(format!(
                                "duplicate key '{}'",
                                entry.key()
                            )));
                        }
                        Entry::Vacant(entry) => {
                            entry.insert(value);
                        }
                    }
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(UniqueKeys(PhantomData))
    }
}
