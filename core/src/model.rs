use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::input_kind::InputKind;
use crate::validation::Config;

/// A metric as it exists in the store: created once, config immutable after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Input kind literal (`slider`, `text`, `form`, `time`, `rating`)
    #[serde(alias = "input_type")]
    pub input: InputKind,
    pub config: Config,
}

impl MetricDefinition {
    pub fn spec(&self) -> MetricSpec {
        MetricSpec {
            input_kind: self.input,
            config: self.config.clone(),
        }
    }
}

/// A habit and the metrics tracked under it. This is both the snapshot shape
/// read from the store and the creation record written to the output delta.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HabitDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(default)]
    pub metrics: BTreeMap<String, MetricDefinition>,
}

impl HabitDefinition {
    pub fn new(description: Option<String>, goal: Option<String>) -> Self {
        Self {
            description,
            goal,
            metrics: BTreeMap::new(),
        }
    }

    /// Fold `other` into `self`: metrics are added, description and goal are
    /// overwritten only when `other` carries them.
    pub fn absorb(&mut self, other: &HabitDefinition) {
        if other.description.is_some() {
            self.description.clone_from(&other.description);
        }
        if other.goal.is_some() {
            self.goal.clone_from(&other.goal);
        }
        for (name, metric) in &other.metrics {
            self.metrics.insert(name.clone(), metric.clone());
        }
    }
}

/// Input kind and config captured at creation time, used to validate logs.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSpec {
    pub input_kind: InputKind,
    pub config: Config,
}

/// `(habit name, metric name)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricKey {
    pub habit: String,
    pub metric: String,
}

impl MetricKey {
    pub fn new(habit: impl Into<String>, metric: impl Into<String>) -> Self {
        Self {
            habit: habit.into(),
            metric: metric.into(),
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.habit, self.metric)
    }
}
