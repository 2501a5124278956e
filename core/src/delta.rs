use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::HabitDefinition;
use crate::validation::MetricValue;

/// One normalized data point destined for the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedEntry {
    /// ISO-8601 instant with seconds precision and zone offset
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub metrics: BTreeMap<String, MetricValue>,
}

/// Accumulated creation/logging mutations of a session, handed to the
/// persistence layer. Both sections are always present when serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputDelta {
    #[serde(default)]
    pub creation: BTreeMap<String, HabitDefinition>,
    #[serde(default)]
    pub logging: BTreeMap<String, Vec<LoggedEntry>>,
}

impl OutputDelta {
    pub fn is_empty(&self) -> bool {
        self.creation.is_empty() && self.logging.is_empty()
    }

    pub fn logged_entry_count(&self) -> usize {
        self.logging.values().map(Vec::len).sum()
    }

    pub(crate) fn record_creation(&mut self, habit: &str, definition: &HabitDefinition) {
        self.creation
            .entry(habit.to_string())
            .or_default()
            .absorb(definition);
    }

    pub(crate) fn record_log(&mut self, habit: &str, entry: LoggedEntry) {
        self.logging.entry(habit.to_string()).or_default().push(entry);
    }

    /// Fold a later delta into this one: creation records merge per habit,
    /// logged entries append after the existing ones.
    pub fn merge(&self, later: &OutputDelta) -> OutputDelta {
        let mut merged = self.clone();
        for (habit, definition) in &later.creation {
            merged.record_creation(habit, definition);
        }
        for (habit, entries) in &later.logging {
            merged
                .logging
                .entry(habit.clone())
                .or_default()
                .extend(entries.iter().cloned());
        }
        merged
    }
}
