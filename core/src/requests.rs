use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request to create a habit, or to extend an existing one with new metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitCreationRequest {
    /// Habit name, globally unique
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Habit goal/objective
    #[serde(default)]
    pub goal: Option<String>,
    /// Metrics to track under this habit (may be empty)
    #[serde(default)]
    pub metrics: Vec<MetricCreationRequest>,
}

/// A metric to be created. `input` stays a raw literal so an unsupported kind
/// is reported as a validation error instead of a deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricCreationRequest {
    /// Metric name, unique within its habit
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Input kind literal: slider, text, form, time or rating
    #[serde(alias = "input_type")]
    pub input: String,
    /// Kind-specific config (slider bounds, form options)
    #[serde(default)]
    pub config: Option<Value>,
}

/// A data point for an existing habit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntryRequest {
    /// Name of the habit being logged
    pub name: String,
    /// Time reference ("this afternoon", an ISO timestamp, ...). Empty means now.
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub metrics: Vec<LoggedMetricRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggedMetricRequest {
    #[serde(alias = "metric_name")]
    pub name: String,
    pub value: Value,
}

/// Arguments of the `create_habit` tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreationBatch {
    pub creation: Vec<HabitCreationRequest>,
}

/// Arguments of the `insert_habit_data` tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingBatch {
    pub logging: Vec<LogEntryRequest>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn creation_request_defaults_optional_fields() {
        let batch: CreationBatch = serde_json::from_value(json!({
            "creation": [{ "name": "Reading", "metrics": [{ "name": "Pages", "input": "slider" }] }]
        }))
        .unwrap();

        let habit = &batch.creation[0];
        assert_eq!(habit.description, None);
        assert_eq!(habit.metrics[0].config, None);
    }

    #[test]
    fn logging_request_accepts_metric_name_alias_and_null_timestamp() {
        let batch: LoggingBatch = serde_json::from_value(json!({
            "logging": [{
                "name": "Reading",
                "timestamp": null,
                "metrics": [{ "metric_name": "Pages", "value": 30 }]
            }]
        }))
        .unwrap();

        let entry = &batch.logging[0];
        assert_eq!(entry.timestamp, None);
        assert_eq!(entry.metrics[0].name, "Pages");
        assert_eq!(entry.metrics[0].value, json!(30));
    }
}
