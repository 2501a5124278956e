use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::input_kind::InputKind;

/// Structured error record handed back to the agent loop.
/// Every error carries enough information for a language model to understand
/// what went wrong and retry the tool call with corrected arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentError {
    /// Machine-readable error code (see [`codes`])
    pub error: String,
    /// Human/agent-readable description of what went wrong
    pub message: String,
    /// Location of the offending argument, e.g. `logging[0].metrics[1].value`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// The value that was received
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<Value>,
    /// Hint about what a correct call looks like
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_hint: Option<String>,
    /// Bounds, allowed options or available names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Error codes shared by the engine and the tool surface
pub mod codes {
    pub const UNSUPPORTED_KIND: &str = "unsupported_kind";
    pub const INVALID_CONFIG: &str = "invalid_config";
    pub const INVALID_VALUE: &str = "invalid_value";
    pub const DUPLICATE_METRIC: &str = "duplicate_metric";
    pub const DUPLICATE_METRIC_IN_ENTRY: &str = "duplicate_metric_in_entry";
    pub const UNKNOWN_HABIT: &str = "unknown_habit";
    pub const UNKNOWN_METRIC: &str = "unknown_metric";
    pub const INVALID_ARGUMENTS: &str = "invalid_arguments";
}

/// The constraint a rejected value was checked against.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueBound {
    Range { min: f64, max: f64 },
    Options { options: Vec<String> },
    Pattern { pattern: &'static str },
    ExpectedType { expected: &'static str },
}

impl ValueBound {
    fn describe(&self) -> String {
        match self {
            ValueBound::Range { min, max } => format!("between {min} and {max}"),
            ValueBound::Options { options } => format!("among [{}]", options.join(", ")),
            ValueBound::Pattern { pattern } => format!("matching {pattern}"),
            ValueBound::ExpectedType { expected } => format!("of type {expected}"),
        }
    }
}

/// Validation failures raised by the registry, the validators, the context
/// model and the merge engine. All of them are recoverable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("input kind '{received}' is not supported")]
    UnsupportedKind { received: String },

    #[error("invalid {kind} config: {message}")]
    InvalidConfig {
        kind: InputKind,
        field: Option<&'static str>,
        message: String,
        received: Option<Value>,
    },

    #[error("invalid {kind} value {received}: {message}")]
    InvalidValue {
        kind: InputKind,
        received: Value,
        message: String,
        bound: ValueBound,
    },

    #[error("metric '{metric}' already exists for habit '{habit}'")]
    DuplicateMetric { habit: String, metric: String },

    #[error("metric '{metric}' appears more than once in the same log entry for habit '{habit}'")]
    DuplicateMetricInEntry { habit: String, metric: String },

    #[error("habit '{habit}' not found")]
    UnknownHabit {
        habit: String,
        available: Vec<String>,
        suggestion: Option<String>,
    },

    #[error("metric '{metric}' not found for habit '{habit}'")]
    UnknownMetric {
        habit: String,
        metric: String,
        available: Vec<String>,
        suggestion: Option<String>,
    },
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::UnsupportedKind { .. } => codes::UNSUPPORTED_KIND,
            EngineError::InvalidConfig { .. } => codes::INVALID_CONFIG,
            EngineError::InvalidValue { .. } => codes::INVALID_VALUE,
            EngineError::DuplicateMetric { .. } => codes::DUPLICATE_METRIC,
            EngineError::DuplicateMetricInEntry { .. } => codes::DUPLICATE_METRIC_IN_ENTRY,
            EngineError::UnknownHabit { .. } => codes::UNKNOWN_HABIT,
            EngineError::UnknownMetric { .. } => codes::UNKNOWN_METRIC,
        }
    }

    pub(crate) fn invalid_config(
        kind: InputKind,
        field: Option<&'static str>,
        message: impl Into<String>,
        received: Option<Value>,
    ) -> Self {
        EngineError::InvalidConfig {
            kind,
            field,
            message: message.into(),
            received,
        }
    }

    pub(crate) fn invalid_value(
        kind: InputKind,
        received: &Value,
        message: impl Into<String>,
        bound: ValueBound,
    ) -> Self {
        EngineError::InvalidValue {
            kind,
            received: received.clone(),
            message: message.into(),
            bound,
        }
    }

    /// Render the error for the agent. `location` is the path of the request
    /// item the error belongs to (e.g. `creation[0].metrics[2]`).
    pub fn to_agent_error(&self, location: Option<&str>) -> AgentError {
        let join = |suffix: &str| match location {
            Some(base) if suffix.is_empty() => Some(base.to_string()),
            Some(base) => Some(format!("{base}.{suffix}")),
            None if suffix.is_empty() => None,
            None => Some(suffix.to_string()),
        };

        let (field, received, docs_hint, details) = match self {
            EngineError::UnsupportedKind { received } => (
                join("input"),
                Some(Value::String(received.clone())),
                Some(format!(
                    "input must be one of: {}",
                    InputKind::ALL
                        .iter()
                        .map(|kind| kind.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )),
                None,
            ),
            EngineError::InvalidConfig {
                kind,
                field,
                received,
                ..
            } => (
                join(&field.map(|f| format!("config.{f}")).unwrap_or_else(|| "config".to_string())),
                received.clone(),
                Some(kind.config_hint().to_string()),
                None,
            ),
            EngineError::InvalidValue {
                kind,
                received,
                bound,
                ..
            } => (
                join("value"),
                Some(received.clone()),
                Some(format!("{} expects {}", kind.as_str(), kind.description())),
                serde_json::to_value(bound).ok(),
            ),
            EngineError::DuplicateMetric { metric, .. } => (
                join("name"),
                Some(Value::String(metric.clone())),
                Some("Choose a different but similar metric name.".to_string()),
                None,
            ),
            EngineError::DuplicateMetricInEntry { metric, .. } => (
                join("name"),
                Some(Value::String(metric.clone())),
                Some(
                    "Split the values into multiple log entries for the same habit."
                        .to_string(),
                ),
                None,
            ),
            EngineError::UnknownHabit {
                habit,
                available,
                suggestion,
            } => (
                join("name"),
                Some(Value::String(habit.clone())),
                Some(unknown_name_hint("habit", suggestion.as_deref())),
                Some(json!({ "available": available })),
            ),
            EngineError::UnknownMetric {
                metric,
                available,
                suggestion,
                ..
            } => (
                join("name"),
                Some(Value::String(metric.clone())),
                Some(unknown_name_hint("metric", suggestion.as_deref())),
                Some(json!({ "available": available })),
            ),
        };

        let message = match self {
            EngineError::InvalidValue { kind, bound, .. } => {
                format!("{self}; {} values must be {}", kind.as_str(), bound.describe())
            }
            _ => self.to_string(),
        };

        AgentError {
            error: self.code().to_string(),
            message,
            field,
            received,
            docs_hint,
            details,
        }
    }
}

fn unknown_name_hint(what: &str, suggestion: Option<&str>) -> String {
    match suggestion {
        Some(name) => format!("Did you mean '{name}'? Only existing {what} names can be logged."),
        None => format!("Only existing {what} names can be logged; create it first."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_renders_bound_and_path() {
        let err = EngineError::invalid_value(
            InputKind::Form,
            &json!("A;D"),
            "'D' is not an allowed option",
            ValueBound::Options {
                options: vec!["A".into(), "B".into(), "C".into()],
            },
        );
        let agent = err.to_agent_error(Some("logging[0].metrics[1]"));

        assert_eq!(agent.error, codes::INVALID_VALUE);
        assert_eq!(agent.field.as_deref(), Some("logging[0].metrics[1].value"));
        assert_eq!(agent.received, Some(json!("A;D")));
        assert!(agent.message.contains("among [A, B, C]"));
        assert_eq!(
            agent.details,
            Some(json!({ "kind": "options", "options": ["A", "B", "C"] }))
        );
    }

    #[test]
    fn unknown_habit_lists_available_names_and_suggestion() {
        let err = EngineError::UnknownHabit {
            habit: "Runing".into(),
            available: vec!["Reading".into(), "Running".into()],
            suggestion: Some("Running".into()),
        };
        let agent = err.to_agent_error(Some("logging[0]"));

        assert_eq!(agent.error, codes::UNKNOWN_HABIT);
        assert_eq!(agent.field.as_deref(), Some("logging[0].name"));
        assert!(agent.docs_hint.unwrap().contains("'Running'"));
        assert_eq!(
            agent.details,
            Some(json!({ "available": ["Reading", "Running"] }))
        );
    }

    #[test]
    fn config_error_points_at_config_field() {
        let err = EngineError::invalid_config(
            InputKind::Slider,
            Some("max"),
            "max cannot exceed 10000000",
            Some(json!(20_000_000)),
        );
        let agent = err.to_agent_error(Some("creation[0].metrics[0]"));
        assert_eq!(agent.field.as_deref(), Some("creation[0].metrics[0].config.max"));
        assert_eq!(agent.error, codes::INVALID_CONFIG);
    }

    #[test]
    fn serialized_agent_error_omits_missing_fields() {
        let err = EngineError::DuplicateMetric {
            habit: "Running".into(),
            metric: "Distance".into(),
        };
        let value = serde_json::to_value(err.to_agent_error(None)).unwrap();
        assert_eq!(value["field"], json!("name"));
        assert!(value.get("details").is_none());
    }
}
