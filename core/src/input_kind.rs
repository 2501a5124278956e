use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EngineError;
use crate::validation::{self, Config, MetricValue};

/// Creation-time config validator: raw config object in, typed config out.
pub type ConfigValidator = fn(Option<&Value>) -> Result<Config, EngineError>;

/// Logging-time value validator: raw value plus the stored config in,
/// normalized value out.
pub type ValueValidator = fn(&Value, &Config) -> Result<MetricValue, EngineError>;

/// The closed set of UI/value semantics a metric can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Slider,
    Text,
    Form,
    Time,
    Rating,
}

impl InputKind {
    pub const ALL: [InputKind; 5] = [
        InputKind::Slider,
        InputKind::Text,
        InputKind::Form,
        InputKind::Time,
        InputKind::Rating,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Slider => "slider",
            Self::Text => "text",
            Self::Form => "form",
            Self::Time => "time",
            Self::Rating => "rating",
        }
    }

    /// Expected input, phrased for the agent.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Slider => "an int or float between the configured min and max",
            Self::Text => "any text string",
            Self::Form => "one or more of the configured options as 'option1;option2;...'",
            Self::Time => "a time or duration in format HH:MM:SS",
            Self::Rating => "an integer from 1 to 5",
        }
    }

    /// Config shape expected at creation time.
    pub const fn config_hint(self) -> &'static str {
        match self {
            Self::Slider => {
                "slider config requires {\"min\": number, \"max\": number, \"numericType\": \"int\"|\"float\"} with min < max <= 10000000"
            }
            Self::Form => "form config requires {\"options\": [2 to 10 unique strings]}",
            Self::Text | Self::Time | Self::Rating => "this input kind takes no config",
        }
    }

    /// One `literal: description` line per kind, for tool schemas.
    pub fn docs() -> String {
        Self::ALL
            .iter()
            .map(|kind| format!("{}: {}", kind.as_str(), kind.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputKind {
    type Err = EngineError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| EngineError::UnsupportedKind {
                received: raw.to_string(),
            })
    }
}

/// Validator pair registered for one input kind.
#[derive(Clone, Copy)]
pub struct KindHandlers {
    pub kind: InputKind,
    pub validate_config: ConfigValidator,
    pub validate_value: ValueValidator,
}

impl fmt::Debug for KindHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindHandlers").field("kind", &self.kind).finish()
    }
}

/// Registry lookup for a typed kind. Exhaustive over the closed enum, so a new
/// variant cannot be added without registering its validators.
pub fn handlers(kind: InputKind) -> KindHandlers {
    let (validate_config, validate_value): (ConfigValidator, ValueValidator) = match kind {
        InputKind::Slider => (
            validation::validate_slider_config,
            validation::validate_slider_value,
        ),
        InputKind::Text => (validation::validate_empty_config, validation::validate_text_value),
        InputKind::Form => (validation::validate_form_config, validation::validate_form_value),
        InputKind::Time => (validation::validate_empty_config, validation::validate_time_value),
        InputKind::Rating => (
            validation::validate_empty_config,
            validation::validate_rating_value,
        ),
    };
    KindHandlers {
        kind,
        validate_config,
        validate_value,
    }
}

/// Registry lookup for a wire literal (`"slider"`, `"form"`, ...).
pub fn resolve(literal: &str) -> Result<KindHandlers, EngineError> {
    literal.parse::<InputKind>().map(handlers)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn resolve_accepts_every_literal() {
        for kind in InputKind::ALL {
            let resolved = resolve(kind.as_str()).unwrap();
            assert_eq!(resolved.kind, kind);
        }
        assert_eq!(resolve(" Slider ").unwrap().kind, InputKind::Slider);
    }

    #[test]
    fn resolve_rejects_unknown_literal() {
        let err = resolve("plus_n").unwrap_err();
        assert_eq!(
            err,
            EngineError::UnsupportedKind {
                received: "plus_n".to_string()
            }
        );
    }

    #[test]
    fn kind_serializes_as_lowercase_literal() {
        assert_eq!(serde_json::to_value(InputKind::Rating).unwrap(), json!("rating"));
        let kind: InputKind = serde_json::from_value(json!("form")).unwrap();
        assert_eq!(kind, InputKind::Form);
    }

    #[test]
    fn docs_list_every_kind() {
        let docs = InputKind::docs();
        assert_eq!(docs.lines().count(), InputKind::ALL.len());
        assert!(docs.starts_with("slider: "));
        assert!(docs.contains("time: a time or duration in format HH:MM:SS"));
    }

    #[test]
    fn registered_validators_dispatch_by_kind() {
        let rating = handlers(InputKind::Rating);
        let config = (rating.validate_config)(None).unwrap();
        assert!((rating.validate_value)(&json!(4), &config).is_ok());
        assert!((rating.validate_value)(&json!(9), &config).is_err());
    }
}
