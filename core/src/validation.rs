//! Per-kind config validators (creation time) and value validators (logging time).
//!
//! Every function here is pure. The registry in [`crate::input_kind`] picks the
//! pair that belongs to a metric's input kind.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{EngineError, ValueBound};
use crate::input_kind::InputKind;

/// Absolute cap for a slider's `max`.
pub const VALUE_CAP: f64 = 10_000_000.0;
pub const MIN_FORM_OPTIONS: usize = 2;
pub const MAX_FORM_OPTIONS: usize = 10;
pub const FORM_DELIMITER: char = ';';
const FORM_SEPARATOR: &str = ";";
pub const RATING_MIN: i64 = 1;
pub const RATING_MAX: i64 = 5;

const TIME_FORMAT: &str = "HH:MM:SS";

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]:[0-5][0-9]$").expect("time regex must compile")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericType {
    Int,
    Float,
}

impl NumericType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "int" | "integer" => Some(Self::Int),
            "float" | "number" => Some(Self::Float),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliderConfig {
    #[serde(serialize_with = "serialize_bound")]
    pub min: f64,
    #[serde(serialize_with = "serialize_bound")]
    pub max: f64,
    #[serde(rename = "numericType", alias = "numeric_type", alias = "type")]
    pub numeric_type: NumericType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormConfig {
    /// Allowed options in canonical order.
    #[serde(alias = "boxes")]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyConfig {}

/// Kind-specific parameters constraining a metric's values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Config {
    Slider(SliderConfig),
    Form(FormConfig),
    Empty(EmptyConfig),
}

impl Config {
    pub const fn empty() -> Self {
        Config::Empty(EmptyConfig {})
    }

    /// Short rendering used in context descriptions, `None` for config-less kinds.
    pub fn summary(&self) -> Option<String> {
        match self {
            Config::Slider(slider) => Some(format!(
                "{}..{} {}",
                slider.min,
                slider.max,
                slider.numeric_type.as_str()
            )),
            Config::Form(form) => Some(format!("Options: [{}]", form.options.join(", "))),
            Config::Empty(_) => None,
        }
    }
}

/// A value accepted at logging time, already coerced to the metric's type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
    Text(String),
}

fn serialize_bound<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

fn config_object(kind: InputKind, raw: Option<&Value>) -> Result<&Map<String, Value>, EngineError> {
    match raw {
        Some(Value::Object(map)) => Ok(map),
        None | Some(Value::Null) => Err(EngineError::invalid_config(
            kind,
            None,
            "config is required",
            None,
        )),
        Some(other) => Err(EngineError::invalid_config(
            kind,
            None,
            "config must be an object",
            Some(other.clone()),
        )),
    }
}

fn first_key<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| map.get(*key)).filter(|v| !v.is_null())
}

fn required_bound(
    map: &Map<String, Value>,
    field: &'static str,
) -> Result<f64, EngineError> {
    match map.get(field) {
        None | Some(Value::Null) => Err(EngineError::invalid_config(
            InputKind::Slider,
            Some(field),
            format!("{field} is required"),
            None,
        )),
        Some(value) => value
            .as_f64()
            .filter(|n| n.is_finite())
            .ok_or_else(|| {
                EngineError::invalid_config(
                    InputKind::Slider,
                    Some(field),
                    format!("{field} must be a number"),
                    Some(value.clone()),
                )
            }),
    }
}

pub fn validate_slider_config(raw: Option<&Value>) -> Result<Config, EngineError> {
    let map = config_object(InputKind::Slider, raw)?;
    let mut min = required_bound(map, "min")?;
    let mut max = required_bound(map, "max")?;

    let numeric_type = match first_key(map, &["numericType", "numeric_type", "type"]) {
        None => {
            return Err(EngineError::invalid_config(
                InputKind::Slider,
                Some("numericType"),
                "numericType is required",
                None,
            ));
        }
        Some(value) => value.as_str().and_then(NumericType::parse).ok_or_else(|| {
            EngineError::invalid_config(
                InputKind::Slider,
                Some("numericType"),
                "numericType must be \"int\" or \"float\"",
                Some(value.clone()),
            )
        })?,
    };

    if numeric_type == NumericType::Int {
        for (field, bound) in [("min", min), ("max", max)] {
            if bound.fract() != 0.0 {
                return Err(EngineError::invalid_config(
                    InputKind::Slider,
                    Some(field),
                    format!("{field} must be a whole number for an int slider"),
                    map.get(field).cloned(),
                ));
            }
        }
    }
    if min > max {
        std::mem::swap(&mut min, &mut max);
    }
    if min == max {
        return Err(EngineError::invalid_config(
            InputKind::Slider,
            Some("max"),
            "min and max cannot be equal",
            Some(serde_json::json!({ "min": min, "max": max })),
        ));
    }
    if max > VALUE_CAP {
        return Err(EngineError::invalid_config(
            InputKind::Slider,
            Some("max"),
            format!("max cannot exceed {}", VALUE_CAP as i64),
            map.get("max").cloned(),
        ));
    }

    Ok(Config::Slider(SliderConfig {
        min,
        max,
        numeric_type,
    }))
}

pub fn validate_form_config(raw: Option<&Value>) -> Result<Config, EngineError> {
    let map = config_object(InputKind::Form, raw)?;
    let items = match first_key(map, &["options", "boxes"]) {
        None => {
            return Err(EngineError::invalid_config(
                InputKind::Form,
                Some("options"),
                "options are required",
                None,
            ));
        }
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(EngineError::invalid_config(
                InputKind::Form,
                Some("options"),
                "options must be a list of strings",
                Some(other.clone()),
            ));
        }
    };

    let mut options: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let option = item.as_str().map(str::trim).ok_or_else(|| {
            EngineError::invalid_config(
                InputKind::Form,
                Some("options"),
                "options must be a list of strings",
                Some(item.clone()),
            )
        })?;
        if option.is_empty() {
            return Err(EngineError::invalid_config(
                InputKind::Form,
                Some("options"),
                "options cannot be empty strings",
                Some(item.clone()),
            ));
        }
        if option.contains(FORM_DELIMITER) {
            return Err(EngineError::invalid_config(
                InputKind::Form,
                Some("options"),
                format!("options cannot contain '{FORM_DELIMITER}'"),
                Some(item.clone()),
            ));
        }
        if options.iter().any(|existing| existing == option) {
            return Err(EngineError::invalid_config(
                InputKind::Form,
                Some("options"),
                format!("option '{option}' is listed more than once"),
                Some(item.clone()),
            ));
        }
        options.push(option.to_string());
    }

    if !(MIN_FORM_OPTIONS..=MAX_FORM_OPTIONS).contains(&options.len()) {
        return Err(EngineError::invalid_config(
            InputKind::Form,
            Some("options"),
            format!(
                "form needs between {MIN_FORM_OPTIONS} and {MAX_FORM_OPTIONS} options, got {}",
                options.len()
            ),
            Some(Value::Array(items.clone())),
        ));
    }

    Ok(Config::Form(FormConfig { options }))
}

/// Text, time and rating take no config; anything supplied is discarded.
pub fn validate_empty_config(_raw: Option<&Value>) -> Result<Config, EngineError> {
    Ok(Config::empty())
}

fn mismatched_config(kind: InputKind, config: &Config) -> EngineError {
    EngineError::invalid_config(
        kind,
        None,
        "stored config does not match the metric's input kind",
        serde_json::to_value(config).ok(),
    )
}

pub fn validate_slider_value(raw: &Value, config: &Config) -> Result<MetricValue, EngineError> {
    let Config::Slider(slider) = config else {
        return Err(mismatched_config(InputKind::Slider, config));
    };
    let bound = ValueBound::Range {
        min: slider.min,
        max: slider.max,
    };

    let value = raw.as_f64().ok_or_else(|| {
        EngineError::invalid_value(
            InputKind::Slider,
            raw,
            format!("value must be a {}", slider.numeric_type.as_str()),
            bound.clone(),
        )
    })?;
    if value < slider.min || value > slider.max {
        return Err(EngineError::invalid_value(
            InputKind::Slider,
            raw,
            "value is out of range",
            bound,
        ));
    }

    match slider.numeric_type {
        NumericType::Int => {
            let coerced = match raw.as_i64() {
                Some(exact) => exact,
                None => truncate_to_i64(value).ok_or_else(|| {
                    EngineError::invalid_value(
                        InputKind::Slider,
                        raw,
                        "value does not fit an int",
                        bound.clone(),
                    )
                })?,
            };
            // stored configs may carry fractional bounds the truncation steps past
            if (coerced as f64) < slider.min || (coerced as f64) > slider.max {
                return Err(EngineError::invalid_value(
                    InputKind::Slider,
                    raw,
                    format!("value truncates to {coerced}, which is out of range"),
                    bound,
                ));
            }
            Ok(MetricValue::Int(coerced))
        }
        NumericType::Float => Ok(MetricValue::Float(value)),
    }
}

/// Truncate toward zero, `None` outside the i64 range.
fn truncate_to_i64(value: f64) -> Option<i64> {
    let truncated = value.trunc();
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range
    (truncated >= i64::MIN as f64 && truncated < i64::MAX as f64).then_some(truncated as i64)
}

pub fn validate_text_value(raw: &Value, _config: &Config) -> Result<MetricValue, EngineError> {
    raw.as_str()
        .map(|text| MetricValue::Text(text.to_string()))
        .ok_or_else(|| {
            EngineError::invalid_value(
                InputKind::Text,
                raw,
                "value must be a string",
                ValueBound::ExpectedType { expected: "string" },
            )
        })
}

pub fn validate_form_value(raw: &Value, config: &Config) -> Result<MetricValue, EngineError> {
    let Config::Form(form) = config else {
        return Err(mismatched_config(InputKind::Form, config));
    };
    if form.options.is_empty() || form.options.len() > MAX_FORM_OPTIONS {
        return Err(EngineError::invalid_config(
            InputKind::Form,
            Some("options"),
            format!("stored form must list between 1 and {MAX_FORM_OPTIONS} options"),
            Some(Value::from(form.options.clone())),
        ));
    }
    let bound = || ValueBound::Options {
        options: form.options.clone(),
    };

    let tokens: Vec<&str> = match raw {
        Value::String(joined) => joined.split(FORM_DELIMITER).collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().ok_or_else(|| {
                    EngineError::invalid_value(
                        InputKind::Form,
                        raw,
                        "every selected option must be a string",
                        bound(),
                    )
                })
            })
            .collect::<Result<_, _>>()?,
        _ => {
            return Err(EngineError::invalid_value(
                InputKind::Form,
                raw,
                "value must be a string like 'option1;option2'",
                bound(),
            ));
        }
    };
    if tokens.is_empty() {
        return Err(EngineError::invalid_value(
            InputKind::Form,
            raw,
            "select at least one option",
            bound(),
        ));
    }

    let mut selected = HashSet::new();
    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            return Err(EngineError::invalid_value(
                InputKind::Form,
                raw,
                "selection contains an empty option",
                bound(),
            ));
        }
        if !form.options.iter().any(|option| option == token) {
            return Err(EngineError::invalid_value(
                InputKind::Form,
                raw,
                format!("'{token}' is not an allowed option"),
                bound(),
            ));
        }
        selected.insert(token);
    }

    let normalized = form
        .options
        .iter()
        .filter(|option| selected.contains(option.as_str()))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(FORM_SEPARATOR);
    Ok(MetricValue::Text(normalized))
}

pub fn validate_time_value(raw: &Value, _config: &Config) -> Result<MetricValue, EngineError> {
    match raw.as_str() {
        Some(text) if TIME_RE.is_match(text) => Ok(MetricValue::Text(text.to_string())),
        _ => Err(EngineError::invalid_value(
            InputKind::Time,
            raw,
            format!("value must be a time in format {TIME_FORMAT}"),
            ValueBound::Pattern {
                pattern: TIME_FORMAT,
            },
        )),
    }
}

pub fn validate_rating_value(raw: &Value, _config: &Config) -> Result<MetricValue, EngineError> {
    let bound = ValueBound::Range {
        min: RATING_MIN as f64,
        max: RATING_MAX as f64,
    };
    let rating = raw.as_i64().ok_or_else(|| {
        EngineError::invalid_value(
            InputKind::Rating,
            raw,
            "rating must be an integer",
            bound.clone(),
        )
    })?;
    if !(RATING_MIN..=RATING_MAX).contains(&rating) {
        return Err(EngineError::invalid_value(
            InputKind::Rating,
            raw,
            format!("rating must be between {RATING_MIN} and {RATING_MAX}"),
            bound,
        ));
    }
    Ok(MetricValue::Int(rating))
}

/// Lenient parse of a config that already lives in the store. Unlike the
/// creation validators this accepts legacy key names and an untyped slider
/// (treated as float), because the store is not guaranteed to be clean.
pub fn parse_stored_config(kind: InputKind, raw: &Value) -> Result<Config, String> {
    match kind {
        InputKind::Slider => {
            let map = raw.as_object().ok_or("slider config is not an object")?;
            let min = map
                .get("min")
                .and_then(Value::as_f64)
                .ok_or("slider config has no numeric min")?;
            let max = map
                .get("max")
                .and_then(Value::as_f64)
                .ok_or("slider config has no numeric max")?;
            let numeric_type = first_key(map, &["numericType", "numeric_type", "type"])
                .and_then(Value::as_str)
                .and_then(NumericType::parse)
                .unwrap_or(NumericType::Float);
            Ok(Config::Slider(SliderConfig {
                min: min.min(max),
                max: min.max(max),
                numeric_type,
            }))
        }
        InputKind::Form => {
            let map = raw.as_object().ok_or("form config is not an object")?;
            let items = first_key(map, &["options", "boxes", "box-list"])
                .and_then(Value::as_array)
                .ok_or("form config has no options list")?;
            let mut options: Vec<String> = Vec::with_capacity(items.len());
            for option in items.iter().filter_map(Value::as_str).map(str::trim) {
                if !option.is_empty() && !options.iter().any(|existing| existing == option) {
                    options.push(option.to_string());
                }
            }
            Ok(Config::Form(FormConfig { options }))
        }
        InputKind::Text | InputKind::Time | InputKind::Rating => Ok(Config::empty()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn slider(min: f64, max: f64, numeric_type: NumericType) -> Config {
        Config::Slider(SliderConfig {
            min,
            max,
            numeric_type,
        })
    }

    fn abc_form() -> Config {
        validate_form_config(Some(&json!({ "options": ["A", "B", "C"] }))).unwrap()
    }

    #[test]
    fn slider_config_accepts_ordered_bounds() {
        let config =
            validate_slider_config(Some(&json!({ "min": 0, "max": 100, "numericType": "int" })))
                .unwrap();
        assert_eq!(config, slider(0.0, 100.0, NumericType::Int));
    }

    #[test]
    fn slider_config_swaps_reversed_bounds() {
        let config =
            validate_slider_config(Some(&json!({ "min": 10, "max": 1, "type": "float" })))
                .unwrap();
        assert_eq!(config, slider(1.0, 10.0, NumericType::Float));
    }

    #[test]
    fn slider_config_rejects_equal_bounds_and_cap() {
        let equal = validate_slider_config(Some(&json!({ "min": 5, "max": 5, "type": "int" })));
        assert!(matches!(
            equal,
            Err(EngineError::InvalidConfig { field: Some("max"), .. })
        ));

        let at_cap = validate_slider_config(Some(
            &json!({ "min": 0, "max": 10_000_000, "numericType": "int" }),
        ));
        assert!(at_cap.is_ok());

        let over_cap = validate_slider_config(Some(
            &json!({ "min": 0, "max": 10_000_001, "numericType": "int" }),
        ));
        assert!(matches!(over_cap, Err(EngineError::InvalidConfig { .. })));

        // swapped into range, then the cap applies to the new max
        let swapped_over_cap = validate_slider_config(Some(
            &json!({ "min": 20_000_000, "max": 0, "numericType": "int" }),
        ));
        assert!(swapped_over_cap.is_err());
    }

    #[test]
    fn slider_config_requires_every_field() {
        for raw in [
            json!({ "max": 10, "numericType": "int" }),
            json!({ "min": 0, "numericType": "int" }),
            json!({ "min": 0, "max": 10 }),
            json!({ "min": 0, "max": 10, "numericType": "decimal" }),
            json!({ "min": "0", "max": 10, "numericType": "int" }),
        ] {
            assert!(validate_slider_config(Some(&raw)).is_err(), "{raw} must be rejected");
        }
        assert!(validate_slider_config(None).is_err());
    }

    #[test]
    fn form_config_enforces_option_count_and_uniqueness() {
        assert!(validate_form_config(Some(&json!({ "options": ["only"] }))).is_err());
        assert!(validate_form_config(Some(&json!({ "options": ["A", "A"] }))).is_err());
        assert!(validate_form_config(Some(&json!({ "options": ["A", " "] }))).is_err());
        assert!(validate_form_config(Some(&json!({ "options": ["A", "B;C"] }))).is_err());

        let eleven: Vec<String> = (0..11).map(|i| format!("o{i}")).collect();
        assert!(validate_form_config(Some(&json!({ "options": eleven }))).is_err());

        let legacy = validate_form_config(Some(&json!({ "boxes": [" Eggs", "Toast "] }))).unwrap();
        assert_eq!(
            legacy,
            Config::Form(FormConfig {
                options: vec!["Eggs".into(), "Toast".into()]
            })
        );
    }

    #[test]
    fn configless_kinds_discard_supplied_config() {
        let config = validate_empty_config(Some(&json!({ "min": 1 }))).unwrap();
        assert_eq!(config, Config::empty());
        assert_eq!(serde_json::to_value(&config).unwrap(), json!({}));
    }

    #[test]
    fn slider_value_coerces_to_numeric_type() {
        let int_slider = slider(0.0, 100.0, NumericType::Int);
        assert_eq!(
            validate_slider_value(&json!(12), &int_slider).unwrap(),
            MetricValue::Int(12)
        );
        assert_eq!(
            validate_slider_value(&json!(12.9), &int_slider).unwrap(),
            MetricValue::Int(12)
        );

        let float_slider = slider(0.0, 100.0, NumericType::Float);
        assert_eq!(
            validate_slider_value(&json!(12), &float_slider).unwrap(),
            MetricValue::Float(12.0)
        );
    }

    #[test]
    fn int_slider_config_rejects_fractional_bounds() {
        let err = validate_slider_config(Some(
            &json!({ "min": 0.5, "max": 10, "numericType": "int" }),
        ))
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig { field: Some("min"), .. }));

        let float_ok = validate_slider_config(Some(
            &json!({ "min": 0.5, "max": 10, "numericType": "float" }),
        ));
        assert_eq!(float_ok.unwrap(), slider(0.5, 10.0, NumericType::Float));
    }

    #[test]
    fn int_value_stays_inside_fractional_stored_bounds() {
        // a store may still hold fractional bounds on an int slider
        let stored = slider(0.5, 10.0, NumericType::Int);
        let err = validate_slider_value(&json!(0.7), &stored).unwrap_err();
        assert!(matches!(err, EngineError::InvalidValue { bound: ValueBound::Range { .. }, .. }));
        assert_eq!(
            validate_slider_value(&json!(1.7), &stored).unwrap(),
            MetricValue::Int(1)
        );

        let huge = slider(-1.0e300, 0.0, NumericType::Int);
        assert!(validate_slider_value(&json!(-1.0e200), &huge).is_err());
    }

    #[test]
    fn slider_value_rejects_out_of_range_and_non_numbers() {
        let config = slider(0.0, 100.0, NumericType::Int);
        for raw in [json!(-1), json!(100.4), json!(101), json!("12"), json!(true)] {
            let err = validate_slider_value(&raw, &config).unwrap_err();
            assert!(
                matches!(err, EngineError::InvalidValue { bound: ValueBound::Range { .. }, .. }),
                "{raw} must be rejected with a range bound"
            );
        }
        assert!(validate_slider_value(&json!(100), &config).is_ok());
        assert!(validate_slider_value(&json!(0), &config).is_ok());
    }

    #[test]
    fn form_value_normalizes_to_canonical_order() {
        let form = abc_form();
        assert_eq!(
            validate_form_value(&json!("A;C"), &form).unwrap(),
            MetricValue::Text("A;C".into())
        );
        assert_eq!(
            validate_form_value(&json!(" C ; A;C"), &form).unwrap(),
            MetricValue::Text("A;C".into())
        );
        assert_eq!(
            validate_form_value(&json!(["B", "A"]), &form).unwrap(),
            MetricValue::Text("A;B".into())
        );
    }

    #[test]
    fn form_value_rejects_unknown_option_naming_it() {
        let err = validate_form_value(&json!("A;D"), &abc_form()).unwrap_err();
        match err {
            EngineError::InvalidValue {
                message,
                bound: ValueBound::Options { options },
                ..
            } => {
                assert!(message.contains("'D'"));
                assert_eq!(options, vec!["A", "B", "C"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(validate_form_value(&json!(""), &abc_form()).is_err());
        assert!(validate_form_value(&json!("A;;B"), &abc_form()).is_err());
        assert!(validate_form_value(&json!([]), &abc_form()).is_err());
        assert!(validate_form_value(&json!(3), &abc_form()).is_err());
    }

    #[test]
    fn form_value_tolerates_single_option_store_but_not_empty_one() {
        let single = Config::Form(FormConfig {
            options: vec!["Yes".into()],
        });
        assert!(validate_form_value(&json!("Yes"), &single).is_ok());

        let empty = Config::Form(FormConfig { options: vec![] });
        assert!(matches!(
            validate_form_value(&json!("Yes"), &empty),
            Err(EngineError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn time_value_requires_hh_mm_ss() {
        for ok in ["23:59:59", "00:00:00", "07:30:00"] {
            assert!(validate_time_value(&json!(ok), &Config::empty()).is_ok(), "{ok}");
        }
        for bad in ["24:00:00", "1:2:3", "12:60:00", "12:00", "noon"] {
            assert!(validate_time_value(&json!(bad), &Config::empty()).is_err(), "{bad}");
        }
        assert!(validate_time_value(&json!(3600), &Config::empty()).is_err());
    }

    #[test]
    fn rating_value_accepts_one_to_five_integers() {
        for ok in 1..=5 {
            assert_eq!(
                validate_rating_value(&json!(ok), &Config::empty()).unwrap(),
                MetricValue::Int(ok)
            );
        }
        for bad in [json!(0), json!(6), json!("3"), json!(3.5), json!(3.0)] {
            assert!(
                validate_rating_value(&bad, &Config::empty()).is_err(),
                "{bad} must be rejected"
            );
        }
    }

    #[test]
    fn text_value_requires_string() {
        assert_eq!(
            validate_text_value(&json!("felt great"), &Config::empty()).unwrap(),
            MetricValue::Text("felt great".into())
        );
        assert!(validate_text_value(&json!(5), &Config::empty()).is_err());
    }

    #[test]
    fn value_validator_rejects_mismatched_config() {
        let err = validate_slider_value(&json!(3), &Config::empty()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig { kind: InputKind::Slider, .. }));
    }

    #[test]
    fn stored_config_parse_is_lenient() {
        let legacy = parse_stored_config(InputKind::Slider, &json!({ "min": 5, "max": 1 })).unwrap();
        assert_eq!(legacy, slider(1.0, 5.0, NumericType::Float));

        let form = parse_stored_config(
            InputKind::Form,
            &json!({ "boxes": ["A", "A", "", "B", 3] }),
        )
        .unwrap();
        assert_eq!(
            form,
            Config::Form(FormConfig {
                options: vec!["A".into(), "B".into()]
            })
        );

        assert!(parse_stored_config(InputKind::Slider, &json!({ "min": 1 })).is_err());
        assert_eq!(
            parse_stored_config(InputKind::Rating, &json!(null)).unwrap(),
            Config::empty()
        );
    }

    #[test]
    fn slider_config_serializes_whole_bounds_as_integers() {
        let value = serde_json::to_value(slider(0.0, 2.5, NumericType::Float)).unwrap();
        assert_eq!(value, json!({ "min": 0, "max": 2.5, "numericType": "float" }));

        let back: Config = serde_json::from_value(value).unwrap();
        assert_eq!(back, slider(0.0, 2.5, NumericType::Float));
    }
}
