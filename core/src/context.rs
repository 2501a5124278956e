//! In-memory model of which habits and metrics already exist.
//!
//! Built once per session from the store's snapshot, then extended (never
//! rewritten) each time a creation batch is accepted, so a later tool call in
//! the same session sees the effects of an earlier one.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::{Map, Value, json};

use crate::error::EngineError;
use crate::input_kind::InputKind;
use crate::model::{HabitDefinition, MetricDefinition, MetricKey, MetricSpec};
use crate::validation::parse_stored_config;

const SUGGESTION_MIN_SIMILARITY: f64 = 0.8;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    habits: BTreeMap<String, HabitDefinition>,
    habit_names: HashSet<String>,
    metric_keys: HashSet<MetricKey>,
    input_config_by_key: HashMap<MetricKey, MetricSpec>,
    descriptions: Vec<String>,
}

impl Context {
    /// Build from the store snapshot `{ "habits": { name: { description, goal, metrics } } }`.
    /// Malformed nodes are skipped with a warning instead of failing the build.
    pub fn from_snapshot(raw: &Value) -> Self {
        let habits = match raw.get("habits") {
            Some(Value::Object(map)) => map,
            None | Some(Value::Null) => return Self::default(),
            Some(other) => {
                tracing::warn!(found = json_type(other), "snapshot 'habits' is not an object");
                return Self::default();
            }
        };

        let mut parsed = BTreeMap::new();
        for (habit_name, habit_raw) in habits {
            let Some(habit_obj) = habit_raw.as_object() else {
                tracing::warn!(
                    habit = %habit_name,
                    found = json_type(habit_raw),
                    "skipping habit: not an object"
                );
                continue;
            };
            parsed.insert(habit_name.clone(), parse_habit(habit_name, habit_obj));
        }
        Self::from_habits(parsed)
    }

    /// Build from already-typed habit definitions.
    pub fn from_habits(habits: BTreeMap<String, HabitDefinition>) -> Self {
        let mut context = Self {
            habits,
            ..Self::default()
        };
        for (habit_name, habit) in &context.habits {
            context.habit_names.insert(habit_name.clone());
            for (metric_name, metric) in &habit.metrics {
                let key = MetricKey::new(habit_name.as_str(), metric_name.as_str());
                context.metric_keys.insert(key.clone());
                context.input_config_by_key.insert(key, metric.spec());
            }
        }
        context.refresh_descriptions();
        context
    }

    pub fn lookup(&self, habit: &str, metric: &str) -> Option<&MetricSpec> {
        self.input_config_by_key.get(&MetricKey::new(habit, metric))
    }

    pub fn contains_habit(&self, habit: &str) -> bool {
        self.habit_names.contains(habit)
    }

    pub fn contains_metric(&self, key: &MetricKey) -> bool {
        self.metric_keys.contains(key)
    }

    pub fn habits(&self) -> &BTreeMap<String, HabitDefinition> {
        &self.habits
    }

    /// Habit names in sorted order.
    pub fn habit_names(&self) -> Vec<String> {
        self.habits.keys().cloned().collect()
    }

    /// Metric names of a habit in sorted order (empty for an unknown habit).
    pub fn metric_names(&self, habit: &str) -> Vec<String> {
        self.habits
            .get(habit)
            .map(|h| h.metrics.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn metric_keys(&self) -> &HashSet<MetricKey> {
        &self.metric_keys
    }

    pub fn input_config_by_key(&self) -> &HashMap<MetricKey, MetricSpec> {
        &self.input_config_by_key
    }

    /// One line per habit listing its metrics, kinds and options, for the agent.
    pub fn descriptions(&self) -> &[String] {
        &self.descriptions
    }

    /// A new context with `payload` folded into `habit_name`. The receiver is
    /// left untouched; a metric that already exists rejects the whole call.
    pub fn with_created_habit(
        &self,
        habit_name: &str,
        payload: &HabitDefinition,
    ) -> Result<Context, EngineError> {
        let mut next = self.clone();
        next.extend_habit(habit_name, payload)?;
        Ok(next)
    }

    /// In-place form of [`Context::with_created_habit`]; checks every key
    /// before mutating anything.
    pub(crate) fn extend_habit(
        &mut self,
        habit_name: &str,
        payload: &HabitDefinition,
    ) -> Result<(), EngineError> {
        if let Some(metric) = payload
            .metrics
            .keys()
            .find(|metric| self.metric_keys.contains(&MetricKey::new(habit_name, metric.as_str())))
        {
            return Err(EngineError::DuplicateMetric {
                habit: habit_name.to_string(),
                metric: metric.clone(),
            });
        }

        let habit = self.habits.entry(habit_name.to_string()).or_default();
        if habit.description.is_none() {
            habit.description.clone_from(&payload.description);
        }
        if habit.goal.is_none() {
            habit.goal.clone_from(&payload.goal);
        }
        for (metric_name, metric) in &payload.metrics {
            habit.metrics.insert(metric_name.clone(), metric.clone());
            let key = MetricKey::new(habit_name, metric_name.as_str());
            self.metric_keys.insert(key.clone());
            self.input_config_by_key.insert(key, metric.spec());
        }
        self.habit_names.insert(habit_name.to_string());
        self.refresh_descriptions();
        Ok(())
    }

    /// Closest existing habit name, if any is similar enough.
    pub fn suggest_habit(&self, name: &str) -> Option<String> {
        closest_match(name, self.habits.keys())
    }

    pub fn suggest_metric(&self, habit: &str, name: &str) -> Option<String> {
        self.habits
            .get(habit)
            .and_then(|h| closest_match(name, h.metrics.keys()))
    }

    pub(crate) fn unknown_habit(&self, habit: &str) -> EngineError {
        EngineError::UnknownHabit {
            habit: habit.to_string(),
            available: self.habit_names(),
            suggestion: self.suggest_habit(habit),
        }
    }

    pub(crate) fn unknown_metric(&self, habit: &str, metric: &str) -> EngineError {
        EngineError::UnknownMetric {
            habit: habit.to_string(),
            metric: metric.to_string(),
            available: self.metric_names(habit),
            suggestion: self.suggest_metric(habit, metric),
        }
    }

    /// Serialize back into the store's snapshot shape.
    pub fn to_snapshot(&self) -> Value {
        json!({ "habits": self.habits })
    }

    fn refresh_descriptions(&mut self) {
        self.descriptions = self
            .habits
            .iter()
            .map(|(name, habit)| describe_habit(name, habit))
            .collect();
    }
}

fn parse_habit(habit_name: &str, habit_obj: &Map<String, Value>) -> HabitDefinition {
    let mut habit = HabitDefinition::new(
        string_field(habit_obj, "description"),
        string_field(habit_obj, "goal"),
    );

    let metrics = match habit_obj.get("metrics") {
        Some(Value::Object(map)) => map,
        None | Some(Value::Null) => return habit,
        Some(other) => {
            tracing::warn!(
                habit = %habit_name,
                found = json_type(other),
                "ignoring habit metrics: not an object"
            );
            return habit;
        }
    };

    for (metric_name, metric_raw) in metrics {
        match parse_metric(metric_raw) {
            Ok(metric) => {
                habit.metrics.insert(metric_name.clone(), metric);
            }
            Err(reason) => {
                tracing::warn!(habit = %habit_name, metric = %metric_name, %reason, "skipping metric");
            }
        }
    }
    habit
}

fn parse_metric(raw: &Value) -> Result<MetricDefinition, String> {
    let obj = raw
        .as_object()
        .ok_or_else(|| format!("expected an object, found {}", json_type(raw)))?;
    let literal = ["input", "input_type"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_str))
        .ok_or("missing input kind")?;
    let input = literal
        .parse::<InputKind>()
        .map_err(|err| err.to_string())?;
    let null = Value::Null;
    let config = parse_stored_config(input, obj.get("config").unwrap_or(&null))?;

    Ok(MetricDefinition {
        description: string_field(obj, "description"),
        input,
        config,
    })
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One compact JSON object per habit, the shape the agent is prompted with.
fn describe_habit(name: &str, habit: &HabitDefinition) -> String {
    let metrics: Vec<Value> = habit
        .metrics
        .iter()
        .map(|(metric_name, metric)| {
            let input = match metric.config.summary() {
                Some(summary) => format!("{}({summary})", metric.input),
                None => metric.input.to_string(),
            };
            json!({
                "metric_name": metric_name,
                "desc": metric.description.as_deref().unwrap_or_default(),
                "input": input,
            })
        })
        .collect();
    let mut description = json!({
        "habit_name": name,
        "description": habit.description.as_deref().unwrap_or_default(),
        "metrics": metrics,
    });
    if let (Some(goal), Value::Object(fields)) = (&habit.goal, &mut description) {
        fields.insert("goal".to_string(), json!(goal));
    }
    description.to_string()
}

fn closest_match<'a>(name: &str, candidates: impl Iterator<Item = &'a String>) -> Option<String> {
    let needle = name.trim().to_lowercase();
    candidates
        .map(|candidate| {
            (
                strsim::jaro_winkler(&needle, &candidate.to_lowercase()),
                candidate,
            )
        })
        .filter(|(score, _)| *score >= SUGGESTION_MIN_SIMILARITY)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, candidate)| candidate.clone())
}
