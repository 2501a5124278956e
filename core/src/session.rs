//! Per-session state threaded through consecutive tool calls.
//!
//! A [`Session`] owns the current [`Context`] and the accumulated
//! [`OutputDelta`]. Each accepted call replaces them with the engine's
//! output, so a habit created by one call can be logged by the next.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::context::Context;
use crate::delta::OutputDelta;
use crate::engine::{CreationRejected, Engine, EntryOutcome};
use crate::error::{AgentError, codes};
use crate::requests::{CreationBatch, HabitCreationRequest, LogEntryRequest, LoggingBatch};
use crate::tools::{CREATE_HABIT, GET_AVAILABLE_HABITS, INSERT_HABIT_DATA, tool_definitions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    Ok,
    Rejected,
    /// Some log entries were accepted, others rejected
    Partial,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallResponse {
    pub tool: String,
    pub status: ToolCallStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<AgentError>,
}

impl ToolCallResponse {
    fn rejected(tool: &str, message: impl Into<String>, error: AgentError) -> Self {
        Self {
            tool: tool.to_string(),
            status: ToolCallStatus::Rejected,
            message: message.into(),
            results: None,
            errors: vec![error],
        }
    }
}

/// Per-entry line of an `insert_habit_data` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryReport {
    pub index: usize,
    pub habit: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<AgentError>,
}

impl From<&EntryOutcome> for EntryReport {
    fn from(outcome: &EntryOutcome) -> Self {
        let timestamp = match outcome {
            EntryOutcome::Logged { timestamp, .. } => Some(timestamp.clone()),
            EntryOutcome::Rejected { .. } => None,
        };
        Self {
            index: outcome.index(),
            habit: outcome.habit().to_string(),
            status: if outcome.is_logged() { "logged" } else { "rejected" },
            timestamp,
            error: outcome.agent_error(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    context: Context,
    delta: OutputDelta,
}

impl Session {
    pub fn new(context: Context) -> Self {
        Self::resume(context, OutputDelta::default())
    }

    pub fn from_snapshot(snapshot: &Value) -> Self {
        Self::new(Context::from_snapshot(snapshot))
    }

    /// Continue a session whose earlier delta has not been persisted yet.
    /// `context` must already include the habits created by `delta`.
    pub fn resume(context: Context, delta: OutputDelta) -> Self {
        Self { context, delta }
    }

    /// Resume from the store snapshot plus a delta that was produced on top
    /// of it but not persisted. Habits the delta creates are folded into the
    /// context so they can be logged.
    /// The merged JSON goes through [`Context::from_snapshot`], so a created
    /// metric whose config does not fit its kind is skipped with a warning.
    pub fn resume_from_snapshot(snapshot: &Value, delta: OutputDelta) -> Self {
        let mut habits = match snapshot.get("habits") {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };
        for (name, created) in &delta.creation {
            match serde_json::to_value(created) {
                Ok(Value::Object(created)) => {
                    let slot = habits.entry(name.clone()).or_insert_with(|| json!({}));
                    fold_created_habit(slot, created);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(habit = %name, error = %e, "skipping unserializable delta habit");
                }
            }
        }
        let context = Context::from_snapshot(&json!({ "habits": habits }));
        Self::resume(context, delta)
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn delta(&self) -> &OutputDelta {
        &self.delta
    }

    pub fn into_delta(self) -> OutputDelta {
        self.delta
    }

    /// Apply a creation batch. On rejection the session is left as it was.
    pub fn create_habits(
        &mut self,
        engine: &Engine,
        batch: &[HabitCreationRequest],
    ) -> Result<Vec<String>, CreationRejected> {
        let outcome = engine.create_habits(&self.context, &self.delta, batch)?;
        self.context = outcome.context;
        self.delta = outcome.delta;
        Ok(outcome.habits)
    }

    pub fn log_entries(&mut self, engine: &Engine, batch: &[LogEntryRequest]) -> Vec<EntryOutcome> {
        let outcome = engine.log_entries(&self.context, &self.delta, batch);
        self.delta = outcome.delta;
        outcome.results
    }

    /// Dispatch one agent tool call by name.
    pub fn handle_tool_call(&mut self, engine: &Engine, name: &str, arguments: &Value) -> ToolCallResponse {
        match name {
            CREATE_HABIT => match parse_arguments::<CreationBatch>(name, arguments) {
                Ok(batch) => self.run_creation(engine, &batch.creation),
                Err(response) => response,
            },
            INSERT_HABIT_DATA => match parse_arguments::<LoggingBatch>(name, arguments) {
                Ok(batch) => self.run_logging(engine, &batch.logging),
                Err(response) => response,
            },
            GET_AVAILABLE_HABITS => ToolCallResponse {
                tool: name.to_string(),
                status: ToolCallStatus::Ok,
                message: format!("{} habit(s) available", self.context.habits().len()),
                results: Some(json!(self.context.descriptions())),
                errors: Vec::new(),
            },
            _ => {
                let available: Vec<&str> = tool_definitions().iter().map(|tool| tool.name).collect();
                ToolCallResponse::rejected(
                    name,
                    format!("unknown tool '{name}'"),
                    AgentError {
                        error: codes::INVALID_ARGUMENTS.to_string(),
                        message: format!("unknown tool '{name}'"),
                        field: None,
                        received: Some(Value::String(name.to_string())),
                        docs_hint: Some(format!("Available tools: {}", available.join(", "))),
                        details: None,
                    },
                )
            }
        }
    }

    fn run_creation(&mut self, engine: &Engine, batch: &[HabitCreationRequest]) -> ToolCallResponse {
        match self.create_habits(engine, batch) {
            Ok(habits) => ToolCallResponse {
                tool: CREATE_HABIT.to_string(),
                status: ToolCallStatus::Ok,
                message: "Habit(s) created".to_string(),
                results: Some(json!({ "habits": habits })),
                errors: Vec::new(),
            },
            Err(rejected) => ToolCallResponse::rejected(
                CREATE_HABIT,
                format!("No habits created: {rejected}"),
                rejected.to_agent_error(),
            ),
        }
    }

    fn run_logging(&mut self, engine: &Engine, batch: &[LogEntryRequest]) -> ToolCallResponse {
        let outcomes = self.log_entries(engine, batch);
        let logged = outcomes.iter().filter(|o| o.is_logged()).count();
        let (status, message) = if logged == outcomes.len() {
            (ToolCallStatus::Ok, "Log(s) inserted".to_string())
        } else if logged == 0 {
            (ToolCallStatus::Rejected, "No logs inserted".to_string())
        } else {
            (
                ToolCallStatus::Partial,
                format!("{logged} of {} log(s) inserted", outcomes.len()),
            )
        };

        let reports: Vec<EntryReport> = outcomes.iter().map(EntryReport::from).collect();
        ToolCallResponse {
            tool: INSERT_HABIT_DATA.to_string(),
            status,
            message,
            results: serde_json::to_value(&reports).ok(),
            errors: outcomes.iter().filter_map(EntryOutcome::agent_error).collect(),
        }
    }
}

/// Merge a serialized creation record into a snapshot habit node: text
/// fields it carries overwrite, its metrics are added.
fn fold_created_habit(slot: &mut Value, created: Map<String, Value>) {
    if !slot.is_object() {
        *slot = json!({});
    }
    let Value::Object(habit) = slot else {
        return;
    };
    for (key, value) in created {
        match value {
            Value::Object(metrics) if key == "metrics" => {
                let existing = habit.entry("metrics").or_insert_with(|| json!({}));
                if !existing.is_object() {
                    *existing = json!({});
                }
                if let Value::Object(existing) = existing {
                    existing.extend(metrics);
                }
            }
            value => {
                habit.insert(key, value);
            }
        }
    }
}

fn parse_arguments<T: DeserializeOwned>(tool: &str, arguments: &Value) -> Result<T, ToolCallResponse> {
    serde_json::from_value(arguments.clone()).map_err(|err| {
        ToolCallResponse::rejected(
            tool,
            "Arguments do not match the tool schema",
            AgentError {
                error: codes::INVALID_ARGUMENTS.to_string(),
                message: err.to_string(),
                field: None,
                received: None,
                docs_hint: Some(format!("Check the '{tool}' input schema and retry.")),
                details: None,
            },
        )
    })
}
