use habitlog_core::{Engine, Session, ToolCallResponse, ToolCallStatus};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::util::{EXIT_REJECTED, exit_error, load_session, print_json, read_json_from_file};

/// One recorded agent tool call.
#[derive(Debug, Deserialize)]
struct ToolCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

pub fn run(engine: &Engine, snapshot: &str, calls: &str, delta: Option<&str>) -> i32 {
    let mut session = load_session(snapshot, delta);
    let calls: Vec<ToolCall> = read_json_from_file(calls)
        .and_then(|raw| {
            serde_json::from_value(raw).map_err(|e| format!("Invalid tool call list in '{calls}': {e}"))
        })
        .unwrap_or_else(|e| {
            exit_error(&e, Some("Provide a list like [{\"name\": \"create_habit\", \"arguments\": {...}}]."))
        });

    let responses = replay(engine, &mut session, &calls);
    print_json(&json!({
        "responses": responses,
        "delta": session.delta(),
    }));

    if responses.iter().all(|r| r.status == ToolCallStatus::Ok) {
        0
    } else {
        EXIT_REJECTED
    }
}

fn replay(engine: &Engine, session: &mut Session, calls: &[ToolCall]) -> Vec<ToolCallResponse> {
    calls
        .iter()
        .map(|call| {
            let response = session.handle_tool_call(engine, &call.name, &call.arguments);
            tracing::info!(tool = %call.name, status = ?response.status, "tool call replayed");
            response
        })
        .collect()
}
