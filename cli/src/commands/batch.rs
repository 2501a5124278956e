use habitlog_core::Engine;
use habitlog_core::requests::{CreationBatch, HabitCreationRequest, LogEntryRequest, LoggingBatch};
use habitlog_core::session::EntryReport;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::util::{EXIT_REJECTED, exit_error, load_session, print_json, print_json_stderr, read_json_from_file};

pub fn create(engine: &Engine, snapshot: &str, file: &str, delta: Option<&str>) -> i32 {
    let mut session = load_session(snapshot, delta);
    let batch: Vec<HabitCreationRequest> = read_batch(file, "creation", |b: CreationBatch| b.creation)
        .unwrap_or_else(|e| {
            exit_error(&e, Some("Provide {\"creation\": [...]} or a bare list of habit requests."))
        });

    match session.create_habits(engine, &batch) {
        Ok(habits) => {
            print_json(&json!({
                "habits": habits,
                "descriptions": session.context().descriptions(),
                "delta": session.delta(),
            }));
            0
        }
        Err(rejected) => {
            print_json_stderr(&rejected.to_agent_error());
            EXIT_REJECTED
        }
    }
}

pub fn log(engine: &Engine, snapshot: &str, file: &str, delta: Option<&str>) -> i32 {
    let mut session = load_session(snapshot, delta);
    let batch: Vec<LogEntryRequest> = read_batch(file, "logging", |b: LoggingBatch| b.logging)
        .unwrap_or_else(|e| {
            exit_error(&e, Some("Provide {\"logging\": [...]} or a bare list of log entries."))
        });

    let outcomes = session.log_entries(engine, &batch);
    let reports: Vec<EntryReport> = outcomes.iter().map(EntryReport::from).collect();
    print_json(&json!({
        "results": reports,
        "delta": session.delta(),
    }));

    if outcomes.iter().all(|o| o.is_logged()) {
        0
    } else {
        EXIT_REJECTED
    }
}

/// Batch files hold either the tool-call arguments object or just its list.
fn read_batch<B, T>(path: &str, key: &str, unwrap: impl FnOnce(B) -> Vec<T>) -> Result<Vec<T>, String>
where
    B: DeserializeOwned,
    T: DeserializeOwned,
{
    let raw = read_json_from_file(path)?;
    let parsed = match raw {
        Value::Array(_) => serde_json::from_value(raw),
        other => serde_json::from_value::<B>(other).map(unwrap),
    };
    parsed.map_err(|e| format!("Invalid {key} batch in '{path}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_batch_accepts_object_or_list() {
        let dir = std::env::temp_dir();
        let wrapped = dir.join(format!("habitlog-batch-{}-wrapped.json", std::process::id()));
        let bare = dir.join(format!("habitlog-batch-{}-bare.json", std::process::id()));
        std::fs::write(&wrapped, r#"{ "logging": [{ "name": "Sleep", "metrics": [] }] }"#).unwrap();
        std::fs::write(&bare, r#"[{ "name": "Sleep" }, { "name": "Water" }]"#).unwrap();

        let from_object: Vec<LogEntryRequest> =
            read_batch(wrapped.to_str().unwrap(), "logging", |b: LoggingBatch| b.logging).unwrap();
        let from_list: Vec<LogEntryRequest> =
            read_batch(bare.to_str().unwrap(), "logging", |b: LoggingBatch| b.logging).unwrap();
        assert_eq!(from_object.len(), 1);
        assert_eq!(from_list[1].name, "Water");

        std::fs::remove_file(wrapped).unwrap();
        std::fs::remove_file(bare).unwrap();
    }

    #[test]
    fn read_batch_names_the_section_on_error() {
        let path = std::env::temp_dir().join(format!("habitlog-batch-{}-bad.json", std::process::id()));
        std::fs::write(&path, r#"{ "creation": "Sleep" }"#).unwrap();
        let err = read_batch(path.to_str().unwrap(), "creation", |b: CreationBatch| b.creation)
            .unwrap_err();
        assert!(err.starts_with("Invalid creation batch"));
        std::fs::remove_file(path).unwrap();
    }
}
