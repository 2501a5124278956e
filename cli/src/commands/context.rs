use habitlog_core::Context;
use serde_json::{Value, json};

use crate::util::{load_session, print_json};

pub fn run(snapshot: &str) -> i32 {
    let session = load_session(snapshot, None);
    print_json(&summary(session.context()));
    0
}

/// Descriptions plus sorted habit names and `habit.metric` keys.
fn summary(context: &Context) -> Value {
    let mut metrics: Vec<String> = context.metric_keys().iter().map(|key| key.to_string()).collect();
    metrics.sort();
    json!({
        "descriptions": context.descriptions(),
        "habits": context.habit_names(),
        "metrics": metrics,
    })
}
