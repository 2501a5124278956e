//! Tool definitions exposed to the agent loop.

use serde::Serialize;
use serde_json::{Value, json};

use crate::input_kind::InputKind;

pub const CREATE_HABIT: &str = "create_habit";
pub const INSERT_HABIT_DATA: &str = "insert_habit_data";
pub const GET_AVAILABLE_HABITS: &str = "get_available_habits";

#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

pub fn tool_definitions() -> Vec<ToolDefinition> {
    let kinds: Vec<&str> = InputKind::ALL.iter().map(|kind| kind.as_str()).collect();
    let value_docs = format!(
        "Value matching the metric's input kind:\n{}",
        InputKind::docs()
    );

    vec![
        ToolDefinition {
            name: CREATE_HABIT,
            description: "Create new habits, or add new metrics to an existing habit. \
                          The whole call is rejected if any metric is invalid or already exists.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "creation": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "name": { "type": "string", "description": "Habit name" },
                                "description": { "type": "string" },
                                "goal": { "type": "string", "description": "Habit goal/objective" },
                                "metrics": {
                                    "type": "array",
                                    "items": {
                                        "type": "object",
                                        "properties": {
                                            "name": { "type": "string", "description": "Metric name, unique within the habit" },
                                            "description": { "type": "string" },
                                            "input": {
                                                "type": "string",
                                                "enum": kinds,
                                                "description": InputKind::docs()
                                            },
                                            "config": {
                                                "type": "object",
                                                "description": "slider: {\"min\", \"max\", \"numericType\": \"int\"|\"float\"}; \
                                                                form: {\"options\": [2 to 10 strings]}; other kinds: omit",
                                                "properties": {
                                                    "min": { "type": "number" },
                                                    "max": { "type": "number" },
                                                    "numericType": { "type": "string", "enum": ["int", "float"] },
                                                    "options": { "type": "array", "items": { "type": "string" } }
                                                }
                                            }
                                        },
                                        "required": ["name", "input"]
                                    }
                                }
                            },
                            "required": ["name"]
                        }
                    }
                },
                "required": ["creation"],
                "additionalProperties": false
            }),
        },
        ToolDefinition {
            name: INSERT_HABIT_DATA,
            description: "Log data points for existing habits and metrics. \
                          Each entry is accepted or rejected on its own.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "logging": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "name": { "type": "string", "description": "Name of an existing habit" },
                                "timestamp": {
                                    "type": "string",
                                    "description": "When it happened: ISO-8601, HH:MM, or phrases like \
                                                    'yesterday', 'this morning', '2 hours ago'. Empty means now."
                                },
                                "notes": { "type": "string" },
                                "metrics": {
                                    "type": "array",
                                    "items": {
                                        "type": "object",
                                        "properties": {
                                            "name": { "type": "string", "description": "Name of an existing metric of the habit" },
                                            "value": { "description": value_docs }
                                        },
                                        "required": ["name", "value"]
                                    }
                                }
                            },
                            "required": ["name", "metrics"]
                        }
                    }
                },
                "required": ["logging"],
                "additionalProperties": false
            }),
        },
        ToolDefinition {
            name: GET_AVAILABLE_HABITS,
            description: "List the existing habits with their metrics, input kinds and options.",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposes_the_three_habit_tools() {
        let names: Vec<&str> = tool_definitions().iter().map(|tool| tool.name).collect();
        assert_eq!(names, vec![CREATE_HABIT, INSERT_HABIT_DATA, GET_AVAILABLE_HABITS]);
    }

    #[test]
    fn input_kind_enum_and_docs_are_embedded() {
        let tools = tool_definitions();
        let input = &tools[0].input_schema["properties"]["creation"]["items"]["properties"]["metrics"]
            ["items"]["properties"]["input"];
        assert_eq!(input["enum"], json!(["slider", "text", "form", "time", "rating"]));

        let value_docs = tools[1].input_schema["properties"]["logging"]["items"]["properties"]
            ["metrics"]["items"]["properties"]["value"]["description"]
            .as_str()
            .unwrap();
        assert!(value_docs.contains("rating: an integer from 1 to 5"));
    }

    #[test]
    fn serializes_with_camel_case_schema_key() {
        let value = serde_json::to_value(&tool_definitions()[2]).unwrap();
        assert!(value.get("inputSchema").is_some());
        assert!(value.get("input_schema").is_none());
    }
}
