use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use habitlog_core::config::parse_timezone;
use habitlog_core::{Context, OutputDelta, Session};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Input was read and processed but the engine rejected (part of) it.
pub const EXIT_REJECTED: i32 = 1;
/// Bad flags, unreadable files or malformed JSON.
pub const EXIT_USAGE: i32 = 4;

const DEFAULT_LOG_FILTER: &str = "habitlog=info,habitlog_core=info";

/// Optional settings file at `<config_dir>/habitlog/config.json`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub timezone: Option<String>,
}

pub fn exit_error(message: &str, docs_hint: Option<&str>) -> ! {
    let mut err = json!({
        "error": "cli_error",
        "message": message
    });
    if let Some(hint) = docs_hint {
        err["docs_hint"] = json!(hint);
    }
    eprintln!(
        "{}",
        serde_json::to_string_pretty(&err).unwrap_or_else(|_| err.to_string())
    );
    std::process::exit(EXIT_USAGE);
}

/// Pretty-print to stdout; stdout carries nothing but this JSON.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(formatted) => println!("{formatted}"),
        Err(e) => exit_error(&format!("Failed to serialize output: {e}"), None),
    }
}

pub fn print_json_stderr<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(formatted) => eprintln!("{formatted}"),
        Err(e) => exit_error(&format!("Failed to serialize output: {e}"), None),
    }
}

/// Logs go to stderr. `RUST_LOG` overrides the default filter.
pub fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

pub fn config_path() -> PathBuf {
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("habitlog");
    config_dir.join("config.json")
}

/// Missing file means no settings; an unreadable one is logged and ignored.
pub fn load_cli_config(path: &Path) -> Option<CliConfig> {
    let data = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&data) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
            None
        }
    }
}

/// Flag or `HABITLOG_TIMEZONE` first, then the config file, then the default.
pub fn resolve_timezone(cli_value: Option<String>, file: Option<&CliConfig>) -> Tz {
    let raw = cli_value
        .filter(|v| !v.trim().is_empty())
        .or_else(|| file.and_then(|c| c.timezone.clone()));
    parse_timezone(raw)
}

/// Read JSON from a file path or stdin (when path is "-").
pub fn read_json_from_file(path: &str) -> Result<serde_json::Value, String> {
    let raw = if path == "-" {
        std::io::read_to_string(std::io::stdin()).map_err(|e| format!("Failed to read stdin: {e}"))?
    } else {
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read file '{path}': {e}"))?
    };
    serde_json::from_str(&raw).map_err(|e| format!("Invalid JSON in '{path}': {e}"))
}

/// Session over a snapshot file, optionally resuming an unpersisted delta.
pub fn load_session(snapshot: &str, delta: Option<&str>) -> Session {
    let snapshot = read_json_from_file(snapshot).unwrap_or_else(|e| {
        exit_error(&e, Some("Provide a snapshot like {\"habits\": {...}}."))
    });
    let Some(delta_path) = delta else {
        return Session::new(Context::from_snapshot(&snapshot));
    };
    let delta = read_json_from_file(delta_path)
        .and_then(|raw| {
            serde_json::from_value::<OutputDelta>(raw)
                .map_err(|e| format!("Invalid delta in '{delta_path}': {e}"))
        })
        .unwrap_or_else(|e| {
            exit_error(&e, Some("Pass a delta previously printed by this tool."))
        });
    Session::resume_from_snapshot(&snapshot, delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("habitlog-cli-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn resolve_timezone_prefers_cli_value() {
        let file = CliConfig {
            timezone: Some("Asia/Tokyo".into()),
        };
        assert_eq!(
            resolve_timezone(Some("America/New_York".into()), Some(&file)),
            chrono_tz::America::New_York
        );
    }

    #[test]
    fn resolve_timezone_falls_back_to_file_then_default() {
        let file = CliConfig {
            timezone: Some("Asia/Tokyo".into()),
        };
        assert_eq!(resolve_timezone(Some(" ".into()), Some(&file)), chrono_tz::Asia::Tokyo);
        assert_eq!(resolve_timezone(None, None), chrono_tz::Europe::Rome);
        assert_eq!(
            resolve_timezone(None, Some(&CliConfig::default())),
            chrono_tz::Europe::Rome
        );
    }

    #[test]
    fn load_cli_config_reads_timezone() {
        let path = temp_file("config.json", r#"{ "timezone": "Europe/Berlin" }"#);
        let config = load_cli_config(&path).unwrap();
        assert_eq!(config.timezone.as_deref(), Some("Europe/Berlin"));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn load_cli_config_ignores_missing_and_malformed_files() {
        assert!(load_cli_config(Path::new("/nonexistent/habitlog/config.json")).is_none());

        let path = temp_file("broken.json", "{ timezone");
        assert!(load_cli_config(&path).is_none());
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn read_json_from_file_reports_path_on_error() {
        let path = temp_file("invalid.json", "[1, 2");
        let err = read_json_from_file(path.to_str().unwrap()).unwrap_err();
        assert!(err.starts_with("Invalid JSON in"));
        std::fs::remove_file(path).unwrap();

        let missing = read_json_from_file("/nonexistent/snapshot.json").unwrap_err();
        assert!(missing.contains("Failed to read file"));
    }

    #[test]
    fn config_path_ends_in_habitlog_dir() {
        let path = config_path();
        assert!(path.ends_with("habitlog/config.json"));
    }
}
