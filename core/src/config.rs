use chrono_tz::Tz;

/// Reference timezone for timestamp resolution when nothing else is configured.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Rome;
/// Environment variable the CLI reads the reference timezone from.
pub const TIMEZONE_ENV: &str = "HABITLOG_TIMEZONE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub timezone: Tz,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE,
        }
    }
}

/// IANA zone name, falling back to [`DEFAULT_TIMEZONE`] when unset, blank or unknown.
pub fn parse_timezone(raw: Option<String>) -> Tz {
    let Some(raw) = raw else {
        return DEFAULT_TIMEZONE;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return DEFAULT_TIMEZONE;
    }
    match trimmed.parse::<Tz>() {
        Ok(tz) => tz,
        Err(_) => {
            tracing::warn!(
                value = %trimmed,
                fallback = %DEFAULT_TIMEZONE,
                "unknown timezone, using default"
            );
            DEFAULT_TIMEZONE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_timezone_defaults_when_missing_or_blank() {
        assert_eq!(parse_timezone(None), chrono_tz::Europe::Rome);
        assert_eq!(parse_timezone(Some("  ".into())), chrono_tz::Europe::Rome);
    }

    #[test]
    fn parse_timezone_accepts_iana_names() {
        assert_eq!(
            parse_timezone(Some(" America/New_York ".into())),
            chrono_tz::America::New_York
        );
    }

    #[test]
    fn parse_timezone_falls_back_on_unknown_zone() {
        assert_eq!(parse_timezone(Some("Mars/Olympus".into())), DEFAULT_TIMEZONE);
    }
}
