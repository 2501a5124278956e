//! Resolution of a log entry's time reference into a canonical ISO-8601 instant.

use std::sync::LazyLock;

use chrono::{
    DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Offset, SecondsFormat, TimeZone, Utc,
};
use chrono_tz::Tz;
use regex::Regex;

static RELATIVE_AGO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+|a|an|one)\s+(minute|min|hour|day|week)s?\s+ago$")
        .expect("relative time regex must compile")
});

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const TIME_OF_DAY_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Turns a free-form time reference into an instant. `now` is already in the
/// reference timezone; `None` means the reference could not be understood.
pub trait TimeReferenceParser: Send + Sync {
    fn parse(&self, reference: &str, now: DateTime<Tz>) -> Option<DateTime<Tz>>;
}

/// Handles ISO timestamps, clock times and a small set of English phrases
/// ("yesterday", "this morning", "3 hours ago", ...).
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTimeParser;

impl TimeReferenceParser for BuiltinTimeParser {
    fn parse(&self, reference: &str, now: DateTime<Tz>) -> Option<DateTime<Tz>> {
        let trimmed = reference.trim();
        let tz = now.timezone();

        if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(instant.with_timezone(&tz));
        }
        for format in NAIVE_DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
                return localize(tz, naive);
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return localize(tz, date.and_time(NaiveTime::MIN));
        }
        for format in TIME_OF_DAY_FORMATS {
            if let Ok(time) = NaiveTime::parse_from_str(trimmed, format) {
                return localize(tz, now.date_naive().and_time(time));
            }
        }

        let phrase = trimmed.to_lowercase();
        let phrase = phrase.split_whitespace().collect::<Vec<_>>().join(" ");
        let today_at = |hour: u32| {
            NaiveTime::from_hms_opt(hour, 0, 0)
                .and_then(|time| localize(tz, now.date_naive().and_time(time)))
        };
        match phrase.as_str() {
            "now" | "just now" | "right now" | "today" => return Some(now),
            "yesterday" => return Some(now - Duration::days(1)),
            "tomorrow" => return Some(now + Duration::days(1)),
            "this morning" => return today_at(8),
            "this afternoon" => return today_at(15),
            "this evening" | "tonight" => return today_at(20),
            "last night" => return today_at(22).map(|t| t - Duration::days(1)),
            "last week" => return Some(now - Duration::weeks(1)),
            _ => {}
        }

        let captures = RELATIVE_AGO_RE.captures(&phrase)?;
        let amount: i64 = match &captures[1] {
            "a" | "an" | "one" => 1,
            digits => digits.parse().ok()?,
        };
        let span = match &captures[2] {
            "minute" | "min" => Duration::try_minutes(amount)?,
            "hour" => Duration::try_hours(amount)?,
            "day" => Duration::try_days(amount)?,
            _ => Duration::try_weeks(amount)?,
        };
        now.checked_sub_signed(span)
    }
}

fn localize(tz: Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&naive).earliest()
}

/// Canonical form: seconds precision with the zone's numeric offset.
pub fn format_instant(instant: &DateTime<Tz>) -> String {
    instant
        .with_timezone(&instant.offset().fix())
        .to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Empty or unparseable references fall back to `now`.
pub fn resolve_timestamp(
    reference: Option<&str>,
    parser: &dyn TimeReferenceParser,
    timezone: Tz,
    now: DateTime<Utc>,
) -> String {
    let now_local = now.with_timezone(&timezone);
    let resolved = match reference.map(str::trim).filter(|r| !r.is_empty()) {
        None => now_local,
        Some(reference) => parser.parse(reference, now_local).unwrap_or_else(|| {
            tracing::debug!(%reference, "unparseable time reference, using now");
            now_local
        }),
    };
    format_instant(&resolved)
}

#[cfg(test)]
mod tests {
    use chrono_tz::Europe::Rome;

    use super::*;

    // 2026-10-19 12:30:00 in Rome (CEST, +02:00)
    fn now_utc() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 10, 30, 0).unwrap()
    }

    fn resolve(reference: &str) -> String {
        resolve_timestamp(Some(reference), &BuiltinTimeParser, Rome, now_utc())
    }

    #[test]
    fn empty_reference_is_now_in_reference_zone() {
        assert_eq!(
            resolve_timestamp(None, &BuiltinTimeParser, Rome, now_utc()),
            "2026-10-19T12:30:00+02:00"
        );
        assert_eq!(resolve("   "), "2026-10-19T12:30:00+02:00");
    }

    #[test]
    fn unparseable_reference_falls_back_to_now() {
        assert_eq!(resolve("when the moon was full"), "2026-10-19T12:30:00+02:00");
    }

    #[test]
    fn iso_references_are_reserialized_in_reference_zone() {
        assert_eq!(resolve("2026-10-18T06:15:30Z"), "2026-10-18T08:15:30+02:00");
        assert_eq!(resolve("2026-10-18 07:00"), "2026-10-18T07:00:00+02:00");
        assert_eq!(resolve("2026-01-05"), "2026-01-05T00:00:00+01:00");
        assert_eq!(resolve("2026-10-18T06:15:30.123456+00:00"), "2026-10-18T08:15:30+02:00");
    }

    #[test]
    fn phrases_resolve_relative_to_now() {
        assert_eq!(resolve("Yesterday"), "2026-10-18T12:30:00+02:00");
        assert_eq!(resolve("this  morning"), "2026-10-19T08:00:00+02:00");
        assert_eq!(resolve("this afternoon"), "2026-10-19T15:00:00+02:00");
        assert_eq!(resolve("tonight"), "2026-10-19T20:00:00+02:00");
        assert_eq!(resolve("last night"), "2026-10-18T22:00:00+02:00");
        assert_eq!(resolve("3 hours ago"), "2026-10-19T09:30:00+02:00");
        assert_eq!(resolve("an hour ago"), "2026-10-19T11:30:00+02:00");
        assert_eq!(resolve("2 weeks ago"), "2026-10-05T12:30:00+02:00");
        assert_eq!(resolve("07:45"), "2026-10-19T07:45:00+02:00");
    }

    #[test]
    fn custom_parser_is_used() {
        struct Noon;
        impl TimeReferenceParser for Noon {
            fn parse(&self, _reference: &str, now: DateTime<Tz>) -> Option<DateTime<Tz>> {
                now.timezone()
                    .from_local_datetime(&now.date_naive().and_hms_opt(12, 0, 0)?)
                    .single()
            }
        }
        assert_eq!(
            resolve_timestamp(Some("lunch"), &Noon, Rome, now_utc()),
            "2026-10-19T12:00:00+02:00"
        );
    }
}
