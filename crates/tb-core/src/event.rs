//! Calendar events and the duration calculation over their endpoints.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// One endpoint of a calendar event.
///
/// Timed events carry `date_time` (RFC 3339 with an explicit offset or `Z`).
/// All-day events carry only `date`, which never contributes duration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl EventTime {
    /// Endpoint with a timestamp.
    pub fn at(date_time: impl Into<String>) -> Self {
        Self {
            date_time: Some(date_time.into()),
            date: None,
        }
    }

    /// Endpoint with neither a timestamp nor a date.
    pub const fn absent() -> Self {
        Self {
            date_time: None,
            date: None,
        }
    }
}

/// A calendar event as seen by the aggregation engine.
///
/// `id` and `summary` are informational; only the tag and the endpoints
/// take part in aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub category_tag: Option<String>,
    #[serde(default)]
    pub start: EventTime,
    #[serde(default)]
    pub end: EventTime,
}

impl Event {
    /// Builds a timed event with an optional category tag.
    pub fn timed(tag: Option<&str>, start: &str, end: &str) -> Self {
        Self {
            id: None,
            summary: None,
            category_tag: tag.map(String::from),
            start: EventTime::at(start),
            end: EventTime::at(end),
        }
    }

    /// Elapsed minutes between this event's endpoints.
    pub fn duration_minutes(&self) -> i64 {
        duration(&self.start, &self.end)
    }
}

/// Elapsed whole minutes from `start` to `end`.
///
/// Returns 0 when either endpoint lacks a timestamp. The difference is
/// computed across offsets, floored to the minute, and may be negative when
/// `end` precedes `start`.
pub fn duration(start: &EventTime, end: &EventTime) -> i64 {
    let (Some(start_str), Some(end_str)) = (start.date_time.as_deref(), end.date_time.as_deref())
    else {
        return 0;
    };

    let parsed = DateTime::parse_from_rfc3339(start_str)
        .and_then(|s| DateTime::parse_from_rfc3339(end_str).map(|e| (s, e)));
    match parsed {
        Ok((start_dt, end_dt)) => {
            let elapsed = end_dt - start_dt;
            elapsed.num_nanoseconds().map_or_else(
                || elapsed.num_seconds().div_euclid(60),
                |nanos| nanos.div_euclid(60_000_000_000),
            )
        }
        Err(err) => {
            tracing::warn!(start = start_str, end = end_str, %err, "unparseable event timestamp");
            0
        }
    }
}
