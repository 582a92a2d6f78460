//! Date windows and their conversion to instants in a configured timezone.

use std::fmt;

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Date format accepted for window bounds.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Invalid window bounds.
#[derive(Debug, Error)]
pub enum WindowError {
    /// A bound is not a `YYYY-MM-DD` date.
    #[error("invalid date {input:?}, expected YYYY-MM-DD")]
    InvalidDate {
        input: String,
        #[source]
        source: chrono::ParseError,
    },
    /// The end date precedes the start date.
    #[error("end date {end} is before start date {start}")]
    Inverted { start: NaiveDate, end: NaiveDate },
}

/// An analyzed range of calendar days, `[start, end)`.
///
/// A window is never shorter than one day: `start == end` covers the
/// start day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    start: NaiveDate,
    end: NaiveDate,
}

impl Window {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, WindowError> {
        if end < start {
            return Err(WindowError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parses `YYYY-MM-DD` bounds.
    pub fn parse(start: &str, end: &str) -> Result<Self, WindowError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whole days spanned, at least 1.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days().max(1)
    }

    /// Nominal minutes in the window.
    pub fn available_minutes(&self) -> i64 {
        self.days() * MINUTES_PER_DAY
    }

    /// Instants bounding the window in `tz`: local midnight of the start day
    /// and local midnight `days()` later.
    pub fn bounds(&self, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
        let days = u64::try_from(self.days()).unwrap_or(1);
        let last = self
            .start
            .checked_add_days(Days::new(days))
            .unwrap_or(self.end);
        (local_midnight_to_utc(self.start, tz), local_midnight_to_utc(last, tz))
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

fn parse_date(input: &str) -> Result<NaiveDate, WindowError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).map_err(|source| {
        WindowError::InvalidDate {
            input: input.to_string(),
            source,
        }
    })
}

/// Converts a local date at midnight in `tz` to UTC.
/// Ambiguous midnights (DST fall-back) resolve to the earlier instant; a
/// midnight inside a spring-forward gap resolves to 01:00.
pub fn local_midnight_to_utc(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    resolve_local(&midnight, tz)
        .or_else(|| resolve_local(&(midnight + TimeDelta::hours(1)), tz))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

fn resolve_local(local: &NaiveDateTime, tz: &Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
