//! Calendar helpers for analytics windows.
//!
//! All boundaries are interpreted in UTC. Bucket truncation follows the
//! semantics of PostgreSQL's `date_trunc` (weeks start on Monday) so the
//! in-memory and SQL backends agree on bucket keys.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Aggregation granularity of the time-series breakdown.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    pub const ALL: [Granularity; 3] = [Granularity::Daily, Granularity::Weekly, Granularity::Monthly];

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
        }
    }

    /// Unit passed to `date_trunc` for this granularity.
    pub fn trunc_unit(&self) -> &'static str {
        match self {
            Granularity::Daily => "day",
            Granularity::Weekly => "week",
            Granularity::Monthly => "month",
        }
    }

    /// Truncate a timestamp to the start of its bucket.
    pub fn truncate(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let date = ts.date_naive();
        let bucket = match self {
            Granularity::Daily => date,
            Granularity::Weekly => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            Granularity::Monthly => date - Duration::days(i64::from(date.day0())),
        };
        start_of_day(bucket)
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when an aggregation name is not one of daily, weekly or monthly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid aggregation type; must be daily, weekly, or monthly")]
pub struct UnknownGranularity(pub String);

impl FromStr for Granularity {
    type Err = UnknownGranularity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Granularity::Daily),
            "weekly" => Ok(Granularity::Weekly),
            "monthly" => Ok(Granularity::Monthly),
            other => Err(UnknownGranularity(other.to_string())),
        }
    }
}

/// Inclusive `[start, end]` window over record start times.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whole calendar days from `first` 00:00:00 through `last` 23:59:59.999999999.
    ///
    /// `None` when `last` is the final representable day.
    pub fn from_days(first: NaiveDate, last: NaiveDate) -> Option<Self> {
        end_of_day(last).map(|end| Self::new(start_of_day(first), end))
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }

    /// The same month/day window `years` calendar years earlier.
    ///
    /// A boundary on Feb 29 that lands in a non-leap year is pulled inward
    /// (start to Mar 1, end to Feb 28), so the shifted window can be one day
    /// shorter than the original.
    pub fn shift_years_back(&self, years: i32) -> Self {
        Self::new(
            shift_start_years_back(self.start, years),
            shift_end_years_back(self.end, years),
        )
    }
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

pub fn end_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    start_of_day(date)
        .checked_add_signed(Duration::days(1))
        .map(|next| next - Duration::nanoseconds(1))
}

fn shift_start_years_back(ts: DateTime<Utc>, years: i32) -> DateTime<Utc> {
    let target = ts.year() - years;
    ts.with_year(target).unwrap_or_else(|| {
        let next_day = start_of_day(ts.date_naive() + Duration::days(1));
        next_day.with_year(target).unwrap_or(next_day)
    })
}

fn shift_end_years_back(ts: DateTime<Utc>, years: i32) -> DateTime<Utc> {
    let target = ts.year() - years;
    ts.with_year(target).unwrap_or_else(|| {
        let previous_day = ts - Duration::days(1);
        previous_day.with_year(target).unwrap_or(previous_day)
    })
}
