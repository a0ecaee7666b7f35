//! Normalization of raw analytics query parameters.
//!
//! Dates are `YYYY-MM-DD` and interpreted in UTC. A supplied range covers
//! whole calendar days; without both dates the window is the trailing
//! 90 days ending now.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::error::AnalyticsError;
use crate::models::{start_of_day, DateRange, FarmId, Granularity, SectorId};

pub const DEFAULT_LOOKBACK_DAYS: i64 = 90;
pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 1000;
/// Limit used for `limit=all`.
pub const ALL_LIMIT: i64 = 10_000;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Query string of the analytics endpoint, as received.
///
/// Every field is kept as text so that validation messages are produced
/// here rather than by the extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub sector_id: Option<String>,
    pub aggregation: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl AnalyticsParams {
    /// Collect parameters from decoded query pairs.
    ///
    /// The first occurrence of a repeated key wins; unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "start_date" => &mut params.start_date,
                "end_date" => &mut params.end_date,
                "sector_id" => &mut params.sector_id,
                "aggregation" => &mut params.aggregation,
                "page" => &mut params.page,
                "limit" => &mut params.limit,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }
}

/// Page selection; `limit` is always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Coerce raw values; never fails.
    ///
    /// Pages below 1 or unparsable become 1. `"all"` maps to [`ALL_LIMIT`],
    /// limits above [`MAX_LIMIT`] are clamped and anything else that is not a
    /// positive integer falls back to [`DEFAULT_LIMIT`].
    pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(DEFAULT_PAGE);

        let limit = match limit.map(str::trim) {
            Some("all") => ALL_LIMIT,
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|l| *l > 0)
                .map(|l| l.min(MAX_LIMIT))
                .unwrap_or(DEFAULT_LIMIT),
            None => DEFAULT_LIMIT,
        };

        Self { page, limit }
    }

    /// Number of buckets skipped before this page.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// `ceil(total_count / limit)`.
    pub fn total_pages(&self, total_count: i64) -> i64 {
        if total_count <= 0 {
            return 0;
        }
        (total_count + self.limit - 1) / self.limit
    }
}

/// Fully validated analytics request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsRequest {
    pub farm_id: FarmId,
    pub range: DateRange,
    pub sector_id: Option<SectorId>,
    pub granularity: Granularity,
    pub pagination: Pagination,
}

impl AnalyticsRequest {
    /// Request for `range` with default granularity and paging.
    pub fn new(farm_id: FarmId, range: DateRange) -> Self {
        Self {
            farm_id,
            range,
            sector_id: None,
            granularity: Granularity::default(),
            pagination: Pagination::default(),
        }
    }

    /// Validate and normalize raw parameters.
    ///
    /// `now` anchors the default window.
    ///
    /// # Errors
    /// `AnalyticsError::InvalidInput` for an unknown aggregation, a
    /// malformed date, a start date after the end date, or a malformed
    /// sector id.
    pub fn from_params(
        farm_id: FarmId,
        params: &AnalyticsParams,
        now: DateTime<Utc>,
    ) -> Result<Self, AnalyticsError> {
        let granularity = match params.aggregation.as_deref() {
            None => Granularity::default(),
            Some(raw) => raw
                .parse::<Granularity>()
                .map_err(|e| AnalyticsError::invalid_input(e.to_string()))?,
        };

        let start = parse_date(params.start_date.as_deref(), "start_date")?;
        let end = parse_date(params.end_date.as_deref(), "end_date")?;
        let range = match (start, end) {
            (Some(start), Some(end)) => {
                if start > end {
                    return Err(AnalyticsError::invalid_input(
                        "start_date must not be after end_date",
                    ));
                }
                DateRange::from_days(start, end).ok_or_else(|| invalid_date("end_date"))?
            }
            _ => default_range(now),
        };

        let sector_id = match non_empty(params.sector_id.as_deref()) {
            None => None,
            Some(raw) => Some(
                parse_positive_id(raw)
                    .map(SectorId::new)
                    .ok_or_else(|| AnalyticsError::invalid_input("invalid sector_id format"))?,
            ),
        };

        Ok(Self {
            farm_id,
            range,
            sector_id,
            granularity,
            pagination: Pagination::from_raw(
                params.page.as_deref(),
                params.limit.as_deref(),
            ),
        })
    }
}

/// Parse a farm id path segment; ids must be positive integers.
pub fn parse_farm_id(raw: &str) -> Result<FarmId, AnalyticsError> {
    parse_positive_id(raw)
        .map(FarmId::new)
        .ok_or_else(|| AnalyticsError::invalid_input("invalid farm_id format"))
}

/// Trailing window ending at `now`, starting at midnight 90 days earlier.
pub fn default_range(now: DateTime<Utc>) -> DateRange {
    let start = start_of_day((now - Duration::days(DEFAULT_LOOKBACK_DAYS)).date_naive());
    DateRange::new(start, now)
}

fn parse_positive_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.filter(|s| !s.trim().is_empty())
}

fn parse_date(raw: Option<&str>, field: &str) -> Result<Option<NaiveDate>, AnalyticsError> {
    non_empty(raw)
        .map(str::trim)
        .map(|s| {
            if !is_date_shaped(s) {
                return Err(invalid_date(field));
            }
            NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| invalid_date(field))
        })
        .transpose()
}

/// Exactly `dddd-dd-dd`; chrono alone accepts unpadded fields and signed years.
fn is_date_shaped(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

fn invalid_date(field: &str) -> AnalyticsError {
    AnalyticsError::invalid_input(format!("invalid {} format; use YYYY-MM-DD", field))
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod request_tests;
