//! Derived aggregates returned by the analytics repository.
//!
//! None of these are persisted; each is recomputed per request. Efficiency
//! statistics only consider records whose nominal amount is positive and are
//! `None` when a group has no such record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::farm::SectorId;

/// Aggregates for one time bucket (day, ISO week or month).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeBucketAggregate {
    /// Bucket boundary (truncated record start time, UTC midnight)
    pub bucket_start: DateTime<Utc>,
    pub total_real_amount: f64,
    pub total_nominal_amount: f64,
    pub event_count: i64,
    pub avg_efficiency: Option<f64>,
    pub min_efficiency: Option<f64>,
    pub max_efficiency: Option<f64>,
}

/// One page of buckets plus the unpaginated bucket count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketPage {
    pub buckets: Vec<TimeBucketAggregate>,
    pub total_count: i64,
}

/// Unbucketed totals over one year's copy of the requested window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearTotal {
    pub year: i32,
    pub total_real_amount: f64,
    pub total_nominal_amount: f64,
    pub event_count: i64,
    pub avg_efficiency: Option<f64>,
    pub min_efficiency: Option<f64>,
    pub max_efficiency: Option<f64>,
}

/// Totals keyed by absolute calendar year.
///
/// A year without records is absent rather than zero-valued.
pub type YearOverYearTotals = BTreeMap<i32, YearTotal>;

/// Per-sector totals across the requested window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorTotal {
    pub sector_id: SectorId,
    pub sector_name: String,
    pub total_real_amount: f64,
    pub total_nominal_amount: f64,
    pub event_count: i64,
    pub avg_efficiency: Option<f64>,
}
