//! Response documents for irrigation analytics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{FarmId, Granularity, SectorId};

/// Minimum and maximum efficiency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyRange {
    pub min: f64,
    pub max: f64,
}

/// Normalized window that was analyzed (UTC, inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Metrics for the requested period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodMetrics {
    pub total_irrigation_volume_mm: f64,
    pub total_irrigation_events: i64,
    pub average_efficiency: Option<f64>,
    pub efficiency_range: Option<EfficiencyRange>,
}

/// Metrics for the same calendar window in an earlier year.
///
/// When `data_incomplete` is set every metric is `null` and `note` explains
/// which year is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearOverYearComparison {
    pub total_irrigation_volume_mm: Option<f64>,
    pub total_irrigation_events: Option<i64>,
    pub average_efficiency: Option<f64>,
    pub efficiency_range: Option<EfficiencyRange>,
    pub data_incomplete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl YearOverYearComparison {
    pub fn incomplete(note: impl Into<String>) -> Self {
        Self {
            total_irrigation_volume_mm: None,
            total_irrigation_events: None,
            average_efficiency: None,
            efficiency_range: None,
            data_incomplete: true,
            note: Some(note.into()),
        }
    }
}

/// Percentage changes of the current period against an earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentageChange {
    pub volume_change_percent: Option<f64>,
    pub events_change_percent: Option<f64>,
    pub efficiency_change_percent: Option<f64>,
}

/// Percentage changes per comparison year; absent when that year is incomplete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodComparison {
    #[serde(
        rename = "vs_same_period_-1",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub vs_previous_year: Option<PercentageChange>,
    #[serde(
        rename = "vs_same_period_-2",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub vs_two_years_ago: Option<PercentageChange>,
}

/// One bucket of the time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    /// Bucket start as `YYYY-MM-DD`
    pub date: String,
    pub nominal_amount_mm: f64,
    pub real_amount_mm: f64,
    pub efficiency: Option<f64>,
    pub event_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub page: i64,
    pub limit: i64,
    pub total_count: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub data: Vec<TimeSeriesPoint>,
    pub pagination: PaginationInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorBreakdown {
    pub sector_id: SectorId,
    pub sector_name: String,
    pub total_volume_mm: f64,
    pub average_efficiency: Option<f64>,
}

/// Complete analytics document for one farm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationAnalytics {
    pub farm_id: FarmId,
    pub farm_name: String,
    pub period: AnalysisPeriod,
    pub aggregation: Granularity,
    pub metrics: PeriodMetrics,
    #[serde(rename = "same_period_-1")]
    pub same_period_previous_year: YearOverYearComparison,
    #[serde(rename = "same_period_-2")]
    pub same_period_two_years_ago: YearOverYearComparison,
    pub period_comparison: PeriodComparison,
    pub time_series: TimeSeries,
    pub sector_breakdown: Vec<SectorBreakdown>,
}

impl IrrigationAnalytics {
    /// True when at least one earlier year has no data.
    pub fn is_partial(&self) -> bool {
        self.same_period_previous_year.data_incomplete
            || self.same_period_two_years_ago.data_incomplete
    }
}

pub const GET_IRRIGATION_ANALYTICS: &str = "get_irrigation_analytics";
pub const FARM_ANALYTICS_PATH: &str = "/farms/{farm_id}/irrigation/analytics";
