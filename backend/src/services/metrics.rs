//! Pure metric derivations used to assemble the analytics document.
//!
//! Every optional value stays optional end to end: a missing efficiency is
//! never replaced by zero, and a percentage change is only computed when its
//! base is strictly positive.

use crate::api::{
    EfficiencyRange, PercentageChange, PeriodMetrics, SectorBreakdown, TimeSeriesPoint,
    YearOverYearComparison,
};
use crate::models::{SectorTotal, TimeBucketAggregate, YearOverYearTotals};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Reduce a set of buckets to period metrics.
///
/// `average_efficiency` is the mean of the buckets' own averages, ignoring
/// buckets without one. The range needs at least one bucket min and max.
pub fn summarize_buckets(buckets: &[TimeBucketAggregate]) -> PeriodMetrics {
    let total_irrigation_volume_mm = buckets.iter().map(|b| b.total_real_amount).sum();
    let total_irrigation_events = buckets.iter().map(|b| b.event_count).sum();

    let averages: Vec<f64> = buckets.iter().filter_map(|b| b.avg_efficiency).collect();
    let average_efficiency = mean(&averages);

    let min = buckets.iter().filter_map(|b| b.min_efficiency).reduce(f64::min);
    let max = buckets.iter().filter_map(|b| b.max_efficiency).reduce(f64::max);

    PeriodMetrics {
        total_irrigation_volume_mm,
        total_irrigation_events,
        average_efficiency,
        efficiency_range: efficiency_range(min, max),
    }
}

/// Comparison object for one earlier year.
///
/// A year missing from `totals`, or present with no events, yields an
/// incomplete comparison whose note names `label` and `year`.
pub fn year_over_year(
    totals: &YearOverYearTotals,
    year: i32,
    label: &str,
) -> YearOverYearComparison {
    let Some(total) = totals.get(&year) else {
        return YearOverYearComparison::incomplete(format!(
            "No data available for {} ({})",
            label, year
        ));
    };

    if total.event_count == 0 {
        return YearOverYearComparison::incomplete(format!(
            "No events found for {} ({})",
            label, year
        ));
    }

    YearOverYearComparison {
        total_irrigation_volume_mm: Some(total.total_real_amount),
        total_irrigation_events: Some(total.event_count),
        average_efficiency: total.avg_efficiency,
        efficiency_range: efficiency_range(total.min_efficiency, total.max_efficiency),
        data_incomplete: false,
        note: None,
    }
}

/// `(current - previous) / previous * 100`, or `None` when `previous <= 0`.
pub fn percentage_change(current: f64, previous: f64) -> Option<f64> {
    if previous > 0.0 {
        Some((current - previous) / previous * 100.0)
    } else {
        None
    }
}

/// Percentage changes against `previous`; `None` when it is incomplete.
///
/// A complete year always carries its volume, even a non-positive one, so
/// the object is present and only `volume_change_percent` goes null.
pub fn compare_periods(
    current: &PeriodMetrics,
    previous: &YearOverYearComparison,
) -> Option<PercentageChange> {
    if previous.data_incomplete {
        return None;
    }
    let previous_volume = previous.total_irrigation_volume_mm?;

    let events_change_percent = previous.total_irrigation_events.and_then(|events| {
        percentage_change(current.total_irrigation_events as f64, events as f64)
    });

    let efficiency_change_percent = match (current.average_efficiency, previous.average_efficiency)
    {
        (Some(cur), Some(prev)) => percentage_change(cur, prev),
        _ => None,
    };

    Some(PercentageChange {
        volume_change_percent: percentage_change(
            current.total_irrigation_volume_mm,
            previous_volume,
        ),
        events_change_percent,
        efficiency_change_percent,
    })
}

pub fn time_series_point(bucket: &TimeBucketAggregate) -> TimeSeriesPoint {
    TimeSeriesPoint {
        date: bucket.bucket_start.format(DATE_FORMAT).to_string(),
        nominal_amount_mm: bucket.total_nominal_amount,
        real_amount_mm: bucket.total_real_amount,
        efficiency: bucket.avg_efficiency,
        event_count: bucket.event_count,
    }
}

pub fn sector_breakdown(total: &SectorTotal) -> SectorBreakdown {
    SectorBreakdown {
        sector_id: total.sector_id,
        sector_name: total.sector_name.clone(),
        total_volume_mm: total.total_real_amount,
        average_efficiency: total.avg_efficiency,
    }
}

fn efficiency_range(min: Option<f64>, max: Option<f64>) -> Option<EfficiencyRange> {
    match (min, max) {
        (Some(min), Some(max)) => Some(EfficiencyRange { min, max }),
        _ => None,
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod metrics_tests;
