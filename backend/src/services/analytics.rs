//! Irrigation analytics pipeline.
//!
//! Fetches the bucketed page, the year-over-year totals and the sector
//! totals concurrently, then reduces them into an [`IrrigationAnalytics`]
//! document. Any failed fetch fails the whole request; dropping the future
//! drops the in-flight fetches with it.

use chrono::Datelike;

use super::error::AnalyticsError;
use super::metrics;
use super::request::AnalyticsRequest;
use crate::api::{
    AnalysisPeriod, IrrigationAnalytics, PaginationInfo, PeriodComparison, TimeSeries,
};
use crate::db::repository::AnalyticsRepository;
use crate::models::Farm;

const PREVIOUS_YEAR_LABEL: &str = "previous year";
const TWO_YEARS_AGO_LABEL: &str = "two years ago";

/// Build the analytics document for `farm` over the normalized `request`.
///
/// Comparison years are derived from the year of the range start.
///
/// # Errors
/// `AnalyticsError::Repository` when any of the three fetches fails.
pub async fn get_irrigation_analytics<R: AnalyticsRepository + ?Sized>(
    repo: &R,
    farm: &Farm,
    request: &AnalyticsRequest,
) -> Result<IrrigationAnalytics, AnalyticsError> {
    let range = &request.range;
    let pagination = request.pagination;

    log::debug!(
        "Computing {} analytics for farm {} from {} to {}",
        request.granularity,
        farm.id,
        range.start,
        range.end
    );

    let (page, yoy_totals, sector_totals) = tokio::try_join!(
        repo.fetch_bucketed_aggregates(
            farm.id,
            range,
            request.granularity,
            pagination.limit,
            pagination.offset(),
        ),
        repo.fetch_year_over_year_totals(farm.id, range, request.granularity),
        repo.fetch_sector_totals(farm.id, request.sector_id, range),
    )?;

    let current = metrics::summarize_buckets(&page.buckets);

    let year = range.start.year();
    let previous_year = metrics::year_over_year(&yoy_totals, year - 1, PREVIOUS_YEAR_LABEL);
    let two_years_ago = metrics::year_over_year(&yoy_totals, year - 2, TWO_YEARS_AGO_LABEL);

    let period_comparison = PeriodComparison {
        vs_previous_year: metrics::compare_periods(&current, &previous_year),
        vs_two_years_ago: metrics::compare_periods(&current, &two_years_ago),
    };

    let time_series = TimeSeries {
        data: page.buckets.iter().map(metrics::time_series_point).collect(),
        pagination: PaginationInfo {
            page: pagination.page,
            limit: pagination.limit,
            total_count: page.total_count,
            total_pages: pagination.total_pages(page.total_count),
        },
    };

    let analytics = IrrigationAnalytics {
        farm_id: farm.id,
        farm_name: farm.name.clone(),
        period: AnalysisPeriod {
            start: range.start,
            end: range.end,
        },
        aggregation: request.granularity,
        metrics: current,
        same_period_previous_year: previous_year,
        same_period_two_years_ago: two_years_ago,
        period_comparison,
        time_series,
        sector_breakdown: sector_totals.iter().map(metrics::sector_breakdown).collect(),
    };

    if analytics.is_partial() {
        log::info!(
            "Analytics for farm {} are partial: earlier-year data missing",
            farm.id
        );
    }

    Ok(analytics)
}

#[cfg(test)]
#[path = "analytics_tests.rs"]
mod analytics_tests;
