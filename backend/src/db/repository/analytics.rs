//! Aggregation queries over irrigation events.
//!
//! All three operations are read-only and compute their aggregates inside
//! the backing store. Implementations return rows as-is with no business
//! interpretation; failures carry the operation name in their context and
//! are never retried.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{
    BucketPage, DateRange, FarmId, Granularity, SectorId, SectorTotal, YearOverYearTotals,
};

/// Repository trait for irrigation analytics.
///
/// Efficiency statistics (`avg`/`min`/`max`) only consider records with a
/// positive nominal amount. Sums and counts consider every record.
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Group the farm's records in `range` by truncated start time.
    ///
    /// # Arguments
    /// * `farm_id` - Farm whose records participate
    /// * `range` - Inclusive window over record start times
    /// * `granularity` - Bucket width
    /// * `limit` / `offset` - Page of buckets to return
    ///
    /// # Returns
    /// * `Ok(BucketPage)` - Buckets ascending by boundary plus the count of
    ///   all distinct buckets in range (independent of `limit`/`offset`)
    /// * `Err(RepositoryError)` - If the query fails
    async fn fetch_bucketed_aggregates(
        &self,
        farm_id: FarmId,
        range: &DateRange,
        granularity: Granularity,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<BucketPage>;

    /// Totals for `range` and its copies one and two calendar years earlier.
    ///
    /// The result is keyed by absolute year. Years without any matching
    /// record are absent. Backends answer this with a single round trip.
    async fn fetch_year_over_year_totals(
        &self,
        farm_id: FarmId,
        range: &DateRange,
        granularity: Granularity,
    ) -> RepositoryResult<YearOverYearTotals>;

    /// Per-sector totals ascending by sector id.
    ///
    /// With `sector_id` set only that sector is considered. Sectors without
    /// records in range are omitted.
    async fn fetch_sector_totals(
        &self,
        farm_id: FarmId,
        sector_id: Option<SectorId>,
        range: &DateRange,
    ) -> RepositoryResult<Vec<SectorTotal>>;
}
