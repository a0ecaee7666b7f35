//! In-memory repository for unit testing and local development.
//!
//! Aggregation mirrors the SQL backend: records are selected by farm and
//! inclusive start-time window, grouped by truncated start time, and
//! efficiency statistics skip records whose nominal amount is not positive.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::db::repository::{
    AnalyticsRepository, ErrorContext, FarmRepository, RepositoryError, RepositoryResult,
};
use crate::models::{
    BucketPage, DateRange, Farm, FarmId, Granularity, IrrigationRecord, IrrigationSector,
    SectorId, SectorTotal, TimeBucketAggregate, YearOverYearTotals, YearTotal,
};

/// Number of earlier years compared against the requested window.
const YEARS_BACK: i32 = 2;

#[derive(Debug)]
struct LocalData {
    farms: BTreeMap<FarmId, Farm>,
    sectors: BTreeMap<SectorId, IrrigationSector>,
    records: Vec<IrrigationRecord>,
    is_healthy: bool,
    fail_queries: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            farms: BTreeMap::new(),
            sectors: BTreeMap::new(),
            records: Vec::new(),
            is_healthy: true,
            fail_queries: false,
        }
    }
}

/// Running totals for one group of records.
#[derive(Debug, Default, Clone)]
struct Accumulator {
    real: f64,
    nominal: f64,
    count: i64,
    efficiency_sum: f64,
    efficiency_count: i64,
    efficiency_min: Option<f64>,
    efficiency_max: Option<f64>,
}

impl Accumulator {
    fn push(&mut self, record: &IrrigationRecord) {
        self.real += record.real_amount;
        self.nominal += record.nominal_amount;
        self.count += 1;
        if let Some(efficiency) = record.efficiency() {
            self.efficiency_sum += efficiency;
            self.efficiency_count += 1;
            self.efficiency_min = Some(self.efficiency_min.map_or(efficiency, |m| m.min(efficiency)));
            self.efficiency_max = Some(self.efficiency_max.map_or(efficiency, |m| m.max(efficiency)));
        }
    }

    fn avg_efficiency(&self) -> Option<f64> {
        (self.efficiency_count > 0).then(|| self.efficiency_sum / self.efficiency_count as f64)
    }

    fn into_bucket(self, bucket_start: DateTime<Utc>) -> TimeBucketAggregate {
        TimeBucketAggregate {
            bucket_start,
            total_real_amount: self.real,
            total_nominal_amount: self.nominal,
            event_count: self.count,
            avg_efficiency: self.avg_efficiency(),
            min_efficiency: self.efficiency_min,
            max_efficiency: self.efficiency_max,
        }
    }

    fn into_year_total(self, year: i32) -> YearTotal {
        YearTotal {
            year,
            total_real_amount: self.real,
            total_nominal_amount: self.nominal,
            event_count: self.count,
            avg_efficiency: self.avg_efficiency(),
            min_efficiency: self.efficiency_min,
            max_efficiency: self.efficiency_max,
        }
    }
}

/// In-memory repository.
///
/// Cloning is cheap and clones share the same underlying data.
#[derive(Debug, Clone, Default)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value reported by `health_check`.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Make every analytics query fail with a connection error.
    ///
    /// Farm lookups keep working so that the failure surfaces after the
    /// existence check.
    pub fn set_fail_queries(&self, fail: bool) {
        self.data.write().fail_queries = fail;
    }

    /// Remove all farms, sectors and records.
    pub fn clear(&self) {
        let mut data = self.data.write();
        data.farms.clear();
        data.sectors.clear();
        data.records.clear();
    }

    pub fn insert_farm(&self, farm: Farm) -> RepositoryResult<()> {
        let mut data = self.data.write();
        if data.farms.contains_key(&farm.id) {
            return Err(RepositoryError::validation_with_context(
                "farm already exists",
                ErrorContext::new("insert_farm")
                    .with_entity("farm")
                    .with_entity_id(farm.id),
            ));
        }
        data.farms.insert(farm.id, farm);
        Ok(())
    }

    pub fn insert_sector(&self, sector: IrrigationSector) -> RepositoryResult<()> {
        let mut data = self.data.write();
        let context = || {
            ErrorContext::new("insert_sector")
                .with_entity("irrigation_sector")
                .with_entity_id(sector.id)
        };
        if !data.farms.contains_key(&sector.farm_id) {
            return Err(RepositoryError::validation_with_context(
                format!("farm {} does not exist", sector.farm_id),
                context(),
            ));
        }
        if data.sectors.contains_key(&sector.id) {
            return Err(RepositoryError::validation_with_context(
                "sector already exists",
                context(),
            ));
        }
        data.sectors.insert(sector.id, sector);
        Ok(())
    }

    /// Insert one irrigation event. The sector must belong to the record's farm.
    pub fn insert_record(&self, record: IrrigationRecord) -> RepositoryResult<()> {
        let mut data = self.data.write();
        match data.sectors.get(&record.sector_id) {
            Some(sector) if sector.farm_id == record.farm_id => {}
            _ => {
                return Err(RepositoryError::validation_with_context(
                    format!(
                        "sector {} does not belong to farm {}",
                        record.sector_id, record.farm_id
                    ),
                    ErrorContext::new("insert_record").with_entity("irrigation_data"),
                ))
            }
        }
        data.records.push(record);
        Ok(())
    }

    pub fn insert_records<I>(&self, records: I) -> RepositoryResult<usize>
    where
        I: IntoIterator<Item = IrrigationRecord>,
    {
        let mut inserted = 0;
        for record in records {
            self.insert_record(record)?;
            inserted += 1;
        }
        Ok(inserted)
    }

    pub fn record_count(&self) -> usize {
        self.data.read().records.len()
    }

    fn ensure_available(data: &LocalData, operation: &str) -> RepositoryResult<()> {
        if data.fail_queries {
            return Err(RepositoryError::connection_with_context(
                "local store unavailable",
                ErrorContext::new(operation),
            ));
        }
        Ok(())
    }
}

fn accumulate<'a, I>(records: I) -> Accumulator
where
    I: IntoIterator<Item = &'a IrrigationRecord>,
{
    let mut acc = Accumulator::default();
    for record in records {
        acc.push(record);
    }
    acc
}

fn in_window<'a>(
    records: &'a [IrrigationRecord],
    farm_id: FarmId,
    range: &'a DateRange,
) -> impl Iterator<Item = &'a IrrigationRecord> + 'a {
    records
        .iter()
        .filter(move |r| r.farm_id == farm_id && range.contains(r.start_time))
}

#[async_trait]
impl FarmRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn get_farm(&self, farm_id: FarmId) -> RepositoryResult<Option<Farm>> {
        Ok(self.data.read().farms.get(&farm_id).cloned())
    }

    async fn list_sectors(&self, farm_id: FarmId) -> RepositoryResult<Vec<IrrigationSector>> {
        Ok(self
            .data
            .read()
            .sectors
            .values()
            .filter(|s| s.farm_id == farm_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AnalyticsRepository for LocalRepository {
    async fn fetch_bucketed_aggregates(
        &self,
        farm_id: FarmId,
        range: &DateRange,
        granularity: Granularity,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<BucketPage> {
        let data = self.data.read();
        Self::ensure_available(&data, "fetch_bucketed_aggregates")?;

        let mut groups: BTreeMap<DateTime<Utc>, Accumulator> = BTreeMap::new();
        for record in in_window(&data.records, farm_id, range) {
            groups
                .entry(granularity.truncate(record.start_time))
                .or_default()
                .push(record);
        }

        let total_count = groups.len() as i64;
        let buckets = groups
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|(bucket_start, acc)| acc.into_bucket(bucket_start))
            .collect::<Vec<_>>();

        log::debug!(
            "farm {}: {} of {} {} buckets",
            farm_id,
            buckets.len(),
            total_count,
            granularity
        );
        Ok(BucketPage {
            buckets,
            total_count,
        })
    }

    async fn fetch_year_over_year_totals(
        &self,
        farm_id: FarmId,
        range: &DateRange,
        _granularity: Granularity,
    ) -> RepositoryResult<YearOverYearTotals> {
        let data = self.data.read();
        Self::ensure_available(&data, "fetch_year_over_year_totals")?;

        let base_year = range.start.year();
        let mut totals = YearOverYearTotals::new();
        for years_back in 0..=YEARS_BACK {
            let window = range.shift_years_back(years_back);
            let acc = accumulate(in_window(&data.records, farm_id, &window));
            if acc.count > 0 {
                let year = base_year - years_back;
                totals.insert(year, acc.into_year_total(year));
            }
        }
        Ok(totals)
    }

    async fn fetch_sector_totals(
        &self,
        farm_id: FarmId,
        sector_id: Option<SectorId>,
        range: &DateRange,
    ) -> RepositoryResult<Vec<SectorTotal>> {
        let data = self.data.read();
        Self::ensure_available(&data, "fetch_sector_totals")?;

        let mut groups: BTreeMap<SectorId, Accumulator> = BTreeMap::new();
        for record in in_window(&data.records, farm_id, range)
            .filter(|r| sector_id.map_or(true, |id| r.sector_id == id))
        {
            groups.entry(record.sector_id).or_default().push(record);
        }

        Ok(groups
            .into_iter()
            .filter_map(|(id, acc)| {
                let sector = data.sectors.get(&id)?;
                Some(SectorTotal {
                    sector_id: id,
                    sector_name: sector.name.clone(),
                    total_real_amount: acc.real,
                    total_nominal_amount: acc.nominal,
                    event_count: acc.count,
                    avg_efficiency: acc.avg_efficiency(),
                })
            })
            .collect())
    }
}
