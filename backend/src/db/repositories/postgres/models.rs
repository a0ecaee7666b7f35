use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Double, Int4, Nullable, Text, Timestamptz};

use super::schema::{farms, irrigation_sectors};
use crate::models::{
    Farm, FarmId, IrrigationSector, SectorId, SectorTotal, TimeBucketAggregate, YearTotal,
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = farms)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FarmRow {
    pub id: i64,
    pub name: String,
}

impl From<FarmRow> for Farm {
    fn from(row: FarmRow) -> Self {
        Farm {
            id: FarmId::new(row.id),
            name: row.name,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = irrigation_sectors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SectorRow {
    pub id: i64,
    pub farm_id: i64,
    pub name: String,
}

impl From<SectorRow> for IrrigationSector {
    fn from(row: SectorRow) -> Self {
        IrrigationSector {
            id: SectorId::new(row.id),
            farm_id: FarmId::new(row.farm_id),
            name: row.name,
        }
    }
}

/// One row of the bucketed aggregate query.
#[derive(Debug, Clone, QueryableByName)]
pub struct BucketRow {
    #[diesel(sql_type = Timestamptz)]
    pub bucket_start: DateTime<Utc>,
    #[diesel(sql_type = Double)]
    pub total_real_amount: f64,
    #[diesel(sql_type = Double)]
    pub total_nominal_amount: f64,
    #[diesel(sql_type = BigInt)]
    pub event_count: i64,
    #[diesel(sql_type = Nullable<Double>)]
    pub avg_efficiency: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub min_efficiency: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub max_efficiency: Option<f64>,
}

impl From<BucketRow> for TimeBucketAggregate {
    fn from(row: BucketRow) -> Self {
        TimeBucketAggregate {
            bucket_start: row.bucket_start,
            total_real_amount: row.total_real_amount,
            total_nominal_amount: row.total_nominal_amount,
            event_count: row.event_count,
            avg_efficiency: row.avg_efficiency,
            min_efficiency: row.min_efficiency,
            max_efficiency: row.max_efficiency,
        }
    }
}

#[derive(Debug, Clone, QueryableByName)]
pub struct CountRow {
    #[diesel(sql_type = BigInt)]
    pub total: i64,
}

#[derive(Debug, Clone, QueryableByName)]
pub struct YearRow {
    #[diesel(sql_type = Int4)]
    pub year: i32,
    #[diesel(sql_type = Double)]
    pub total_real_amount: f64,
    #[diesel(sql_type = Double)]
    pub total_nominal_amount: f64,
    #[diesel(sql_type = BigInt)]
    pub event_count: i64,
    #[diesel(sql_type = Nullable<Double>)]
    pub avg_efficiency: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub min_efficiency: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub max_efficiency: Option<f64>,
}

impl From<YearRow> for YearTotal {
    fn from(row: YearRow) -> Self {
        YearTotal {
            year: row.year,
            total_real_amount: row.total_real_amount,
            total_nominal_amount: row.total_nominal_amount,
            event_count: row.event_count,
            avg_efficiency: row.avg_efficiency,
            min_efficiency: row.min_efficiency,
            max_efficiency: row.max_efficiency,
        }
    }
}

#[derive(Debug, Clone, QueryableByName)]
pub struct SectorTotalRow {
    #[diesel(sql_type = BigInt)]
    pub sector_id: i64,
    #[diesel(sql_type = Text)]
    pub sector_name: String,
    #[diesel(sql_type = Double)]
    pub total_real_amount: f64,
    #[diesel(sql_type = Double)]
    pub total_nominal_amount: f64,
    #[diesel(sql_type = BigInt)]
    pub event_count: i64,
    #[diesel(sql_type = Nullable<Double>)]
    pub avg_efficiency: Option<f64>,
}

impl From<SectorTotalRow> for SectorTotal {
    fn from(row: SectorTotalRow) -> Self {
        SectorTotal {
            sector_id: SectorId::new(row.sector_id),
            sector_name: row.sector_name,
            total_real_amount: row.total_real_amount,
            total_nominal_amount: row.total_nominal_amount,
            event_count: row.event_count,
            avg_efficiency: row.avg_efficiency,
        }
    }
}
