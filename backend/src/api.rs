//! Public API surface for the analytics backend.
//!
//! Consolidates identifiers, domain types and the DTOs of the HTTP API.
//! All DTOs derive Serialize/Deserialize for JSON serialization.

pub use crate::models::{
    DateRange, Farm, FarmId, Granularity, IrrigationRecord, IrrigationSector, SectorId,
};
pub use crate::routes::analytics::AnalysisPeriod;
pub use crate::routes::analytics::EfficiencyRange;
pub use crate::routes::analytics::IrrigationAnalytics;
pub use crate::routes::analytics::PaginationInfo;
pub use crate::routes::analytics::PercentageChange;
pub use crate::routes::analytics::PeriodComparison;
pub use crate::routes::analytics::PeriodMetrics;
pub use crate::routes::analytics::SectorBreakdown;
pub use crate::routes::analytics::TimeSeries;
pub use crate::routes::analytics::TimeSeriesPoint;
pub use crate::routes::analytics::YearOverYearComparison;
pub use crate::routes::farms::SectorInfo;
pub use crate::routes::farms::SectorListResponse;
