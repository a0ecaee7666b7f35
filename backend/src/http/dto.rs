//! Data Transfer Objects for the HTTP API.
//!
//! Response documents live in the routes module; this module re-exports them
//! next to the DTOs that only the HTTP layer needs.

use serde::{Deserialize, Serialize};

pub use crate::api::{
    // Analytics
    AnalysisPeriod, EfficiencyRange, IrrigationAnalytics, PaginationInfo, PercentageChange,
    PeriodComparison, PeriodMetrics, SectorBreakdown, TimeSeries, TimeSeriesPoint,
    YearOverYearComparison,
    // Farms
    SectorInfo, SectorListResponse,
};
pub use crate::services::AnalyticsParams;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `unhealthy`
    pub status: String,
    pub message: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}
