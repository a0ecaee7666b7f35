//! Persisted entities read by the analytics pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_id_type!(i64, FarmId);
crate::define_id_type!(i64, SectorId);

/// Farm identity and display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Farm {
    pub id: FarmId,
    pub name: String,
}

/// Irrigation sector; belongs to exactly one farm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationSector {
    pub id: SectorId,
    pub farm_id: FarmId,
    pub name: String,
}

/// One irrigation event.
///
/// Amounts are millimeters and may be zero or negative; upstream data is
/// trusted as-is (including `start_time <= end_time`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationRecord {
    pub farm_id: FarmId,
    pub sector_id: SectorId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Planned volume (mm)
    pub nominal_amount: f64,
    /// Delivered volume (mm)
    pub real_amount: f64,
}

impl IrrigationRecord {
    /// `real / nominal`, or `None` when the nominal amount is not positive.
    pub fn efficiency(&self) -> Option<f64> {
        (self.nominal_amount > 0.0).then(|| self.real_amount / self.nominal_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(nominal: f64, real: f64) -> IrrigationRecord {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap();
        IrrigationRecord {
            farm_id: FarmId::new(1),
            sector_id: SectorId::new(1),
            start_time: ts,
            end_time: ts,
            nominal_amount: nominal,
            real_amount: real,
        }
    }

    #[test]
    fn test_efficiency_ratio() {
        assert_eq!(record(10.0, 8.0).efficiency(), Some(0.8));
    }

    #[test]
    fn test_efficiency_undefined_for_non_positive_nominal() {
        assert_eq!(record(0.0, 5.0).efficiency(), None);
        assert_eq!(record(-2.0, 5.0).efficiency(), None);
    }

    #[test]
    fn test_id_types() {
        let id: FarmId = "42".parse().unwrap();
        assert_eq!(id, FarmId::new(42));
        assert_eq!(id.to_string(), "42");
        assert_eq!(i64::from(SectorId::from(7)), 7);
        assert!("abc".parse::<FarmId>().is_err());
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
    }
}
