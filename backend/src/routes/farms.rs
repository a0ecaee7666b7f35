use serde::{Deserialize, Serialize};

use crate::api::{FarmId, IrrigationSector, SectorId};

/// Sector entry in a farm's sector listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorInfo {
    pub sector_id: SectorId,
    pub sector_name: String,
}

impl From<IrrigationSector> for SectorInfo {
    fn from(sector: IrrigationSector) -> Self {
        Self {
            sector_id: sector.id,
            sector_name: sector.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorListResponse {
    pub farm_id: FarmId,
    pub sectors: Vec<SectorInfo>,
    pub total: usize,
}

pub const LIST_SECTORS: &str = "list_sectors";
pub const FARM_SECTORS_PATH: &str = "/farms/{farm_id}/sectors";
