//! Farm directory: existence checks and sector metadata.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Farm, FarmId, IrrigationSector};

/// Read access to farms and their sectors.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait FarmRepository: Send + Sync {
    /// Check that the backing store answers.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Look up a farm.
    ///
    /// # Returns
    /// * `Ok(Some(Farm))` - The farm exists
    /// * `Ok(None)` - No farm has this identifier
    /// * `Err(RepositoryError)` - If the lookup fails
    async fn get_farm(&self, farm_id: FarmId) -> RepositoryResult<Option<Farm>>;

    /// Sectors of a farm, ascending by sector id.
    async fn list_sectors(&self, farm_id: FarmId) -> RepositoryResult<Vec<IrrigationSector>>;
}
