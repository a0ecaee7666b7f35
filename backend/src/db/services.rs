//! High-level farm directory operations over any repository.

use super::repository::{
    ErrorContext, FarmRepository, RepositoryError, RepositoryResult,
};
use crate::models::{Farm, FarmId, IrrigationSector};

/// Check that the repository answers.
pub async fn health_check<R: FarmRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

/// Look up a farm, `None` when it does not exist.
pub async fn find_farm<R: FarmRepository + ?Sized>(
    repo: &R,
    farm_id: FarmId,
) -> RepositoryResult<Option<Farm>> {
    repo.get_farm(farm_id).await
}

/// Look up a farm, turning absence into a `NotFound` error.
pub async fn require_farm<R: FarmRepository + ?Sized>(
    repo: &R,
    farm_id: FarmId,
) -> RepositoryResult<Farm> {
    repo.get_farm(farm_id).await?.ok_or_else(|| {
        RepositoryError::not_found_with_context(
            format!("farm {} not found", farm_id),
            ErrorContext::new("require_farm")
                .with_entity("farm")
                .with_entity_id(farm_id),
        )
    })
}

/// Sectors of an existing farm ordered by id.
pub async fn list_sectors<R: FarmRepository + ?Sized>(
    repo: &R,
    farm_id: FarmId,
) -> RepositoryResult<(Farm, Vec<IrrigationSector>)> {
    let farm = require_farm(repo, farm_id).await?;
    let sectors = repo.list_sectors(farm_id).await?;
    Ok((farm, sectors))
}

#[cfg(test)]
#[path = "services_tests.rs"]
mod services_tests;
