//! Repository traits.
//!
//! Concerns are split into separate traits and recombined in
//! [`FullRepository`], which every backend gets through a blanket impl.
//! The HTTP layer holds an `Arc<dyn FullRepository>`.

pub mod analytics;
pub mod error;
pub mod farm;

pub use analytics::AnalyticsRepository;
pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use farm::FarmRepository;

/// Every repository concern the application needs.
pub trait FullRepository: FarmRepository + AnalyticsRepository {}

impl<T> FullRepository for T where T: FarmRepository + AnalyticsRepository {}
