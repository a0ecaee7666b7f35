//! Service layer for the analytics pipeline.
//!
//! Services sit between the HTTP handlers and the repository traits:
//! `request` normalizes raw query parameters, `analytics` fetches the three
//! aggregate sets and `metrics` reduces them into the response document.

pub mod analytics;
pub mod error;
pub mod metrics;
pub mod request;

pub use analytics::get_irrigation_analytics;
pub use error::AnalyticsError;
pub use request::{AnalyticsParams, AnalyticsRequest, Pagination};
