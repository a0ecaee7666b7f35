pub mod analytics;
pub mod farms;
