//! # Irrigation Analytics Backend
//!
//! REST analytics over farm irrigation events.
//!
//! For a farm and a date window the backend reports volume and efficiency
//! metrics, compares them against the same calendar window one and two
//! years earlier, and breaks the period down into a paginated time series
//! and per-sector totals.
//!
//! ## Architecture
//!
//! - [`api`]: Public types and response DTOs
//! - [`models`]: Domain types (farms, sectors, records, aggregates, time)
//! - [`db`]: Repository traits, in-memory and PostgreSQL backends
//! - [`services`]: Request normalization and the analytics pipeline
//! - [`routes`]: Response documents and route constants
//! - [`http`]: Axum-based HTTP server and request handlers
//! - [`config`]: Server settings from the environment

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;
pub mod config;

pub mod db;
pub mod models;

pub mod routes;

pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
