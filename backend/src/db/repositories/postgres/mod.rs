//! Postgres repository implementation using Diesel.
//!
//! Aggregations run inside the database: records are grouped with
//! `date_trunc` over their UTC start time and efficiency statistics are
//! computed with `CASE WHEN nominal_amount > 0` so that non-positive nominal
//! amounts stay out of `AVG`/`MIN`/`MAX` while still counting toward sums.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Query statistics for monitoring
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//!
//! Operations are executed once. A failed query is reported to the caller
//! with its operation name and is never retried here.

use async_trait::async_trait;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel::sql_types::{BigInt, Int4, Nullable, Timestamptz};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;

use crate::db::repository::{
    AnalyticsRepository, ErrorContext, FarmRepository, RepositoryError, RepositoryResult,
};
use crate::models::{
    BucketPage, DateRange, Farm, FarmId, Granularity, IrrigationSector, SectorId, SectorTotal,
    YearOverYearTotals, YearTotal,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Number of earlier years compared against the requested window.
const YEARS_BACK: i32 = 2;

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
    /// - `PG_POOL_MAX`: Maximum pool size (default: 10)
    /// - `PG_POOL_MIN`: Minimum pool size (default: 1)
    /// - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
    /// - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    total_queries: Arc<AtomicU64>,
    failed_queries: Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    ///
    /// # Arguments
    /// * `config` - Database configuration
    ///
    /// # Returns
    /// * `Ok(PostgresRepository)` on success
    /// * `Err(RepositoryError)` if connection or migration fails
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }
        log::info!(
            "Postgres repository ready (pool max={}, min={})",
            config.max_pool_size,
            config.min_pool_size
        );

        Ok(Self {
            pool,
            config,
            total_queries: Arc::new(AtomicU64::new(0)),
            failed_queries: Arc::new(AtomicU64::new(0)),
        })
    }

    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Run `f` on a pooled connection inside `spawn_blocking`.
    ///
    /// Errors are tagged with `operation`. Dropping the returned future stops
    /// waiting for the result, but a query already running on the blocking
    /// pool completes in the background.
    async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();

        task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|e| {
                failed_queries.fetch_add(1, Ordering::Relaxed);
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new(operation).with_details("get_connection"),
                )
            })?;

            total_queries.fetch_add(1, Ordering::Relaxed);
            f(&mut conn).map_err(|e| {
                failed_queries.fetch_add(1, Ordering::Relaxed);
                e.with_operation(operation)
            })
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new(operation).with_details("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
        }
    }

    /// Check if the database connection is healthy.
    pub async fn is_healthy(&self) -> bool {
        self.health_check().await.unwrap_or(false)
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

/// Efficiency of one row, NULL when the nominal amount is not positive.
fn efficiency_expr(qualifier: &str) -> String {
    format!(
        "CASE WHEN {q}nominal_amount > 0 THEN {q}real_amount / {q}nominal_amount END",
        q = qualifier
    )
}

fn bucketed_sql(granularity: Granularity) -> String {
    format!(
        "SELECT date_trunc('{unit}', start_time AT TIME ZONE 'UTC') AT TIME ZONE 'UTC' AS bucket_start, \
                COALESCE(SUM(real_amount), 0)::float8 AS total_real_amount, \
                COALESCE(SUM(nominal_amount), 0)::float8 AS total_nominal_amount, \
                COUNT(*) AS event_count, \
                AVG({eff})::float8 AS avg_efficiency, \
                MIN({eff})::float8 AS min_efficiency, \
                MAX({eff})::float8 AS max_efficiency \
         FROM irrigation_data \
         WHERE farm_id = $1 AND start_time >= $2 AND start_time <= $3 \
         GROUP BY 1 \
         ORDER BY 1 \
         LIMIT $4 OFFSET $5",
        unit = granularity.trunc_unit(),
        eff = efficiency_expr(""),
    )
}

fn bucket_count_sql(granularity: Granularity) -> String {
    format!(
        "SELECT COUNT(DISTINCT date_trunc('{unit}', start_time AT TIME ZONE 'UTC')) AS total \
         FROM irrigation_data \
         WHERE farm_id = $1 AND start_time >= $2 AND start_time <= $3",
        unit = granularity.trunc_unit(),
    )
}

/// One sub-select per year, combined with `UNION ALL`.
///
/// `$1` is the farm id; each year then binds `(year, start, end)`.
fn year_over_year_sql(years: usize) -> String {
    (0..years)
        .map(|i| {
            let p = 2 + i * 3;
            format!(
                "SELECT ${year}::int4 AS year, \
                        COALESCE(SUM(real_amount), 0)::float8 AS total_real_amount, \
                        COALESCE(SUM(nominal_amount), 0)::float8 AS total_nominal_amount, \
                        COUNT(*) AS event_count, \
                        AVG({eff})::float8 AS avg_efficiency, \
                        MIN({eff})::float8 AS min_efficiency, \
                        MAX({eff})::float8 AS max_efficiency \
                 FROM irrigation_data \
                 WHERE farm_id = $1 AND start_time >= ${start} AND start_time <= ${end} \
                 HAVING COUNT(*) > 0",
                year = p,
                start = p + 1,
                end = p + 2,
                eff = efficiency_expr(""),
            )
        })
        .collect::<Vec<_>>()
        .join(" UNION ALL ")
}

fn sector_totals_sql() -> String {
    format!(
        "SELECT s.id AS sector_id, \
                s.name AS sector_name, \
                COALESCE(SUM(d.real_amount), 0)::float8 AS total_real_amount, \
                COALESCE(SUM(d.nominal_amount), 0)::float8 AS total_nominal_amount, \
                COUNT(*) AS event_count, \
                AVG({eff})::float8 AS avg_efficiency \
         FROM irrigation_data d \
         JOIN irrigation_sectors s ON s.id = d.irrigation_sector_id \
         WHERE d.farm_id = $1 AND d.start_time >= $2 AND d.start_time <= $3 \
           AND ($4::int8 IS NULL OR d.irrigation_sector_id = $4) \
         GROUP BY s.id, s.name \
         ORDER BY s.id",
        eff = efficiency_expr("d."),
    )
}

#[async_trait]
impl FarmRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn("health_check", |conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_farm(&self, farm_id: FarmId) -> RepositoryResult<Option<Farm>> {
        self.with_conn("get_farm", move |conn| {
            farms::table
                .find(farm_id.value())
                .select(FarmRow::as_select())
                .first::<FarmRow>(conn)
                .optional()
                .map(|row| row.map(Farm::from))
                .map_err(|e| map_diesel_error(e).with_entity("farm", farm_id))
        })
        .await
    }

    async fn list_sectors(&self, farm_id: FarmId) -> RepositoryResult<Vec<IrrigationSector>> {
        self.with_conn("list_sectors", move |conn| {
            irrigation_sectors::table
                .filter(irrigation_sectors::farm_id.eq(farm_id.value()))
                .order(irrigation_sectors::id.asc())
                .select(SectorRow::as_select())
                .load::<SectorRow>(conn)
                .map(|rows| rows.into_iter().map(IrrigationSector::from).collect())
                .map_err(|e| map_diesel_error(e).with_entity("farm", farm_id))
        })
        .await
    }
}

#[async_trait]
impl AnalyticsRepository for PostgresRepository {
    async fn fetch_bucketed_aggregates(
        &self,
        farm_id: FarmId,
        range: &DateRange,
        granularity: Granularity,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<BucketPage> {
        let range = *range;
        self.with_conn("fetch_bucketed_aggregates", move |conn| {
            let rows = sql_query(bucketed_sql(granularity))
                .bind::<BigInt, _>(farm_id.value())
                .bind::<Timestamptz, _>(range.start)
                .bind::<Timestamptz, _>(range.end)
                .bind::<BigInt, _>(limit.max(0))
                .bind::<BigInt, _>(offset.max(0))
                .load::<BucketRow>(conn)
                .map_err(map_diesel_error)?;

            let count = sql_query(bucket_count_sql(granularity))
                .bind::<BigInt, _>(farm_id.value())
                .bind::<Timestamptz, _>(range.start)
                .bind::<Timestamptz, _>(range.end)
                .get_result::<CountRow>(conn)
                .map_err(map_diesel_error)?;

            Ok(BucketPage {
                buckets: rows.into_iter().map(Into::into).collect(),
                total_count: count.total,
            })
        })
        .await
        .map_err(|e| e.with_entity("farm", farm_id))
    }

    async fn fetch_year_over_year_totals(
        &self,
        farm_id: FarmId,
        range: &DateRange,
        _granularity: Granularity,
    ) -> RepositoryResult<YearOverYearTotals> {
        use chrono::Datelike;

        let base_year = range.start.year();
        let windows: Vec<(i32, DateRange)> = (0..=YEARS_BACK)
            .map(|back| (base_year - back, range.shift_years_back(back)))
            .collect();

        self.with_conn("fetch_year_over_year_totals", move |conn| {
            let mut query = sql_query(year_over_year_sql(windows.len()))
                .into_boxed::<Pg>()
                .bind::<BigInt, _>(farm_id.value());
            for (year, window) in &windows {
                query = query
                    .bind::<Int4, _>(*year)
                    .bind::<Timestamptz, _>(window.start)
                    .bind::<Timestamptz, _>(window.end);
            }

            let rows = query.load::<YearRow>(conn).map_err(map_diesel_error)?;
            Ok(rows
                .into_iter()
                .map(|row| (row.year, YearTotal::from(row)))
                .collect())
        })
        .await
        .map_err(|e| e.with_entity("farm", farm_id))
    }

    async fn fetch_sector_totals(
        &self,
        farm_id: FarmId,
        sector_id: Option<SectorId>,
        range: &DateRange,
    ) -> RepositoryResult<Vec<SectorTotal>> {
        let range = *range;
        self.with_conn("fetch_sector_totals", move |conn| {
            sql_query(sector_totals_sql())
                .bind::<BigInt, _>(farm_id.value())
                .bind::<Timestamptz, _>(range.start)
                .bind::<Timestamptz, _>(range.end)
                .bind::<Nullable<BigInt>, _>(sector_id.map(|id| id.value()))
                .load::<SectorTotalRow>(conn)
                .map(|rows| rows.into_iter().map(Into::into).collect())
                .map_err(map_diesel_error)
        })
        .await
        .map_err(|e| e.with_entity("farm", farm_id))
    }
}
