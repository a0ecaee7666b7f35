//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::{Days, Duration, NaiveDate, TimeZone, Utc};
use irrigation_analytics::db::repositories::LocalRepository;
use irrigation_analytics::models::{Farm, FarmId, IrrigationRecord, IrrigationSector, SectorId};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK poisoned");
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

// =============================================================================
// Seed fixtures
// =============================================================================

/// Farm with irrigation history in March 2022-2024 and January 2018-2019.
pub const FARM_WITH_HISTORY: i64 = 1;
/// Farm whose only records are in January 2023.
pub const FARM_WITHOUT_HISTORY: i64 = 2;

/// Events seeded per 7-day period by [`seed_weekly_pattern`].
pub const EVENTS_PER_WEEK: usize = 9;

pub fn farm(id: i64, name: &str) -> Farm {
    Farm {
        id: FarmId::new(id),
        name: name.to_string(),
    }
}

pub fn sector(id: i64, farm_id: i64, name: &str) -> IrrigationSector {
    IrrigationSector {
        id: SectorId::new(id),
        farm_id: FarmId::new(farm_id),
        name: name.to_string(),
    }
}

/// Two-hour irrigation event starting at `date` + `hour`.
pub fn record(
    farm_id: i64,
    sector_id: i64,
    date: NaiveDate,
    hour: u32,
    nominal: f64,
    real: f64,
) -> IrrigationRecord {
    let start = Utc.from_utc_datetime(&date.and_hms_opt(hour, 0, 0).expect("valid hour"));
    IrrigationRecord {
        farm_id: FarmId::new(farm_id),
        sector_id: SectorId::new(sector_id),
        start_time: start,
        end_time: start + Duration::hours(2),
        nominal_amount: nominal,
        real_amount: real,
    }
}

/// Seed four consecutive 7-day periods starting on the first of the month.
///
/// Each period gets [`EVENTS_PER_WEEK`] events spread over all seven days,
/// alternating between the two given sectors. Days 29-31 stay empty.
pub fn seed_weekly_pattern(
    repo: &LocalRepository,
    farm_id: i64,
    sectors: (i64, i64),
    year: i32,
    month: u32,
) {
    let first = NaiveDate::from_ymd_opt(year, month, 1).expect("valid month");
    let mut records = Vec::new();
    for week in 0..4u64 {
        for i in 0..EVENTS_PER_WEEK {
            let date = first + Days::new(week * 7 + (i % 7) as u64);
            let sector = if i % 2 == 0 { sectors.0 } else { sectors.1 };
            let real = 8.0 + (i % 3) as f64;
            records.push(record(farm_id, sector, date, 5 + i as u32, 10.0, real));
        }
    }
    repo.insert_records(records).expect("seed records");
}

/// Repository with two farms used by the HTTP scenarios.
pub fn scenario_repository() -> LocalRepository {
    let repo = LocalRepository::new();

    repo.insert_farm(farm(FARM_WITH_HISTORY, "Finca Norte")).expect("farm");
    repo.insert_sector(sector(1, FARM_WITH_HISTORY, "North Block")).expect("sector");
    repo.insert_sector(sector(2, FARM_WITH_HISTORY, "South Block")).expect("sector");
    for year in [2022, 2023, 2024] {
        seed_weekly_pattern(&repo, FARM_WITH_HISTORY, (1, 2), year, 3);
    }
    for year in [2018, 2019] {
        seed_weekly_pattern(&repo, FARM_WITH_HISTORY, (1, 2), year, 1);
    }

    repo.insert_farm(farm(FARM_WITHOUT_HISTORY, "Finca Sur")).expect("farm");
    repo.insert_sector(sector(3, FARM_WITHOUT_HISTORY, "Vineyard")).expect("sector");
    seed_weekly_pattern(&repo, FARM_WITHOUT_HISTORY, (3, 3), 2023, 1);

    repo
}
