//! FitLedger Status Tool
//!
//! Provides runtime status information about the FitLedger service.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::db::Database;

/// Logging instructions for AI assistants
pub const LOGGING_INSTRUCTIONS: &str = r#"
# FitLedger Logging Instructions

How to log food, activity, and water with the FitLedger tools.

## Concepts

1. **Catalog** - Ingredients (nutrition per 100g) and meals (per 100g plus
   the weight of one serving). Create these once, reuse them for logging.
2. **Activities** - Definitions with a MET rating. Each one is logged
   either by duration in minutes (hour mode) or by repetition count (rep
   mode), never both.
3. **Daily ledger** - One record per user per date holding the day's
   totals. It is created automatically on the first log of any kind and
   its totals are recomputed from all entries on every change.
4. **Challenges** - Time-boxed targets (total minutes and/or total kcal
   burned) scored against activity records on demand.

## Logging food

1. Find or create the catalog entry: `search_ingredients` / `add_ingredient`
   (nutrition per 100g) or `search_meals` / `add_meal`.
2. Log it: `log_ingredient` with quantity_kg (0.150 = 150g) or `log_meal`
   with a serving count. The day is created automatically.
3. Read back: `get_day` returns all entries plus the day's totals.

## Logging activity

1. Find or create the definition: `search_activities` / `add_activity`.
   Set exactly one of supports_rep / supports_hour.
2. Log it: `log_activity` with duration_minutes (hour mode) or reps (rep
   mode), an optional intensity_level 1-5 (default 3), and the user's
   body weight in kg. Burned calories are estimated from the MET value.

## Converting package nutrition to per-100g

Most packages show nutrition per serving. Convert with
`(value / serving_grams) * 100` before calling `add_ingredient`.

Example: 190 kcal per 32g serving -> (190 / 32) * 100 = 594 kcal per 100g.

## Dates

Pass dates as YYYY-MM-DD. Timestamps are accepted; any time-of-day
component is discarded, so all logs with the same calendar date land on
the same ledger.
"#;

/// Complete service status
#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,
    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub counts: Option<TableCounts>,
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Row counts of the main tables
#[derive(Debug, Serialize)]
pub struct TableCounts {
    pub ingredients: i64,
    pub meals: i64,
    pub activities: i64,
    pub daily_ledgers: i64,
    pub logged_entries: i64,
    pub challenges: i64,
}

/// Tracks service runtime status
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    /// Create a new status tracker
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Get the current status
    pub fn get_status(&self, db: &Database) -> ServiceStatus {
        let build_info = BuildInfo::current();

        // Get database size if it exists
        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let counts = table_counts(db).ok();

        // Get process info
        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        ServiceStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            counts,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

fn table_counts(db: &Database) -> crate::db::DbResult<TableCounts> {
    db.with_conn(|conn| {
        let count = |table: &str| -> rusqlite::Result<i64> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })
        };

        let logged_entries = count("logged_ingredients")?
            + count("logged_meals")?
            + count("activity_records")?
            + count("water_entries")?;

        Ok(TableCounts {
            ingredients: count("ingredients")?,
            meals: count("meals")?,
            activities: count("activities")?,
            daily_ledgers: count("daily_ledgers")?,
            logged_entries,
            challenges: count("challenges")?,
        })
    })
}
