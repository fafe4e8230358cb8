//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    // Create migrations table if it doesn't exist
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    // Get current version
    let current_version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    // Run migrations
    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Get the currently applied schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- INGREDIENTS
        -- Catalog entries with nutrition facts per 100 g
        -- ============================================
        CREATE TABLE ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            brand TEXT,                          -- nullable, for branded products

            -- Nutrition facts (per 100 g)
            kcal REAL NOT NULL DEFAULT 0 CHECK(kcal >= 0),
            protein_g REAL NOT NULL DEFAULT 0 CHECK(protein_g >= 0),
            fat_g REAL NOT NULL DEFAULT 0 CHECK(fat_g >= 0),
            carbs_g REAL NOT NULL DEFAULT 0 CHECK(carbs_g >= 0),
            fiber_g REAL NOT NULL DEFAULT 0 CHECK(fiber_g >= 0),

            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_ingredients_name ON ingredients(name);

        -- ============================================
        -- MEALS
        -- Catalog dishes: facts per 100 g plus the weight of one serving
        -- ============================================
        CREATE TABLE meals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            serving_weight_g REAL NOT NULL CHECK(serving_weight_g > 0),

            -- Nutrition facts (per 100 g)
            kcal REAL NOT NULL DEFAULT 0 CHECK(kcal >= 0),
            protein_g REAL NOT NULL DEFAULT 0 CHECK(protein_g >= 0),
            fat_g REAL NOT NULL DEFAULT 0 CHECK(fat_g >= 0),
            carbs_g REAL NOT NULL DEFAULT 0 CHECK(carbs_g >= 0),
            fiber_g REAL NOT NULL DEFAULT 0 CHECK(fiber_g >= 0),

            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_meals_name ON meals(name);

        -- ============================================
        -- ACTIVITIES
        -- Activity definitions with MET ratings; exactly one logging mode
        -- ============================================
        CREATE TABLE activities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            met_value REAL NOT NULL CHECK(met_value > 0),
            supports_rep INTEGER NOT NULL DEFAULT 0,
            supports_hour INTEGER NOT NULL DEFAULT 0,
            category TEXT,                       -- e.g., "strength", "hiit"
            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),

            CHECK(supports_rep + supports_hour = 1)
        );

        CREATE INDEX idx_activities_name ON activities(name);

        -- ============================================
        -- DAILY LEDGERS
        -- One row per (user, calendar date); derived totals only
        -- ============================================
        CREATE TABLE daily_ledgers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            date TEXT NOT NULL,                  -- ISO date: "2026-01-09"

            total_kcal_eaten REAL NOT NULL DEFAULT 0,
            total_kcal_burned REAL NOT NULL DEFAULT 0,
            total_kcal REAL NOT NULL DEFAULT 0,  -- eaten - burned
            total_protein_g REAL NOT NULL DEFAULT 0,
            total_fat_g REAL NOT NULL DEFAULT 0,
            total_carbs_g REAL NOT NULL DEFAULT 0,
            total_fiber_g REAL NOT NULL DEFAULT 0,
            water_l REAL NOT NULL DEFAULT 0,

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),

            UNIQUE(user_id, date)
        );

        CREATE INDEX idx_daily_ledgers_date ON daily_ledgers(date);

        -- ============================================
        -- LOGGED INGREDIENTS
        -- Weighed portions attached to a ledger; totals cached at log time
        -- ============================================
        CREATE TABLE logged_ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ledger_id INTEGER NOT NULL REFERENCES daily_ledgers(id) ON DELETE CASCADE,
            ingredient_id INTEGER NOT NULL REFERENCES ingredients(id) ON DELETE RESTRICT,
            quantity_kg REAL NOT NULL CHECK(quantity_kg > 0),

            -- Absolute totals for this portion
            cached_kcal REAL NOT NULL DEFAULT 0,
            cached_protein_g REAL NOT NULL DEFAULT 0,
            cached_fat_g REAL NOT NULL DEFAULT 0,
            cached_carbs_g REAL NOT NULL DEFAULT 0,
            cached_fiber_g REAL NOT NULL DEFAULT 0,

            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_logged_ingredients_ledger ON logged_ingredients(ledger_id);

        -- ============================================
        -- LOGGED MEALS
        -- Meal servings attached to a ledger; totals cached at log time
        -- ============================================
        CREATE TABLE logged_meals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ledger_id INTEGER NOT NULL REFERENCES daily_ledgers(id) ON DELETE CASCADE,
            meal_id INTEGER NOT NULL REFERENCES meals(id) ON DELETE RESTRICT,
            servings REAL NOT NULL CHECK(servings > 0),
            quantity_kg REAL NOT NULL,           -- servings * serving_weight_g / 1000

            cached_kcal REAL NOT NULL DEFAULT 0,
            cached_protein_g REAL NOT NULL DEFAULT 0,
            cached_fat_g REAL NOT NULL DEFAULT 0,
            cached_carbs_g REAL NOT NULL DEFAULT 0,
            cached_fiber_g REAL NOT NULL DEFAULT 0,

            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_logged_meals_ledger ON logged_meals(ledger_id);

        -- ============================================
        -- ACTIVITY RECORDS
        -- Logged activity occurrences; burned kcal cached at log time
        -- ============================================
        CREATE TABLE activity_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ledger_id INTEGER NOT NULL REFERENCES daily_ledgers(id) ON DELETE CASCADE,
            activity_id INTEGER NOT NULL REFERENCES activities(id) ON DELETE RESTRICT,

            duration_minutes REAL,               -- hour-mode records
            reps REAL,                           -- rep-mode records
            intensity_level INTEGER NOT NULL DEFAULT 3 CHECK(intensity_level BETWEEN 1 AND 5),
            weight_kg REAL NOT NULL,             -- body weight used for the estimate

            cached_kcal_burned REAL NOT NULL DEFAULT 0,
            cached_duration_minutes REAL NOT NULL DEFAULT 0,  -- effective minutes, both modes

            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_activity_records_ledger ON activity_records(ledger_id);

        -- ============================================
        -- WATER ENTRIES
        -- Water intake attached to a ledger; summed on recompute
        -- ============================================
        CREATE TABLE water_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ledger_id INTEGER NOT NULL REFERENCES daily_ledgers(id) ON DELETE CASCADE,
            liters REAL NOT NULL CHECK(liters > 0),
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_water_entries_ledger ON water_entries(ledger_id);

        -- ============================================
        -- CHALLENGES
        -- Time-boxed targets scored against activity records
        -- ============================================
        CREATE TABLE challenges (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            start_date TEXT NOT NULL,            -- ISO date, inclusive
            end_date TEXT NOT NULL,              -- ISO date, inclusive
            target_duration_minutes REAL,
            target_kcal_burned REAL,
            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_challenges_user ON challenges(user_id);
        "#,
    )?;
    Ok(())
}
