//! Daily Ledger Tools
//!
//! Tools for managing daily ledgers and logging food, activity, and water
//! against them. Every log operation get-or-creates the target day's
//! ledger, computes the entry's totals through the engine, then recomputes
//! the ledger from its full linked set.

use serde::Serialize;

use crate::db::{Database, DbError};
use crate::engine::energy::EnergyConfig;
use crate::models::{
    normalize_date, recompute_ledger, ActivityRecord, ActivityRecordCreate, DailyLedger,
    LedgerTotals, LoggedIngredient, LoggedIngredientCreate, LoggedMeal, LoggedMealCreate,
    NutritionFact, WaterEntry,
};

/// Response for get_or_create_day
#[derive(Debug, Serialize)]
pub struct GetOrCreateDayResponse {
    pub ledger_id: i64,
    pub user_id: i64,
    pub date: String,
    pub created: bool, // true if newly created, false if already existed
}

/// Day with all linked entries for detailed view
#[derive(Debug, Serialize)]
pub struct DayDetail {
    pub ledger_id: i64,
    pub user_id: i64,
    pub date: String,
    pub totals: LedgerTotals,
    pub logged_ingredients: Vec<LoggedIngredient>,
    pub logged_meals: Vec<LoggedMeal>,
    pub activity_records: Vec<ActivityRecord>,
    pub water_entries: Vec<WaterEntry>,
}

/// Day summary for listing
#[derive(Debug, Serialize)]
pub struct DaySummary {
    pub ledger_id: i64,
    pub date: String,
    pub total_kcal_eaten: f64,
    pub total_kcal_burned: f64,
    pub total_kcal: f64,
    pub total_protein_g: f64,
    pub water_l: f64,
}

/// Response for list_days
#[derive(Debug, Serialize)]
pub struct ListDaysResponse {
    pub days: Vec<DaySummary>,
    pub total: usize,
    pub limit: i64,
    pub offset: i64,
}

/// Response for log_ingredient / log_meal
#[derive(Debug, Serialize)]
pub struct LogFoodResponse {
    pub entry_id: i64,
    pub ledger_id: i64,
    pub date: String,
    pub quantity_kg: f64,
    pub entry_totals: NutritionFact,
    pub day_totals: LedgerTotals,
}

/// Response for log_activity
#[derive(Debug, Serialize)]
pub struct LogActivityResponse {
    pub record_id: i64,
    pub ledger_id: i64,
    pub date: String,
    pub kcal_burned: f64,
    pub effective_minutes: f64,
    pub day_totals: LedgerTotals,
}

/// Response for log_water
#[derive(Debug, Serialize)]
pub struct LogWaterResponse {
    pub entry_id: i64,
    pub ledger_id: i64,
    pub date: String,
    pub liters: f64,
    pub water_l_total: f64,
}

/// Response for recompute_day
#[derive(Debug, Serialize)]
pub struct RecomputeDayResponse {
    pub ledger_id: i64,
    pub date: String,
    pub totals: LedgerTotals,
}

/// Response for entry deletion
#[derive(Debug, Serialize)]
pub struct DeleteEntryResponse {
    pub deleted: bool,
}

// ============================================================================
// Day Tools
// ============================================================================

/// Get or create the ledger for a user and date
pub fn get_or_create_day(
    db: &Database,
    user_id: i64,
    date: &str,
) -> Result<GetOrCreateDayResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    // Existence check only feeds the `created` flag; creation itself is a
    // single upsert keyed on (user_id, date)
    let normalized = normalize_date(date).map_err(|e| e.to_string())?;
    let existed = DailyLedger::get_by_user_date(&conn, user_id, &normalized)
        .map_err(|e| format!("Failed to check day: {}", e))?
        .is_some();

    let ledger = DailyLedger::get_or_create(&conn, user_id, date)
        .map_err(|e| format!("Failed to get/create day: {}", e))?;

    Ok(GetOrCreateDayResponse {
        ledger_id: ledger.id,
        user_id: ledger.user_id,
        date: ledger.date,
        created: !existed,
    })
}

/// Get a day with all linked entries
pub fn get_day(db: &Database, user_id: i64, date: &str) -> Result<Option<DayDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let normalized = normalize_date(date).map_err(|e| e.to_string())?;
    let ledger = DailyLedger::get_by_user_date(&conn, user_id, &normalized)
        .map_err(|e| format!("Failed to get day: {}", e))?;

    match ledger {
        Some(ledger) => {
            let logged_ingredients = LoggedIngredient::list_for_ledger(&conn, ledger.id)
                .map_err(|e| format!("Failed to get logged ingredients: {}", e))?;
            let logged_meals = LoggedMeal::list_for_ledger(&conn, ledger.id)
                .map_err(|e| format!("Failed to get logged meals: {}", e))?;
            let activity_records = ActivityRecord::list_for_ledger(&conn, ledger.id)
                .map_err(|e| format!("Failed to get activity records: {}", e))?;
            let water_entries = WaterEntry::list_for_ledger(&conn, ledger.id)
                .map_err(|e| format!("Failed to get water entries: {}", e))?;

            Ok(Some(DayDetail {
                ledger_id: ledger.id,
                user_id: ledger.user_id,
                date: ledger.date,
                totals: ledger.totals,
                logged_ingredients,
                logged_meals,
                activity_records,
                water_entries,
            }))
        }
        None => Ok(None),
    }
}

/// List a user's days with optional date range
pub fn list_days(
    db: &Database,
    user_id: i64,
    start_date: Option<&str>,
    end_date: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<ListDaysResponse, String> {
    let limit = limit.clamp(1, 200);
    let offset = offset.max(0);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let ledgers = DailyLedger::list_for_user(&conn, user_id, start_date, end_date, limit, offset)
        .map_err(|e| format!("Failed to list days: {}", e))?;

    let days: Vec<DaySummary> = ledgers
        .into_iter()
        .map(|l| DaySummary {
            ledger_id: l.id,
            date: l.date,
            total_kcal_eaten: l.totals.total_kcal_eaten,
            total_kcal_burned: l.totals.total_kcal_burned,
            total_kcal: l.totals.total_kcal,
            total_protein_g: l.totals.total_protein_g,
            water_l: l.totals.water_l,
        })
        .collect();

    let total = days.len();

    Ok(ListDaysResponse {
        days,
        total,
        limit,
        offset,
    })
}

/// Force recompute a day's totals from its linked entries
pub fn recompute_day(db: &Database, user_id: i64, date: &str) -> Result<RecomputeDayResponse, String> {
    let normalized = normalize_date(date).map_err(|e| e.to_string())?;

    db.with_conn_mut(|conn| {
        let ledger = DailyLedger::get_by_user_date(conn, user_id, &normalized)?
            .ok_or(DbError::NotFound("daily ledger"))?;
        let totals = recompute_ledger(conn, ledger.id)?;
        Ok(RecomputeDayResponse {
            ledger_id: ledger.id,
            date: ledger.date,
            totals,
        })
    })
    .map_err(|e| format!("Failed to recompute day: {}", e))
}

// ============================================================================
// Logging Tools
// ============================================================================

/// Log a weighed ingredient portion for a user's day
pub fn log_ingredient(
    db: &Database,
    user_id: i64,
    date: &str,
    ingredient_id: i64,
    quantity_kg: f64,
    notes: Option<String>,
) -> Result<LogFoodResponse, String> {
    db.with_conn_mut(|conn| {
        let ledger = DailyLedger::get_or_create(conn, user_id, date)?;
        let entry = LoggedIngredient::create(
            conn,
            &LoggedIngredientCreate {
                ledger_id: ledger.id,
                ingredient_id,
                quantity_kg,
                notes,
            },
        )?;
        let updated = DailyLedger::get_by_id(conn, ledger.id)?
            .ok_or(DbError::NotFound("daily ledger"))?;

        Ok(LogFoodResponse {
            entry_id: entry.id,
            ledger_id: ledger.id,
            date: updated.date,
            quantity_kg: entry.quantity_kg,
            entry_totals: entry.cached_totals,
            day_totals: updated.totals,
        })
    })
    .map_err(|e| format!("Failed to log ingredient: {}", e))
}

/// Log a meal serving for a user's day
pub fn log_meal(
    db: &Database,
    user_id: i64,
    date: &str,
    meal_id: i64,
    servings: f64,
    notes: Option<String>,
) -> Result<LogFoodResponse, String> {
    db.with_conn_mut(|conn| {
        let ledger = DailyLedger::get_or_create(conn, user_id, date)?;
        let entry = LoggedMeal::create(
            conn,
            &LoggedMealCreate {
                ledger_id: ledger.id,
                meal_id,
                servings,
                notes,
            },
        )?;
        let updated = DailyLedger::get_by_id(conn, ledger.id)?
            .ok_or(DbError::NotFound("daily ledger"))?;

        Ok(LogFoodResponse {
            entry_id: entry.id,
            ledger_id: ledger.id,
            date: updated.date,
            quantity_kg: entry.quantity_kg,
            entry_totals: entry.cached_totals,
            day_totals: updated.totals,
        })
    })
    .map_err(|e| format!("Failed to log meal: {}", e))
}

/// Log an activity occurrence for a user's day
#[allow(clippy::too_many_arguments)]
pub fn log_activity(
    db: &Database,
    config: &EnergyConfig,
    user_id: i64,
    date: &str,
    activity_id: i64,
    duration_minutes: Option<f64>,
    reps: Option<f64>,
    intensity_level: Option<u8>,
    weight_kg: Option<f64>,
    notes: Option<String>,
) -> Result<LogActivityResponse, String> {
    db.with_conn_mut(|conn| {
        let ledger = DailyLedger::get_or_create(conn, user_id, date)?;
        let record = ActivityRecord::create(
            conn,
            &ActivityRecordCreate {
                ledger_id: ledger.id,
                activity_id,
                duration_minutes,
                reps,
                intensity_level,
                weight_kg,
                notes,
            },
            config,
        )?;
        let updated = DailyLedger::get_by_id(conn, ledger.id)?
            .ok_or(DbError::NotFound("daily ledger"))?;

        Ok(LogActivityResponse {
            record_id: record.id,
            ledger_id: ledger.id,
            date: updated.date,
            kcal_burned: record.cached_kcal_burned,
            effective_minutes: record.cached_duration_minutes,
            day_totals: updated.totals,
        })
    })
    .map_err(|e| format!("Failed to log activity: {}", e))
}

/// Log water intake for a user's day
pub fn log_water(
    db: &Database,
    user_id: i64,
    date: &str,
    liters: f64,
) -> Result<LogWaterResponse, String> {
    db.with_conn_mut(|conn| {
        let ledger = DailyLedger::get_or_create(conn, user_id, date)?;
        let entry = WaterEntry::create(conn, ledger.id, liters)?;
        let updated = DailyLedger::get_by_id(conn, ledger.id)?
            .ok_or(DbError::NotFound("daily ledger"))?;

        Ok(LogWaterResponse {
            entry_id: entry.id,
            ledger_id: ledger.id,
            date: updated.date,
            liters: entry.liters,
            water_l_total: updated.totals.water_l,
        })
    })
    .map_err(|e| format!("Failed to log water: {}", e))
}

// ============================================================================
// Entry Deletion Tools
// ============================================================================

/// Delete a logged ingredient entry
pub fn delete_logged_ingredient(db: &Database, id: i64) -> Result<DeleteEntryResponse, String> {
    db.with_conn_mut(|conn| {
        let deleted = LoggedIngredient::delete(conn, id)?;
        Ok(DeleteEntryResponse { deleted })
    })
    .map_err(|e| format!("Failed to delete logged ingredient: {}", e))
}

/// Delete a logged meal entry
pub fn delete_logged_meal(db: &Database, id: i64) -> Result<DeleteEntryResponse, String> {
    db.with_conn_mut(|conn| {
        let deleted = LoggedMeal::delete(conn, id)?;
        Ok(DeleteEntryResponse { deleted })
    })
    .map_err(|e| format!("Failed to delete logged meal: {}", e))
}

/// Delete an activity record
pub fn delete_activity_record(db: &Database, id: i64) -> Result<DeleteEntryResponse, String> {
    db.with_conn_mut(|conn| {
        let deleted = ActivityRecord::delete(conn, id)?;
        Ok(DeleteEntryResponse { deleted })
    })
    .map_err(|e| format!("Failed to delete activity record: {}", e))
}

/// Delete a water entry
pub fn delete_water_entry(db: &Database, id: i64) -> Result<DeleteEntryResponse, String> {
    db.with_conn_mut(|conn| {
        let deleted = WaterEntry::delete(conn, id)?;
        Ok(DeleteEntryResponse { deleted })
    })
    .map_err(|e| format!("Failed to delete water entry: {}", e))
}
