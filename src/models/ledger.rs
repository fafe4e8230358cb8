//! Daily ledger model
//!
//! One ledger row per (user, calendar date) holding the derived nutrition
//! and energy totals. Totals are only ever written by full recomputation
//! over the entries currently linked to the ledger.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use super::{ActivityRecord, LoggedIngredient, LoggedMeal, NutritionFact, WaterEntry};

/// The derived fields of a daily ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerTotals {
    pub total_kcal_eaten: f64,
    pub total_kcal_burned: f64,
    /// Net energy balance: eaten - burned (may be negative)
    pub total_kcal: f64,
    pub total_protein_g: f64,
    pub total_fat_g: f64,
    pub total_carbs_g: f64,
    pub total_fiber_g: f64,
    pub water_l: f64,
}

/// A per-user, per-day aggregate record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyLedger {
    pub id: i64,
    pub user_id: i64,
    pub date: String, // ISO date: "2026-01-09"
    pub totals: LedgerTotals,
    pub created_at: String,
    pub updated_at: String,
}

/// Normalize a date input to a date-only ISO string.
///
/// Accepts a plain date ("2026-01-09"), a naive timestamp
/// ("2026-01-09T18:30:00"), or an RFC 3339 timestamp; any time-of-day
/// component is discarded.
pub fn normalize_date(input: &str) -> DbResult<String> {
    let trimmed = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date.format("%Y-%m-%d").to_string());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.date_naive().format("%Y-%m-%d").to_string());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(dt.date().format("%Y-%m-%d").to_string());
        }
    }

    Err(DbError::InvalidData(format!("unrecognized date: {}", input)))
}

impl DailyLedger {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            date: row.get("date")?,
            totals: LedgerTotals {
                total_kcal_eaten: row.get("total_kcal_eaten")?,
                total_kcal_burned: row.get("total_kcal_burned")?,
                total_kcal: row.get("total_kcal")?,
                total_protein_g: row.get("total_protein_g")?,
                total_fat_g: row.get("total_fat_g")?,
                total_carbs_g: row.get("total_carbs_g")?,
                total_fiber_g: row.get("total_fiber_g")?,
                water_l: row.get("water_l")?,
            },
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Get a ledger by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM daily_ledgers WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(ledger) => Ok(Some(ledger)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a ledger by user and date (date must already be normalized)
    pub fn get_by_user_date(conn: &Connection, user_id: i64, date: &str) -> DbResult<Option<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM daily_ledgers WHERE user_id = ?1 AND date = ?2")?;

        let result = stmt.query_row(params![user_id, date], Self::from_row);
        match result {
            Ok(ledger) => Ok(Some(ledger)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get or create the ledger for a user and date.
    ///
    /// The date is normalized first, then a single
    /// `INSERT ... ON CONFLICT DO NOTHING` keyed on the (user_id, date)
    /// uniqueness constraint makes concurrent calls safe: whichever caller
    /// wins the insert, both read back the same row.
    pub fn get_or_create(conn: &Connection, user_id: i64, date: &str) -> DbResult<Self> {
        let date = normalize_date(date)?;

        conn.execute(
            r#"
            INSERT INTO daily_ledgers (user_id, date)
            VALUES (?1, ?2)
            ON CONFLICT(user_id, date) DO NOTHING
            "#,
            params![user_id, date],
        )?;

        Self::get_by_user_date(conn, user_id, &date)?.ok_or(DbError::NotFound("daily ledger"))
    }

    /// List ledgers for a user, most recent first, with optional date range
    pub fn list_for_user(
        conn: &Connection,
        user_id: i64,
        start_date: Option<&str>,
        end_date: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let mut sql = String::from("SELECT * FROM daily_ledgers WHERE user_id = ?1");
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id)];

        if let Some(start) = start_date {
            params_vec.push(Box::new(normalize_date(start)?));
            sql.push_str(&format!(" AND date >= ?{}", params_vec.len()));
        }
        if let Some(end) = end_date {
            params_vec.push(Box::new(normalize_date(end)?));
            sql.push_str(&format!(" AND date <= ?{}", params_vec.len()));
        }

        sql.push_str(" ORDER BY date DESC");

        params_vec.push(Box::new(limit));
        sql.push_str(&format!(" LIMIT ?{}", params_vec.len()));

        params_vec.push(Box::new(offset));
        sql.push_str(&format!(" OFFSET ?{}", params_vec.len()));

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let ledgers = stmt
            .query_map(params_refs.as_slice(), Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ledgers)
    }
}

/// Recompute a ledger's derived totals from its currently linked entries.
///
/// Runs in one transaction: reads every logged-ingredient, logged-meal,
/// activity-record, and water entry linked to the ledger, sums their
/// cached per-entry totals, and replaces the eight derived fields. Safe to
/// call any number of times; the result depends only on the linked set.
pub fn recompute_ledger(conn: &mut Connection, ledger_id: i64) -> DbResult<LedgerTotals> {
    let tx = conn.transaction()?;

    if DailyLedger::get_by_id(&tx, ledger_id)?.is_none() {
        return Err(DbError::NotFound("daily ledger"));
    }

    let food: NutritionFact = LoggedIngredient::list_for_ledger(&tx, ledger_id)?
        .iter()
        .map(|e| e.cached_totals)
        .chain(
            LoggedMeal::list_for_ledger(&tx, ledger_id)?
                .iter()
                .map(|e| e.cached_totals),
        )
        .sum();

    let burned: f64 = ActivityRecord::list_for_ledger(&tx, ledger_id)?
        .iter()
        .map(|r| r.cached_kcal_burned)
        .sum();

    let water_l: f64 = WaterEntry::list_for_ledger(&tx, ledger_id)?
        .iter()
        .map(|w| w.liters)
        .sum();

    let totals = LedgerTotals {
        total_kcal_eaten: food.kcal,
        total_kcal_burned: burned,
        total_kcal: food.kcal - burned,
        total_protein_g: food.protein_g,
        total_fat_g: food.fat_g,
        total_carbs_g: food.carbs_g,
        total_fiber_g: food.fiber_g,
        water_l,
    };

    tx.execute(
        r#"
        UPDATE daily_ledgers SET
            total_kcal_eaten = ?1,
            total_kcal_burned = ?2,
            total_kcal = ?3,
            total_protein_g = ?4,
            total_fat_g = ?5,
            total_carbs_g = ?6,
            total_fiber_g = ?7,
            water_l = ?8,
            updated_at = datetime('now')
        WHERE id = ?9
        "#,
        params![
            totals.total_kcal_eaten,
            totals.total_kcal_burned,
            totals.total_kcal,
            totals.total_protein_g,
            totals.total_fat_g,
            totals.total_carbs_g,
            totals.total_fiber_g,
            totals.water_l,
            ledger_id,
        ],
    )?;

    tx.commit()?;
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::engine::energy::EnergyConfig;
    use crate::models::{
        ActivityCreate, ActivityRecordCreate, Ingredient, IngredientCreate,
        LoggedIngredientCreate, Meal, MealCreate, LoggedMealCreate,
    };
    use crate::models::Activity;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn seed_ingredient(conn: &Connection, kcal: f64, protein: f64) -> Ingredient {
        Ingredient::create(
            conn,
            &IngredientCreate {
                name: "chicken breast".to_string(),
                brand: None,
                facts: NutritionFact {
                    kcal,
                    protein_g: protein,
                    ..NutritionFact::zero()
                },
                notes: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_normalize_date_discards_time_of_day() {
        assert_eq!(normalize_date("2026-01-09").unwrap(), "2026-01-09");
        assert_eq!(normalize_date("2026-01-09T18:30:00").unwrap(), "2026-01-09");
        assert_eq!(
            normalize_date("2026-01-09T18:30:00+02:00").unwrap(),
            "2026-01-09"
        );
        assert_eq!(normalize_date("2026-01-09 06:00:00").unwrap(), "2026-01-09");
        assert!(normalize_date("january 9th").is_err());
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let conn = test_conn();

        let first = DailyLedger::get_or_create(&conn, 1, "2026-01-09").unwrap();
        let second = DailyLedger::get_or_create(&conn, 1, "2026-01-09T23:59:59").unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.totals, LedgerTotals::default());

        // Different user or date gets a distinct row
        let other_user = DailyLedger::get_or_create(&conn, 2, "2026-01-09").unwrap();
        let other_day = DailyLedger::get_or_create(&conn, 1, "2026-01-10").unwrap();
        assert_ne!(first.id, other_user.id);
        assert_ne!(first.id, other_day.id);
    }

    #[test]
    fn test_recompute_missing_ledger_is_not_found() {
        let mut conn = test_conn();
        assert!(matches!(
            recompute_ledger(&mut conn, 999),
            Err(DbError::NotFound(_))
        ));
    }

    #[test]
    fn test_recompute_sums_food_and_water() {
        let mut conn = test_conn();
        let ledger = DailyLedger::get_or_create(&conn, 1, "2026-01-09").unwrap();
        let ingredient = seed_ingredient(&conn, 165.0, 31.0);

        LoggedIngredient::create(
            &mut conn,
            &LoggedIngredientCreate {
                ledger_id: ledger.id,
                ingredient_id: ingredient.id,
                quantity_kg: 0.2,
                notes: None,
            },
        )
        .unwrap();
        WaterEntry::create(&mut conn, ledger.id, 0.5).unwrap();
        WaterEntry::create(&mut conn, ledger.id, 0.25).unwrap();

        let ledger = DailyLedger::get_by_id(&conn, ledger.id).unwrap().unwrap();
        assert!((ledger.totals.total_kcal_eaten - 330.0).abs() < 1e-9);
        assert!((ledger.totals.total_protein_g - 62.0).abs() < 1e-9);
        assert!((ledger.totals.water_l - 0.75).abs() < 1e-9);
        assert!((ledger.totals.total_kcal - 330.0).abs() < 1e-9);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut conn = test_conn();
        let ledger = DailyLedger::get_or_create(&conn, 1, "2026-01-09").unwrap();
        let ingredient = seed_ingredient(&conn, 52.0, 0.3);

        LoggedIngredient::create(
            &mut conn,
            &LoggedIngredientCreate {
                ledger_id: ledger.id,
                ingredient_id: ingredient.id,
                quantity_kg: 0.13,
                notes: None,
            },
        )
        .unwrap();

        let first = recompute_ledger(&mut conn, ledger.id).unwrap();
        let second = recompute_ledger(&mut conn, ledger.id).unwrap();
        // Bit-identical: same linked set, same sums
        assert_eq!(first, second);
    }

    #[test]
    fn test_recompute_reflects_entry_deletion() {
        let mut conn = test_conn();
        let ledger = DailyLedger::get_or_create(&conn, 1, "2026-01-09").unwrap();
        let ingredient = seed_ingredient(&conn, 100.0, 10.0);

        let entry = LoggedIngredient::create(
            &mut conn,
            &LoggedIngredientCreate {
                ledger_id: ledger.id,
                ingredient_id: ingredient.id,
                quantity_kg: 0.1,
                notes: None,
            },
        )
        .unwrap();

        LoggedIngredient::delete(&mut conn, entry.id).unwrap();

        let ledger = DailyLedger::get_by_id(&conn, ledger.id).unwrap().unwrap();
        assert_eq!(ledger.totals, LedgerTotals::default());
    }

    #[test]
    fn test_net_kcal_subtracts_burned() {
        let mut conn = test_conn();
        let ledger = DailyLedger::get_or_create(&conn, 1, "2026-01-09").unwrap();

        let ingredient = seed_ingredient(&conn, 200.0, 0.0);
        LoggedIngredient::create(
            &mut conn,
            &LoggedIngredientCreate {
                ledger_id: ledger.id,
                ingredient_id: ingredient.id,
                quantity_kg: 0.1, // 200 kcal
                notes: None,
            },
        )
        .unwrap();

        let activity = Activity::create(
            &conn,
            &ActivityCreate {
                name: "running".to_string(),
                met_value: 8.0,
                supports_rep: false,
                supports_hour: true,
                category: None,
                notes: None,
            },
        )
        .unwrap();

        // 8 * 3.5 * 70 / 200 * 30 = 294 kcal burned
        ActivityRecord::create(
            &mut conn,
            &ActivityRecordCreate {
                ledger_id: ledger.id,
                activity_id: activity.id,
                duration_minutes: Some(30.0),
                reps: None,
                intensity_level: None,
                weight_kg: Some(70.0),
                notes: None,
            },
            &EnergyConfig::default(),
        )
        .unwrap();

        let ledger = DailyLedger::get_by_id(&conn, ledger.id).unwrap().unwrap();
        assert!((ledger.totals.total_kcal_eaten - 200.0).abs() < 1e-9);
        assert!((ledger.totals.total_kcal_burned - 294.0).abs() < 1e-9);
        assert!((ledger.totals.total_kcal - (200.0 - 294.0)).abs() < 1e-9);
    }

    #[test]
    fn test_meal_servings_convert_to_weight() {
        let mut conn = test_conn();
        let ledger = DailyLedger::get_or_create(&conn, 1, "2026-01-09").unwrap();

        // 250 g serving, 120 kcal per 100 g
        let meal = Meal::create(
            &conn,
            &MealCreate {
                name: "lentil soup".to_string(),
                serving_weight_g: 250.0,
                facts: NutritionFact {
                    kcal: 120.0,
                    ..NutritionFact::zero()
                },
                notes: None,
            },
        )
        .unwrap();

        LoggedMeal::create(
            &mut conn,
            &LoggedMealCreate {
                ledger_id: ledger.id,
                meal_id: meal.id,
                servings: 2.0,
                notes: None,
            },
        )
        .unwrap();

        // 2 servings = 500 g = 120 * 5 = 600 kcal
        let ledger = DailyLedger::get_by_id(&conn, ledger.id).unwrap().unwrap();
        assert!((ledger.totals.total_kcal_eaten - 600.0).abs() < 1e-9);
    }
}
