//! Logged meal model
//!
//! A meal serving attached to a daily ledger. The serving count converts
//! to a weighed portion via the meal's serving weight, then goes through
//! the same macro aggregation as a raw ingredient.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::engine::macros::{aggregate, Portion};
use super::{recompute_ledger, DailyLedger, Meal, NutritionFact};

/// A logged meal serving
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggedMeal {
    pub id: i64,
    pub ledger_id: i64,
    pub meal_id: i64,
    pub servings: f64,
    /// Portion weight derived from servings at log time
    pub quantity_kg: f64,
    /// Absolute totals for this serving, computed at log time
    pub cached_totals: NutritionFact,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for logging a meal serving
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggedMealCreate {
    pub ledger_id: i64,
    pub meal_id: i64,
    pub servings: f64,
    pub notes: Option<String>,
}

impl LoggedMeal {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            ledger_id: row.get("ledger_id")?,
            meal_id: row.get("meal_id")?,
            servings: row.get("servings")?,
            quantity_kg: row.get("quantity_kg")?,
            cached_totals: NutritionFact {
                kcal: row.get("cached_kcal")?,
                protein_g: row.get("cached_protein_g")?,
                fat_g: row.get("cached_fat_g")?,
                carbs_g: row.get("cached_carbs_g")?,
                fiber_g: row.get("cached_fiber_g")?,
            },
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Log a meal serving and recompute the ledger
    pub fn create(conn: &mut Connection, data: &LoggedMealCreate) -> DbResult<Self> {
        if DailyLedger::get_by_id(conn, data.ledger_id)?.is_none() {
            return Err(DbError::NotFound("daily ledger"));
        }
        let meal = Meal::get_by_id(conn, data.meal_id)?.ok_or(DbError::NotFound("meal"))?;

        if !data.servings.is_finite() || data.servings <= 0.0 {
            return Err(DbError::InvalidData(format!(
                "servings must be positive, got {}",
                data.servings
            )));
        }

        let quantity_kg = data.servings * meal.serving_weight_g / 1000.0;
        let totals = aggregate(&[Portion::new(quantity_kg, meal.facts)])
            .map_err(|e| DbError::InvalidData(e.to_string()))?;

        conn.execute(
            r#"
            INSERT INTO logged_meals (
                ledger_id, meal_id, servings, quantity_kg,
                cached_kcal, cached_protein_g, cached_fat_g, cached_carbs_g, cached_fiber_g,
                notes
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                data.ledger_id,
                data.meal_id,
                data.servings,
                quantity_kg,
                totals.total.kcal,
                totals.total.protein_g,
                totals.total.fat_g,
                totals.total.carbs_g,
                totals.total.fiber_g,
                data.notes,
            ],
        )?;

        let id = conn.last_insert_rowid();
        let entry = Self::get_by_id(conn, id)?.ok_or(DbError::NotFound("logged meal"))?;

        recompute_ledger(conn, data.ledger_id)?;

        Ok(entry)
    }

    /// Get a logged meal by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM logged_meals WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List logged meals for a ledger
    pub fn list_for_ledger(conn: &Connection, ledger_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM logged_meals WHERE ledger_id = ?1 ORDER BY id")?;
        let entries = stmt
            .query_map([ledger_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Delete a logged meal and recompute its ledger.
    /// Returns Ok(true) if deleted, Ok(false) if not found.
    pub fn delete(conn: &mut Connection, id: i64) -> DbResult<bool> {
        let entry = match Self::get_by_id(conn, id)? {
            Some(e) => e,
            None => return Ok(false),
        };

        let rows = conn.execute("DELETE FROM logged_meals WHERE id = ?1", [id])?;
        if rows > 0 {
            recompute_ledger(conn, entry.ledger_id)?;
        }

        Ok(rows > 0)
    }
}
