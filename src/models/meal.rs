//! Meal model
//!
//! Catalog dish: nutrition facts per 100 g plus the weight of one serving,
//! so a logged serving count converts to a weighed portion.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use super::NutritionFact;

/// A catalog meal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meal {
    pub id: i64,
    pub name: String,
    /// Weight of one serving in grams
    pub serving_weight_g: f64,
    pub facts: NutritionFact,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a meal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealCreate {
    pub name: String,
    pub serving_weight_g: f64,
    #[serde(default)]
    pub facts: NutritionFact,
    pub notes: Option<String>,
}

/// Data for updating a meal
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MealUpdate {
    pub name: Option<String>,
    pub serving_weight_g: Option<f64>,
    pub kcal: Option<f64>,
    pub protein_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fiber_g: Option<f64>,
    pub notes: Option<String>,
}

impl Meal {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            serving_weight_g: row.get("serving_weight_g")?,
            facts: NutritionFact {
                kcal: row.get("kcal")?,
                protein_g: row.get("protein_g")?,
                fat_g: row.get("fat_g")?,
                carbs_g: row.get("carbs_g")?,
                fiber_g: row.get("fiber_g")?,
            },
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new meal
    pub fn create(conn: &Connection, data: &MealCreate) -> DbResult<Self> {
        if !data.facts.is_valid() {
            return Err(DbError::InvalidData(
                "nutrition facts must be finite and non-negative".to_string(),
            ));
        }
        if !data.serving_weight_g.is_finite() || data.serving_weight_g <= 0.0 {
            return Err(DbError::InvalidData(format!(
                "serving weight must be positive, got {}",
                data.serving_weight_g
            )));
        }

        conn.execute(
            r#"
            INSERT INTO meals (name, serving_weight_g, kcal, protein_g, fat_g, carbs_g, fiber_g, notes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                data.name,
                data.serving_weight_g,
                data.facts.kcal,
                data.facts.protein_g,
                data.facts.fat_g,
                data.facts.carbs_g,
                data.facts.fiber_g,
                data.notes,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::NotFound("meal"))
    }

    /// Get a meal by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM meals WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(meal) => Ok(Some(meal)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Search meals by name
    pub fn search(conn: &Connection, query: &str, limit: i64) -> DbResult<Vec<Self>> {
        let pattern = format!("%{}%", query);
        let mut stmt = conn.prepare(
            "SELECT * FROM meals WHERE name LIKE ?1 ORDER BY name LIMIT ?2",
        )?;

        let meals = stmt
            .query_map(params![pattern, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(meals)
    }

    /// List meals with pagination
    pub fn list(conn: &Connection, limit: i64, offset: i64) -> DbResult<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM meals ORDER BY name LIMIT ?1 OFFSET ?2")?;
        let meals = stmt
            .query_map(params![limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(meals)
    }

    /// Update a meal. Catalog edits affect future logs only.
    pub fn update(conn: &Connection, id: i64, data: &MealUpdate) -> DbResult<Option<Self>> {
        let fact_fields = [
            ("kcal", data.kcal),
            ("protein_g", data.protein_g),
            ("fat_g", data.fat_g),
            ("carbs_g", data.carbs_g),
            ("fiber_g", data.fiber_g),
        ];
        for (column, value) in fact_fields {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(DbError::InvalidData(format!(
                        "{} must be finite and non-negative, got {}",
                        column, v
                    )));
                }
            }
        }
        if let Some(weight) = data.serving_weight_g {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(DbError::InvalidData(format!(
                    "serving weight must be positive, got {}",
                    weight
                )));
            }
        }

        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            updates.push(format!("name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(name.clone()));
        }
        if let Some(weight) = data.serving_weight_g {
            updates.push(format!("serving_weight_g = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(weight));
        }
        for (column, value) in fact_fields {
            if let Some(v) = value {
                updates.push(format!("{} = ?{}", column, params_vec.len() + 1));
                params_vec.push(Box::new(v));
            }
        }
        if let Some(ref notes) = data.notes {
            updates.push(format!("notes = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(notes.clone()));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE meals SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Count logged entries referencing this meal
    pub fn logged_entry_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM logged_meals WHERE meal_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete a meal (only allowed if never logged).
    /// Returns Ok(true) if deleted, Ok(false) if not found.
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        if Self::logged_entry_count(conn, id)? > 0 {
            return Err(DbError::InvalidData(
                "meal is referenced by logged entries".to_string(),
            ));
        }

        let rows = conn.execute("DELETE FROM meals WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
