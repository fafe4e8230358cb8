//! Ingredient model
//!
//! Catalog entry carrying nutrition facts per 100 g.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use super::NutritionFact;

/// A catalog ingredient with per-100 g nutrition facts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub facts: NutritionFact,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating an ingredient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientCreate {
    pub name: String,
    pub brand: Option<String>,
    #[serde(default)]
    pub facts: NutritionFact,
    pub notes: Option<String>,
}

/// Data for updating an ingredient
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngredientUpdate {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub kcal: Option<f64>,
    pub protein_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fiber_g: Option<f64>,
    pub notes: Option<String>,
}

impl Ingredient {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            brand: row.get("brand")?,
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

    /// Insert a new ingredient
    pub fn create(conn: &Connection, data: &IngredientCreate) -> DbResult<Self> {
        if !data.facts.is_valid() {
            return Err(DbError::InvalidData(
                "nutrition facts must be finite and non-negative".to_string(),
            ));
        }

        conn.execute(
            r#"
            INSERT INTO ingredients (name, brand, kcal, protein_g, fat_g, carbs_g, fiber_g, notes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                data.name,
                data.brand,
                data.facts.kcal,
                data.facts.protein_g,
                data.facts.fat_g,
                data.facts.carbs_g,
                data.facts.fiber_g,
                data.notes,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::NotFound("ingredient"))
    }

    /// Get an ingredient by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM ingredients WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(ingredient) => Ok(Some(ingredient)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Search ingredients by name or brand
    pub fn search(conn: &Connection, query: &str, limit: i64) -> DbResult<Vec<Self>> {
        let pattern = format!("%{}%", query);
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM ingredients
            WHERE name LIKE ?1 OR brand LIKE ?1
            ORDER BY name
            LIMIT ?2
            "#,
        )?;

        let ingredients = stmt
            .query_map(params![pattern, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ingredients)
    }

    /// List ingredients with pagination
    pub fn list(conn: &Connection, limit: i64, offset: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM ingredients ORDER BY name LIMIT ?1 OFFSET ?2",
        )?;
        let ingredients = stmt
            .query_map(params![limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ingredients)
    }

    /// Update an ingredient.
    ///
    /// Catalog edits affect future logs only; totals cached on existing
    /// logged entries are frozen at log time.
    pub fn update(conn: &Connection, id: i64, data: &IngredientUpdate) -> DbResult<Option<Self>> {
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

        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            updates.push(format!("name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(name.clone()));
        }
        if let Some(ref brand) = data.brand {
            updates.push(format!("brand = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(brand.clone()));
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
            "UPDATE ingredients SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Count logged entries referencing this ingredient
    pub fn logged_entry_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM logged_ingredients WHERE ingredient_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete an ingredient (only allowed if never logged).
    /// Returns Ok(true) if deleted, Ok(false) if not found.
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        if Self::logged_entry_count(conn, id)? > 0 {
            return Err(DbError::InvalidData(
                "ingredient is referenced by logged entries".to_string(),
            ));
        }

        let rows = conn.execute("DELETE FROM ingredients WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
