//! Ingredient and Meal Catalog Tools
//!
//! Tools for managing the food catalog the logging tools draw from.

use serde::Serialize;

use crate::db::Database;
use crate::models::{
    Ingredient, IngredientCreate, IngredientUpdate, Meal, MealCreate, MealUpdate, NutritionFact,
};

/// Response for list/search operations over ingredients
#[derive(Debug, Serialize)]
pub struct IngredientListResponse {
    pub ingredients: Vec<Ingredient>,
    pub total: usize,
}

/// Response for list/search operations over meals
#[derive(Debug, Serialize)]
pub struct MealListResponse {
    pub meals: Vec<Meal>,
    pub total: usize,
}

/// Response for delete operations
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

// ============================================================================
// Ingredient Tools
// ============================================================================

/// Create a new catalog ingredient
pub fn add_ingredient(
    db: &Database,
    name: String,
    brand: Option<String>,
    facts: NutritionFact,
    notes: Option<String>,
) -> Result<Ingredient, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Ingredient::create(
        &conn,
        &IngredientCreate {
            name,
            brand,
            facts,
            notes,
        },
    )
    .map_err(|e| format!("Failed to create ingredient: {}", e))
}

/// Get an ingredient by ID
pub fn get_ingredient(db: &Database, id: i64) -> Result<Option<Ingredient>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Ingredient::get_by_id(&conn, id).map_err(|e| format!("Failed to get ingredient: {}", e))
}

/// Search ingredients by name or brand
pub fn search_ingredients(
    db: &Database,
    query: &str,
    limit: i64,
) -> Result<IngredientListResponse, String> {
    let limit = limit.clamp(1, 100);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let ingredients = Ingredient::search(&conn, query, limit)
        .map_err(|e| format!("Failed to search ingredients: {}", e))?;
    let total = ingredients.len();

    Ok(IngredientListResponse { ingredients, total })
}

/// List ingredients with pagination
pub fn list_ingredients(
    db: &Database,
    limit: i64,
    offset: i64,
) -> Result<IngredientListResponse, String> {
    let limit = limit.clamp(1, 200);
    let offset = offset.max(0);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let ingredients = Ingredient::list(&conn, limit, offset)
        .map_err(|e| format!("Failed to list ingredients: {}", e))?;
    let total = ingredients.len();

    Ok(IngredientListResponse { ingredients, total })
}

/// Update an ingredient (affects future logs only)
pub fn update_ingredient(
    db: &Database,
    id: i64,
    data: IngredientUpdate,
) -> Result<Option<Ingredient>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Ingredient::update(&conn, id, &data).map_err(|e| format!("Failed to update ingredient: {}", e))
}

/// Delete an ingredient (refused while logged entries reference it)
pub fn delete_ingredient(db: &Database, id: i64) -> Result<DeleteResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted =
        Ingredient::delete(&conn, id).map_err(|e| format!("Failed to delete ingredient: {}", e))?;
    Ok(DeleteResponse { deleted })
}

// ============================================================================
// Meal Tools
// ============================================================================

/// Create a new catalog meal
pub fn add_meal(
    db: &Database,
    name: String,
    serving_weight_g: f64,
    facts: NutritionFact,
    notes: Option<String>,
) -> Result<Meal, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Meal::create(
        &conn,
        &MealCreate {
            name,
            serving_weight_g,
            facts,
            notes,
        },
    )
    .map_err(|e| format!("Failed to create meal: {}", e))
}

/// Get a meal by ID
pub fn get_meal(db: &Database, id: i64) -> Result<Option<Meal>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Meal::get_by_id(&conn, id).map_err(|e| format!("Failed to get meal: {}", e))
}

/// Search meals by name
pub fn search_meals(db: &Database, query: &str, limit: i64) -> Result<MealListResponse, String> {
    let limit = limit.clamp(1, 100);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let meals =
        Meal::search(&conn, query, limit).map_err(|e| format!("Failed to search meals: {}", e))?;
    let total = meals.len();

    Ok(MealListResponse { meals, total })
}

/// List meals with pagination
pub fn list_meals(db: &Database, limit: i64, offset: i64) -> Result<MealListResponse, String> {
    let limit = limit.clamp(1, 200);
    let offset = offset.max(0);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let meals =
        Meal::list(&conn, limit, offset).map_err(|e| format!("Failed to list meals: {}", e))?;
    let total = meals.len();

    Ok(MealListResponse { meals, total })
}

/// Update a meal (affects future logs only)
pub fn update_meal(db: &Database, id: i64, data: MealUpdate) -> Result<Option<Meal>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Meal::update(&conn, id, &data).map_err(|e| format!("Failed to update meal: {}", e))
}

/// Delete a meal (refused while logged entries reference it)
pub fn delete_meal(db: &Database, id: i64) -> Result<DeleteResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = Meal::delete(&conn, id).map_err(|e| format!("Failed to delete meal: {}", e))?;
    Ok(DeleteResponse { deleted })
}
