//! FitLedger MCP Server Implementation
//!
//! Implements the MCP server with all FitLedger tools.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::db::Database;
use crate::engine::energy::EnergyConfig;
use crate::models::{
    ActivityCreate, ChallengeCreate, IngredientUpdate, MealUpdate, NutritionFact,
};
use crate::tools::activities;
use crate::tools::catalog;
use crate::tools::challenges;
use crate::tools::ledger;
use crate::tools::status::{StatusTracker, LOGGING_INSTRUCTIONS};

/// FitLedger MCP Service
#[derive(Clone)]
pub struct FitLedgerService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    energy_config: Arc<EnergyConfig>,
    tool_router: ToolRouter<FitLedgerService>,
}

impl FitLedgerService {
    pub fn new(database_path: PathBuf, database: Database, energy_config: EnergyConfig) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            energy_config: Arc::new(energy_config),
            tool_router: Self::tool_router(),
        }
    }
}

// ============================================================================
// Catalog Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddIngredientParams {
    pub name: String,
    pub brand: Option<String>,
    #[serde(default)]
    pub kcal: f64,
    #[serde(default)]
    pub protein_g: f64,
    #[serde(default)]
    pub fat_g: f64,
    #[serde(default)]
    pub carbs_g: f64,
    #[serde(default)]
    pub fiber_g: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetByIdParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchParams {
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

fn default_search_limit() -> i64 {
    20
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListParams {
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_list_limit() -> i64 {
    50
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateIngredientParams {
    pub id: i64,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub kcal: Option<f64>,
    pub protein_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fiber_g: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddMealParams {
    pub name: String,
    pub serving_weight_g: f64,
    #[serde(default)]
    pub kcal: f64,
    #[serde(default)]
    pub protein_g: f64,
    #[serde(default)]
    pub fat_g: f64,
    #[serde(default)]
    pub carbs_g: f64,
    #[serde(default)]
    pub fiber_g: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateMealParams {
    pub id: i64,
    pub name: Option<String>,
    pub serving_weight_g: Option<f64>,
    pub kcal: Option<f64>,
    pub protein_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fiber_g: Option<f64>,
    pub notes: Option<String>,
}

// ============================================================================
// Activity Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddActivityParams {
    pub name: String,
    pub met_value: f64,
    #[serde(default)]
    pub supports_rep: bool,
    #[serde(default)]
    pub supports_hour: bool,
    pub category: Option<String>,
    pub notes: Option<String>,
}

// ============================================================================
// Day Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DayParams {
    pub user_id: i64,
    pub date: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListDaysParams {
    pub user_id: i64,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogIngredientParams {
    pub user_id: i64,
    pub date: String,
    pub ingredient_id: i64,
    /// Portion weight in kilograms (0.150 = 150 g)
    pub quantity_kg: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogMealParams {
    pub user_id: i64,
    pub date: String,
    pub meal_id: i64,
    pub servings: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogActivityParams {
    pub user_id: i64,
    pub date: String,
    pub activity_id: i64,
    /// For duration-mode activities
    pub duration_minutes: Option<f64>,
    /// For rep-mode activities
    pub reps: Option<f64>,
    /// 1..5, defaults to 3
    pub intensity_level: Option<u8>,
    /// Body weight in kg
    pub weight_kg: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogWaterParams {
    pub user_id: i64,
    pub date: String,
    pub liters: f64,
}

// ============================================================================
// Challenge Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateChallengeParams {
    pub user_id: i64,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub target_duration_minutes: Option<f64>,
    pub target_kcal_burned: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListChallengesParams {
    pub user_id: i64,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

// ============================================================================
// Helpers
// ============================================================================

fn json_result<T: serde::Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn json_optional<T: serde::Serialize>(
    value: Option<T>,
    entity: &str,
    id: i64,
) -> Result<CallToolResult, McpError> {
    let json = match value {
        Some(v) => serde_json::to_string_pretty(&v)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?,
        None => format!(r#"{{"error": "{} not found", "id": {}}}"#, entity, id),
    };
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[tool_router]
impl FitLedgerService {
    // --- Status ---

    #[tool(description = "Get the current status of the FitLedger service including build info, database status, and process information")]
    async fn fitledger_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status(&self.database);
        json_result(&status)
    }

    #[tool(description = "Get step-by-step instructions for logging food, activity, and water. Call this when starting a new tracking session or when unsure how to use the tools.")]
    fn logging_instructions(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(
            LOGGING_INSTRUCTIONS,
        )]))
    }

    // --- Ingredients ---

    #[tool(description = "Create a new catalog ingredient with nutrition facts per 100 g")]
    fn add_ingredient(&self, Parameters(p): Parameters<AddIngredientParams>) -> Result<CallToolResult, McpError> {
        let facts = NutritionFact {
            kcal: p.kcal,
            protein_g: p.protein_g,
            fat_g: p.fat_g,
            carbs_g: p.carbs_g,
            fiber_g: p.fiber_g,
        };
        let result = catalog::add_ingredient(&self.database, p.name, p.brand, facts, p.notes)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get full details for a catalog ingredient")]
    fn get_ingredient(&self, Parameters(p): Parameters<GetByIdParams>) -> Result<CallToolResult, McpError> {
        let result = catalog::get_ingredient(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_optional(result, "Ingredient", p.id)
    }

    #[tool(description = "Search catalog ingredients by name or brand")]
    fn search_ingredients(&self, Parameters(p): Parameters<SearchParams>) -> Result<CallToolResult, McpError> {
        let result = catalog::search_ingredients(&self.database, &p.query, p.limit)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "List catalog ingredients with pagination")]
    fn list_ingredients(&self, Parameters(p): Parameters<ListParams>) -> Result<CallToolResult, McpError> {
        let result = catalog::list_ingredients(&self.database, p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Update a catalog ingredient. Affects future logs only; totals on already-logged entries stay frozen.")]
    fn update_ingredient(&self, Parameters(p): Parameters<UpdateIngredientParams>) -> Result<CallToolResult, McpError> {
        let data = IngredientUpdate {
            name: p.name,
            brand: p.brand,
            kcal: p.kcal,
            protein_g: p.protein_g,
            fat_g: p.fat_g,
            carbs_g: p.carbs_g,
            fiber_g: p.fiber_g,
            notes: p.notes,
        };
        let result = catalog::update_ingredient(&self.database, p.id, data)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_optional(result, "Ingredient", p.id)
    }

    #[tool(description = "Delete a catalog ingredient (only allowed if never logged)")]
    fn delete_ingredient(&self, Parameters(p): Parameters<GetByIdParams>) -> Result<CallToolResult, McpError> {
        let result = catalog::delete_ingredient(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Meals ---

    #[tool(description = "Create a new catalog meal with nutrition facts per 100 g and the weight of one serving")]
    fn add_meal(&self, Parameters(p): Parameters<AddMealParams>) -> Result<CallToolResult, McpError> {
        let facts = NutritionFact {
            kcal: p.kcal,
            protein_g: p.protein_g,
            fat_g: p.fat_g,
            carbs_g: p.carbs_g,
            fiber_g: p.fiber_g,
        };
        let result = catalog::add_meal(&self.database, p.name, p.serving_weight_g, facts, p.notes)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get full details for a catalog meal")]
    fn get_meal(&self, Parameters(p): Parameters<GetByIdParams>) -> Result<CallToolResult, McpError> {
        let result = catalog::get_meal(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_optional(result, "Meal", p.id)
    }

    #[tool(description = "Search catalog meals by name")]
    fn search_meals(&self, Parameters(p): Parameters<SearchParams>) -> Result<CallToolResult, McpError> {
        let result = catalog::search_meals(&self.database, &p.query, p.limit)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "List catalog meals with pagination")]
    fn list_meals(&self, Parameters(p): Parameters<ListParams>) -> Result<CallToolResult, McpError> {
        let result = catalog::list_meals(&self.database, p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Update a catalog meal. Affects future logs only.")]
    fn update_meal(&self, Parameters(p): Parameters<UpdateMealParams>) -> Result<CallToolResult, McpError> {
        let data = MealUpdate {
            name: p.name,
            serving_weight_g: p.serving_weight_g,
            kcal: p.kcal,
            protein_g: p.protein_g,
            fat_g: p.fat_g,
            carbs_g: p.carbs_g,
            fiber_g: p.fiber_g,
            notes: p.notes,
        };
        let result = catalog::update_meal(&self.database, p.id, data)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_optional(result, "Meal", p.id)
    }

    #[tool(description = "Delete a catalog meal (only allowed if never logged)")]
    fn delete_meal(&self, Parameters(p): Parameters<GetByIdParams>) -> Result<CallToolResult, McpError> {
        let result = catalog::delete_meal(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Activities ---

    #[tool(description = "Create a new activity definition with a MET rating. Set exactly one of supports_rep (logged by repetition count) or supports_hour (logged by duration).")]
    fn add_activity(&self, Parameters(p): Parameters<AddActivityParams>) -> Result<CallToolResult, McpError> {
        let data = ActivityCreate {
            name: p.name,
            met_value: p.met_value,
            supports_rep: p.supports_rep,
            supports_hour: p.supports_hour,
            category: p.category,
            notes: p.notes,
        };
        let result = activities::add_activity(&self.database, data)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get full details for an activity definition")]
    fn get_activity(&self, Parameters(p): Parameters<GetByIdParams>) -> Result<CallToolResult, McpError> {
        let result = activities::get_activity(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_optional(result, "Activity", p.id)
    }

    #[tool(description = "Search activity definitions by name")]
    fn search_activities(&self, Parameters(p): Parameters<SearchParams>) -> Result<CallToolResult, McpError> {
        let result = activities::search_activities(&self.database, &p.query, p.limit)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "List activity definitions with pagination")]
    fn list_activities(&self, Parameters(p): Parameters<ListParams>) -> Result<CallToolResult, McpError> {
        let result = activities::list_activities(&self.database, p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Delete an activity definition (only allowed if never logged)")]
    fn delete_activity(&self, Parameters(p): Parameters<GetByIdParams>) -> Result<CallToolResult, McpError> {
        let result = activities::delete_activity(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Days ---

    #[tool(description = "Get or create a user's daily ledger for a date. Creates a new ledger with zero totals if none exists; concurrent calls are safe.")]
    fn get_or_create_day(&self, Parameters(p): Parameters<DayParams>) -> Result<CallToolResult, McpError> {
        let result = ledger::get_or_create_day(&self.database, p.user_id, &p.date)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get full day details: totals plus all logged ingredients, meals, activity records, and water entries")]
    fn get_day(&self, Parameters(p): Parameters<DayParams>) -> Result<CallToolResult, McpError> {
        let result = ledger::get_day(&self.database, p.user_id, &p.date)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(detail) => serde_json::to_string_pretty(&detail)
                .map_err(|e| McpError::internal_error(e.to_string(), None))?,
            None => format!(
                r#"{{"error": "No ledger for user {} on {}"}}"#,
                p.user_id, p.date
            ),
        };
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List a user's days with optional date range and pagination")]
    fn list_days(&self, Parameters(p): Parameters<ListDaysParams>) -> Result<CallToolResult, McpError> {
        let result = ledger::list_days(
            &self.database,
            p.user_id,
            p.start_date.as_deref(),
            p.end_date.as_deref(),
            p.limit,
            p.offset,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Force recompute a day's totals from its currently linked entries")]
    fn recompute_day(&self, Parameters(p): Parameters<DayParams>) -> Result<CallToolResult, McpError> {
        let result = ledger::recompute_day(&self.database, p.user_id, &p.date)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Logging ---

    #[tool(description = "Log a weighed ingredient portion for a user's day. Creates the day automatically and recomputes its totals.")]
    fn log_ingredient(&self, Parameters(p): Parameters<LogIngredientParams>) -> Result<CallToolResult, McpError> {
        let result = ledger::log_ingredient(
            &self.database,
            p.user_id,
            &p.date,
            p.ingredient_id,
            p.quantity_kg,
            p.notes,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Log a meal serving for a user's day. Creates the day automatically and recomputes its totals.")]
    fn log_meal(&self, Parameters(p): Parameters<LogMealParams>) -> Result<CallToolResult, McpError> {
        let result = ledger::log_meal(
            &self.database,
            p.user_id,
            &p.date,
            p.meal_id,
            p.servings,
            p.notes,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Log an activity occurrence for a user's day. Provide duration_minutes for duration-mode activities or reps for rep-mode activities (not both). Burned calories are estimated from the activity's MET rating.")]
    fn log_activity(&self, Parameters(p): Parameters<LogActivityParams>) -> Result<CallToolResult, McpError> {
        let result = ledger::log_activity(
            &self.database,
            &self.energy_config,
            p.user_id,
            &p.date,
            p.activity_id,
            p.duration_minutes,
            p.reps,
            p.intensity_level,
            p.weight_kg,
            p.notes,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Log water intake in liters for a user's day")]
    fn log_water(&self, Parameters(p): Parameters<LogWaterParams>) -> Result<CallToolResult, McpError> {
        let result = ledger::log_water(&self.database, p.user_id, &p.date, p.liters)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Entry deletion ---

    #[tool(description = "Delete a logged ingredient entry and recompute its day")]
    fn delete_logged_ingredient(&self, Parameters(p): Parameters<GetByIdParams>) -> Result<CallToolResult, McpError> {
        let result = ledger::delete_logged_ingredient(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Delete a logged meal entry and recompute its day")]
    fn delete_logged_meal(&self, Parameters(p): Parameters<GetByIdParams>) -> Result<CallToolResult, McpError> {
        let result = ledger::delete_logged_meal(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Delete an activity record and recompute its day")]
    fn delete_activity_record(&self, Parameters(p): Parameters<GetByIdParams>) -> Result<CallToolResult, McpError> {
        let result = ledger::delete_activity_record(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Delete a water entry and recompute its day")]
    fn delete_water_entry(&self, Parameters(p): Parameters<GetByIdParams>) -> Result<CallToolResult, McpError> {
        let result = ledger::delete_water_entry(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Challenges ---

    #[tool(description = "Create a challenge: a date window with target total duration_minutes and/or kcal_burned. A metric with a non-positive target is excluded from scoring.")]
    fn create_challenge(&self, Parameters(p): Parameters<CreateChallengeParams>) -> Result<CallToolResult, McpError> {
        let data = ChallengeCreate {
            user_id: p.user_id,
            name: p.name,
            start_date: p.start_date,
            end_date: p.end_date,
            target_duration_minutes: p.target_duration_minutes,
            target_kcal_burned: p.target_kcal_burned,
            notes: p.notes,
        };
        let result = challenges::create_challenge(&self.database, data)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get full details for a challenge")]
    fn get_challenge(&self, Parameters(p): Parameters<GetByIdParams>) -> Result<CallToolResult, McpError> {
        let result = challenges::get_challenge(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_optional(result, "Challenge", p.id)
    }

    #[tool(description = "List a user's challenges")]
    fn list_challenges(&self, Parameters(p): Parameters<ListChallengesParams>) -> Result<CallToolResult, McpError> {
        let result = challenges::list_challenges(&self.database, p.user_id, p.limit)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Score a challenge against the user's activity records inside its window. Returns a bounded percentage governed by the least-satisfied target metric, plus a per-metric breakdown.")]
    fn challenge_progress(&self, Parameters(p): Parameters<GetByIdParams>) -> Result<CallToolResult, McpError> {
        let result = challenges::challenge_progress(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Delete a challenge")]
    fn delete_challenge(&self, Parameters(p): Parameters<GetByIdParams>) -> Result<CallToolResult, McpError> {
        let result = challenges::delete_challenge(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }
}

#[tool_handler]
impl ServerHandler for FitLedgerService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "fitledger".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("FitLedger".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "FitLedger - daily nutrition and activity tracking. \
                 IMPORTANT: Call logging_instructions before a tracking session. \
                 Catalog: add/get/search/list/update/delete_ingredient, add/get/search/list/update/delete_meal. \
                 Activities: add/get/search/list/delete_activity (MET rating, rep or duration mode). \
                 Days: get_or_create_day/get_day/list_days/recompute_day. \
                 Logging: log_ingredient (quantity_kg), log_meal (servings), log_activity \
                 (duration_minutes or reps, intensity 1-5, weight_kg), log_water (liters); \
                 each creates the day if needed and recomputes its totals. \
                 Entry removal: delete_logged_ingredient/delete_logged_meal/delete_activity_record/delete_water_entry. \
                 Challenges: create/get/list/delete_challenge, challenge_progress \
                 (scored on demand; the least-satisfied target metric governs)."
                    .into(),
            ),
        }
    }
}
