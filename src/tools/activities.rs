//! Activity Definition Tools
//!
//! Tools for managing the activity catalog (MET ratings and logging modes).

use serde::Serialize;

use crate::db::Database;
use crate::models::{Activity, ActivityCreate};

/// Response for list/search operations over activities
#[derive(Debug, Serialize)]
pub struct ActivityListResponse {
    pub activities: Vec<Activity>,
    pub total: usize,
}

/// Response for delete operations
#[derive(Debug, Serialize)]
pub struct DeleteActivityResponse {
    pub deleted: bool,
}

/// Create a new activity definition.
///
/// Exactly one of `supports_rep` / `supports_hour` must be set; the model
/// rejects ambiguous definitions before they reach the schema CHECK.
pub fn add_activity(db: &Database, data: ActivityCreate) -> Result<Activity, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Activity::create(&conn, &data).map_err(|e| format!("Failed to create activity: {}", e))
}

/// Get an activity by ID
pub fn get_activity(db: &Database, id: i64) -> Result<Option<Activity>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Activity::get_by_id(&conn, id).map_err(|e| format!("Failed to get activity: {}", e))
}

/// Search activities by name
pub fn search_activities(
    db: &Database,
    query: &str,
    limit: i64,
) -> Result<ActivityListResponse, String> {
    let limit = limit.clamp(1, 100);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let activities = Activity::search(&conn, query, limit)
        .map_err(|e| format!("Failed to search activities: {}", e))?;
    let total = activities.len();

    Ok(ActivityListResponse { activities, total })
}

/// List activities with pagination
pub fn list_activities(
    db: &Database,
    limit: i64,
    offset: i64,
) -> Result<ActivityListResponse, String> {
    let limit = limit.clamp(1, 200);
    let offset = offset.max(0);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let activities = Activity::list(&conn, limit, offset)
        .map_err(|e| format!("Failed to list activities: {}", e))?;
    let total = activities.len();

    Ok(ActivityListResponse { activities, total })
}

/// Delete an activity (refused while records reference it)
pub fn delete_activity(db: &Database, id: i64) -> Result<DeleteActivityResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted =
        Activity::delete(&conn, id).map_err(|e| format!("Failed to delete activity: {}", e))?;
    Ok(DeleteActivityResponse { deleted })
}
