//! Challenge Tools
//!
//! Tools for managing challenges and scoring progress on demand. Scoring
//! reads the challenge's targets and streams the user's matching activity
//! records through a progress accumulator; it never writes the ledger.

use serde::Serialize;

use crate::db::Database;
use crate::engine::progress::{MetricProgress, ProgressAccumulator};
use crate::models::{ActivityRecord, Challenge, ChallengeCreate};

/// Response for list_challenges
#[derive(Debug, Serialize)]
pub struct ChallengeListResponse {
    pub challenges: Vec<Challenge>,
    pub total: usize,
}

/// Response for challenge_progress
#[derive(Debug, Serialize)]
pub struct ChallengeProgressResponse {
    pub challenge_id: i64,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    /// Bounded completion percentage; the least-satisfied metric governs
    pub percent: f64,
    pub metrics: Vec<MetricProgress>,
    pub records_scored: usize,
}

/// Response for delete_challenge
#[derive(Debug, Serialize)]
pub struct DeleteChallengeResponse {
    pub deleted: bool,
}

/// Create a new challenge
pub fn create_challenge(db: &Database, data: ChallengeCreate) -> Result<Challenge, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Challenge::create(&conn, &data).map_err(|e| format!("Failed to create challenge: {}", e))
}

/// Get a challenge by ID
pub fn get_challenge(db: &Database, id: i64) -> Result<Option<Challenge>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Challenge::get_by_id(&conn, id).map_err(|e| format!("Failed to get challenge: {}", e))
}

/// List a user's challenges
pub fn list_challenges(
    db: &Database,
    user_id: i64,
    limit: i64,
) -> Result<ChallengeListResponse, String> {
    let limit = limit.clamp(1, 100);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let challenges = Challenge::list_for_user(&conn, user_id, limit)
        .map_err(|e| format!("Failed to list challenges: {}", e))?;
    let total = challenges.len();

    Ok(ChallengeListResponse { challenges, total })
}

/// Score a challenge against the user's activity records in its window
pub fn challenge_progress(db: &Database, id: i64) -> Result<ChallengeProgressResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let challenge = Challenge::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get challenge: {}", e))?
        .ok_or_else(|| format!("Challenge not found with id: {}", id))?;

    let records = ActivityRecord::list_for_user_between(
        &conn,
        challenge.user_id,
        &challenge.start_date,
        &challenge.end_date,
    )
    .map_err(|e| format!("Failed to load activity records: {}", e))?;

    let mut accumulator = ProgressAccumulator::new(&challenge.target());
    for record in &records {
        accumulator.add(&record.metric_sample());
    }

    Ok(ChallengeProgressResponse {
        challenge_id: challenge.id,
        name: challenge.name,
        start_date: challenge.start_date,
        end_date: challenge.end_date,
        percent: accumulator.percent(),
        metrics: accumulator.breakdown(),
        records_scored: records.len(),
    })
}

/// Delete a challenge
pub fn delete_challenge(db: &Database, id: i64) -> Result<DeleteChallengeResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted =
        Challenge::delete(&conn, id).map_err(|e| format!("Failed to delete challenge: {}", e))?;
    Ok(DeleteChallengeResponse { deleted })
}
