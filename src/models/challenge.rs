//! Challenge model
//!
//! A time-boxed target scored against a user's activity records. Targets
//! are typed columns, one per supported metric; a non-positive or missing
//! target simply does not participate in scoring.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::engine::progress::ChallengeTarget;
use super::normalize_date;

/// A challenge with target metrics over a date window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    /// Inclusive ISO dates
    pub start_date: String,
    pub end_date: String,
    pub target_duration_minutes: Option<f64>,
    pub target_kcal_burned: Option<f64>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a challenge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeCreate {
    pub user_id: i64,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub target_duration_minutes: Option<f64>,
    pub target_kcal_burned: Option<f64>,
    pub notes: Option<String>,
}

impl Challenge {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            start_date: row.get("start_date")?,
            end_date: row.get("end_date")?,
            target_duration_minutes: row.get("target_duration_minutes")?,
            target_kcal_burned: row.get("target_kcal_burned")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// The engine's view of this challenge's targets
    pub fn target(&self) -> ChallengeTarget {
        ChallengeTarget {
            duration_minutes: self.target_duration_minutes,
            kcal_burned: self.target_kcal_burned,
        }
    }

    /// Insert a new challenge
    pub fn create(conn: &Connection, data: &ChallengeCreate) -> DbResult<Self> {
        let start = normalize_date(&data.start_date)?;
        let end = normalize_date(&data.end_date)?;
        if end < start {
            return Err(DbError::InvalidData(format!(
                "challenge window ends before it starts: {} > {}",
                start, end
            )));
        }

        conn.execute(
            r#"
            INSERT INTO challenges (
                user_id, name, start_date, end_date,
                target_duration_minutes, target_kcal_burned, notes
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                data.user_id,
                data.name,
                start,
                end,
                data.target_duration_minutes,
                data.target_kcal_burned,
                data.notes,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::NotFound("challenge"))
    }

    /// Get a challenge by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM challenges WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(challenge) => Ok(Some(challenge)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List a user's challenges, most recent window first
    pub fn list_for_user(conn: &Connection, user_id: i64, limit: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM challenges WHERE user_id = ?1 ORDER BY start_date DESC LIMIT ?2",
        )?;
        let challenges = stmt
            .query_map(params![user_id, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(challenges)
    }

    /// Delete a challenge.
    /// Returns Ok(true) if deleted, Ok(false) if not found.
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM challenges WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_create_normalizes_window_dates() {
        let conn = test_conn();
        let challenge = Challenge::create(
            &conn,
            &ChallengeCreate {
                user_id: 1,
                name: "February burn".to_string(),
                start_date: "2026-02-01T08:00:00".to_string(),
                end_date: "2026-02-28".to_string(),
                target_duration_minutes: Some(600.0),
                target_kcal_burned: Some(5000.0),
                notes: None,
            },
        )
        .unwrap();

        assert_eq!(challenge.start_date, "2026-02-01");
        assert_eq!(challenge.end_date, "2026-02-28");
    }

    #[test]
    fn test_create_rejects_inverted_window() {
        let conn = test_conn();
        let result = Challenge::create(
            &conn,
            &ChallengeCreate {
                user_id: 1,
                name: "backwards".to_string(),
                start_date: "2026-02-28".to_string(),
                end_date: "2026-02-01".to_string(),
                target_duration_minutes: None,
                target_kcal_burned: None,
                notes: None,
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_target_accessor_maps_columns() {
        let conn = test_conn();
        let challenge = Challenge::create(
            &conn,
            &ChallengeCreate {
                user_id: 1,
                name: "duration only".to_string(),
                start_date: "2026-02-01".to_string(),
                end_date: "2026-02-28".to_string(),
                target_duration_minutes: Some(300.0),
                target_kcal_burned: None,
                notes: None,
            },
        )
        .unwrap();

        let target = challenge.target();
        assert_eq!(target.duration_minutes, Some(300.0));
        assert_eq!(target.kcal_burned, None);
        assert_eq!(target.qualifying().len(), 1);
    }
}
