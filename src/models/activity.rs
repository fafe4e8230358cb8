//! Activity model
//!
//! Activity definitions with MET ratings. Each activity is logged either
//! by duration (hour mode) or by repetition count (rep mode), never both.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::engine::energy::ActivitySpec;

/// An activity definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub name: String,
    pub met_value: f64,
    pub supports_rep: bool,
    pub supports_hour: bool,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating an activity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityCreate {
    pub name: String,
    pub met_value: f64,
    pub supports_rep: bool,
    pub supports_hour: bool,
    pub category: Option<String>,
    pub notes: Option<String>,
}

impl Activity {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            met_value: row.get("met_value")?,
            supports_rep: row.get::<_, i32>("supports_rep")? != 0,
            supports_hour: row.get::<_, i32>("supports_hour")? != 0,
            category: row.get("category")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// The engine's view of this activity
    pub fn spec(&self) -> ActivitySpec {
        ActivitySpec {
            met_value: self.met_value,
            supports_rep: self.supports_rep,
            supports_hour: self.supports_hour,
            category: self.category.clone(),
        }
    }

    /// Insert a new activity definition
    pub fn create(conn: &Connection, data: &ActivityCreate) -> DbResult<Self> {
        if data.supports_rep == data.supports_hour {
            return Err(DbError::InvalidData(
                "activity must declare exactly one of rep or hour mode".to_string(),
            ));
        }
        if !data.met_value.is_finite() || data.met_value <= 0.0 {
            return Err(DbError::InvalidData(format!(
                "MET value must be positive, got {}",
                data.met_value
            )));
        }

        conn.execute(
            r#"
            INSERT INTO activities (name, met_value, supports_rep, supports_hour, category, notes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                data.name,
                data.met_value,
                data.supports_rep as i32,
                data.supports_hour as i32,
                data.category,
                data.notes,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::NotFound("activity"))
    }

    /// Get an activity by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM activities WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(activity) => Ok(Some(activity)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Search activities by name
    pub fn search(conn: &Connection, query: &str, limit: i64) -> DbResult<Vec<Self>> {
        let pattern = format!("%{}%", query);
        let mut stmt = conn.prepare(
            "SELECT * FROM activities WHERE name LIKE ?1 ORDER BY name LIMIT ?2",
        )?;

        let activities = stmt
            .query_map(params![pattern, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(activities)
    }

    /// List activities with pagination
    pub fn list(conn: &Connection, limit: i64, offset: i64) -> DbResult<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM activities ORDER BY name LIMIT ?1 OFFSET ?2")?;
        let activities = stmt
            .query_map(params![limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(activities)
    }

    /// Count activity records referencing this activity
    pub fn record_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM activity_records WHERE activity_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete an activity (only allowed if never logged).
    /// Returns Ok(true) if deleted, Ok(false) if not found.
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        if Self::record_count(conn, id)? > 0 {
            return Err(DbError::InvalidData(
                "activity is referenced by logged records".to_string(),
            ));
        }

        let rows = conn.execute("DELETE FROM activities WHERE id = ?1", [id])?;
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
    fn test_create_rejects_ambiguous_mode() {
        let conn = test_conn();

        let both = ActivityCreate {
            name: "rowing".to_string(),
            met_value: 7.0,
            supports_rep: true,
            supports_hour: true,
            category: None,
            notes: None,
        };
        assert!(Activity::create(&conn, &both).is_err());

        let neither = ActivityCreate {
            supports_rep: false,
            supports_hour: false,
            ..both
        };
        assert!(Activity::create(&conn, &neither).is_err());
    }

    #[test]
    fn test_create_and_fetch_roundtrip() {
        let conn = test_conn();
        let created = Activity::create(
            &conn,
            &ActivityCreate {
                name: "running".to_string(),
                met_value: 9.8,
                supports_rep: false,
                supports_hour: true,
                category: None,
                notes: None,
            },
        )
        .unwrap();

        let fetched = Activity::get_by_id(&conn, created.id).unwrap().unwrap();
        assert_eq!(fetched.name, "running");
        assert!(fetched.supports_hour);
        assert!(!fetched.supports_rep);
        assert_eq!(fetched.met_value, 9.8);
    }
}
