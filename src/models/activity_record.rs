//! Activity record model
//!
//! One logged occurrence of an activity. The burned-calorie estimate is
//! computed through the energy calculator at log time and frozen on the
//! record; the ledger is recomputed from those cached values.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::engine::energy::{estimate_kcal_burned, Effort, EnergyConfig};
use crate::engine::progress::MetricSample;
use super::{recompute_ledger, Activity, DailyLedger};

/// A logged activity occurrence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: i64,
    pub ledger_id: i64,
    pub activity_id: i64,
    pub duration_minutes: Option<f64>,
    pub reps: Option<f64>,
    pub intensity_level: u8,
    /// Body weight the estimate was computed with
    pub weight_kg: f64,
    pub cached_kcal_burned: f64,
    /// Effective minutes, derived for rep-mode records
    pub cached_duration_minutes: f64,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for logging an activity occurrence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecordCreate {
    pub ledger_id: i64,
    pub activity_id: i64,
    pub duration_minutes: Option<f64>,
    pub reps: Option<f64>,
    pub intensity_level: Option<u8>,
    pub weight_kg: Option<f64>,
    pub notes: Option<String>,
}

impl ActivityRecord {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            ledger_id: row.get("ledger_id")?,
            activity_id: row.get("activity_id")?,
            duration_minutes: row.get("duration_minutes")?,
            reps: row.get("reps")?,
            intensity_level: row.get::<_, i64>("intensity_level")? as u8,
            weight_kg: row.get("weight_kg")?,
            cached_kcal_burned: row.get("cached_kcal_burned")?,
            cached_duration_minutes: row.get("cached_duration_minutes")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// This record's contribution to challenge metrics
    pub fn metric_sample(&self) -> MetricSample {
        MetricSample {
            duration_minutes: self.cached_duration_minutes,
            kcal_burned: self.cached_kcal_burned,
        }
    }

    /// Log an activity occurrence and recompute the ledger.
    ///
    /// The record is validated against the activity's declared mode and the
    /// estimate is computed before anything is written.
    pub fn create(
        conn: &mut Connection,
        data: &ActivityRecordCreate,
        config: &EnergyConfig,
    ) -> DbResult<Self> {
        if DailyLedger::get_by_id(conn, data.ledger_id)?.is_none() {
            return Err(DbError::NotFound("daily ledger"));
        }
        let activity =
            Activity::get_by_id(conn, data.activity_id)?.ok_or(DbError::NotFound("activity"))?;

        let effort = Effort {
            duration_minutes: data.duration_minutes,
            reps: data.reps,
            intensity_level: data.intensity_level,
            weight_kg: data.weight_kg,
        };
        let estimate = estimate_kcal_burned(&activity.spec(), &effort, config)
            .map_err(|e| DbError::InvalidData(e.to_string()))?;

        conn.execute(
            r#"
            INSERT INTO activity_records (
                ledger_id, activity_id, duration_minutes, reps, intensity_level,
                weight_kg, cached_kcal_burned, cached_duration_minutes, notes
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                data.ledger_id,
                data.activity_id,
                data.duration_minutes,
                data.reps,
                data.intensity_level
                    .unwrap_or(crate::engine::energy::DEFAULT_INTENSITY_LEVEL) as i64,
                estimate.weight_kg,
                estimate.kcal_burned,
                estimate.minutes,
                data.notes,
            ],
        )?;

        let id = conn.last_insert_rowid();
        let record = Self::get_by_id(conn, id)?.ok_or(DbError::NotFound("activity record"))?;

        recompute_ledger(conn, data.ledger_id)?;

        Ok(record)
    }

    /// Get an activity record by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM activity_records WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List activity records for a ledger
    pub fn list_for_ledger(conn: &Connection, ledger_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM activity_records WHERE ledger_id = ?1 ORDER BY id")?;
        let records = stmt
            .query_map([ledger_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// List a user's activity records with ledger dates inside an inclusive
    /// date range. Feeds challenge scoring.
    pub fn list_for_user_between(
        conn: &Connection,
        user_id: i64,
        start_date: &str,
        end_date: &str,
    ) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT r.* FROM activity_records r
            JOIN daily_ledgers l ON r.ledger_id = l.id
            WHERE l.user_id = ?1 AND l.date >= ?2 AND l.date <= ?3
            ORDER BY l.date, r.id
            "#,
        )?;
        let records = stmt
            .query_map(params![user_id, start_date, end_date], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Delete an activity record and recompute its ledger.
    /// Returns Ok(true) if deleted, Ok(false) if not found.
    pub fn delete(conn: &mut Connection, id: i64) -> DbResult<bool> {
        let record = match Self::get_by_id(conn, id)? {
            Some(r) => r,
            None => return Ok(false),
        };

        let rows = conn.execute("DELETE FROM activity_records WHERE id = ?1", [id])?;
        if rows > 0 {
            recompute_ledger(conn, record.ledger_id)?;
        }

        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::ActivityCreate;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn seed(conn: &mut Connection) -> (i64, i64) {
        let ledger = DailyLedger::get_or_create(conn, 7, "2026-02-01").unwrap();
        let activity = Activity::create(
            conn,
            &ActivityCreate {
                name: "cycling".to_string(),
                met_value: 8.0,
                supports_rep: false,
                supports_hour: true,
                category: None,
                notes: None,
            },
        )
        .unwrap();
        (ledger.id, activity.id)
    }

    #[test]
    fn test_create_caches_engine_estimate() {
        let mut conn = test_conn();
        let (ledger_id, activity_id) = seed(&mut conn);

        let record = ActivityRecord::create(
            &mut conn,
            &ActivityRecordCreate {
                ledger_id,
                activity_id,
                duration_minutes: Some(30.0),
                reps: None,
                intensity_level: None,
                weight_kg: Some(70.0),
                notes: None,
            },
            &EnergyConfig::default(),
        )
        .unwrap();

        assert_eq!(record.cached_kcal_burned, 294.0);
        assert_eq!(record.cached_duration_minutes, 30.0);
        assert_eq!(record.intensity_level, 3);
        assert_eq!(record.weight_kg, 70.0);
    }

    #[test]
    fn test_create_rejects_mode_mismatch() {
        let mut conn = test_conn();
        let (ledger_id, activity_id) = seed(&mut conn);

        let result = ActivityRecord::create(
            &mut conn,
            &ActivityRecordCreate {
                ledger_id,
                activity_id,
                duration_minutes: None,
                reps: Some(50.0),
                intensity_level: None,
                weight_kg: Some(70.0),
                notes: None,
            },
            &EnergyConfig::default(),
        );
        assert!(result.is_err());

        // Nothing was written and the ledger is untouched
        assert!(ActivityRecord::list_for_ledger(&conn, ledger_id)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_window_query_filters_by_user_and_date() {
        let mut conn = test_conn();
        let (ledger_id, activity_id) = seed(&mut conn);

        let record = |conn: &mut Connection, ledger_id| {
            ActivityRecord::create(
                conn,
                &ActivityRecordCreate {
                    ledger_id,
                    activity_id,
                    duration_minutes: Some(10.0),
                    reps: None,
                    intensity_level: None,
                    weight_kg: Some(70.0),
                    notes: None,
                },
                &EnergyConfig::default(),
            )
            .unwrap()
        };

        record(&mut conn, ledger_id);

        // Same user, outside the window
        let late = DailyLedger::get_or_create(&conn, 7, "2026-03-15").unwrap();
        record(&mut conn, late.id);

        // Different user, inside the window
        let other = DailyLedger::get_or_create(&conn, 8, "2026-02-01").unwrap();
        record(&mut conn, other.id);

        let hits =
            ActivityRecord::list_for_user_between(&conn, 7, "2026-02-01", "2026-02-28").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].ledger_id, ledger_id);
    }
}
