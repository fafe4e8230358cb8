//! Water entry model
//!
//! Water intake attached to a daily ledger. Kept as linked entries so the
//! ledger's water total is recomputed like every other derived field.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use super::{recompute_ledger, DailyLedger};

/// A logged water intake
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterEntry {
    pub id: i64,
    pub ledger_id: i64,
    pub liters: f64,
    pub created_at: String,
}

impl WaterEntry {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            ledger_id: row.get("ledger_id")?,
            liters: row.get("liters")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Log water intake and recompute the ledger
    pub fn create(conn: &mut Connection, ledger_id: i64, liters: f64) -> DbResult<Self> {
        if DailyLedger::get_by_id(conn, ledger_id)?.is_none() {
            return Err(DbError::NotFound("daily ledger"));
        }
        if !liters.is_finite() || liters <= 0.0 {
            return Err(DbError::InvalidData(format!(
                "liters must be positive, got {}",
                liters
            )));
        }

        conn.execute(
            "INSERT INTO water_entries (ledger_id, liters) VALUES (?1, ?2)",
            params![ledger_id, liters],
        )?;

        let id = conn.last_insert_rowid();
        let entry = Self::get_by_id(conn, id)?.ok_or(DbError::NotFound("water entry"))?;

        recompute_ledger(conn, ledger_id)?;

        Ok(entry)
    }

    /// Get a water entry by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM water_entries WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List water entries for a ledger
    pub fn list_for_ledger(conn: &Connection, ledger_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM water_entries WHERE ledger_id = ?1 ORDER BY id")?;
        let entries = stmt
            .query_map([ledger_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Delete a water entry and recompute its ledger.
    /// Returns Ok(true) if deleted, Ok(false) if not found.
    pub fn delete(conn: &mut Connection, id: i64) -> DbResult<bool> {
        let entry = match Self::get_by_id(conn, id)? {
            Some(e) => e,
            None => return Ok(false),
        };

        let rows = conn.execute("DELETE FROM water_entries WHERE id = ?1", [id])?;
        if rows > 0 {
            recompute_ledger(conn, entry.ledger_id)?;
        }

        Ok(rows > 0)
    }
}
