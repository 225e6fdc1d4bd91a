//! Database layer for the patient portal.

mod schema;
mod patients;
mod prescriptions;
mod studies;
mod certificates;

pub use schema::*;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    /// Document data that contradicts the stored identity anchor.
    #[error("Identity mismatch: {0}")]
    IdentityMismatch(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema and bring older files up to date.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        for (table, column, sql_type) in ADDED_COLUMNS {
            if !self.has_column(table, column)? {
                info!(table, column, "adding missing column");
                self.conn.execute_batch(&format!(
                    "ALTER TABLE {} ADD COLUMN {} {}",
                    table, column, sql_type
                ))?;
            }
        }
        Ok(())
    }

    fn has_column(&self, table: &str, column: &str) -> DbResult<bool> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT name FROM pragma_table_info('{}')", table))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names.iter().any(|name| name == column))
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin a transaction.
    pub fn transaction(&mut self) -> DbResult<rusqlite::Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }
}
