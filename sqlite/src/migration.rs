//! Lifecycle operations for the library catalog tables.
//!
//! Provides [`Migration`] for creating, dropping, seeding, and refreshing the
//! catalog schema. The bundled scripts run in a transaction, so a failing
//! step leaves the database as it was.
//!
//! # Example
//!
//! ```no_run
//! use library_erd_sqlite::Migration;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("library.db").unwrap();
//! let mut migration = Migration::new(conn).unwrap();
//!
//! migration.up().unwrap();
//! migration.seed().unwrap();
//!
//! let status = migration.status().unwrap();
//! println!("Books: {}, active loans: {}", status.book_count, status.active_loan_count);
//! ```

use std::path::Path;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{Result, StoreError, store_err, store_err_for};
use crate::schema::{SCHEMA_SQL, SEED_SQL, drop_sql};

/// Manages the lifecycle of the catalog tables on an owned connection.
pub struct Migration {
    conn: Connection,
}

impl Migration {
    /// Wraps a connection and enables foreign-key enforcement on it.
    pub fn new(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(store_err("enable foreign keys"))?;
        Ok(Self { conn })
    }

    /// Creates all catalog tables and indexes.
    ///
    /// Uses `CREATE TABLE IF NOT EXISTS` so it is safe to call multiple times.
    pub fn up(&mut self) -> Result<()> {
        self.execute_in_transaction("create tables", SCHEMA_SQL)?;
        info!("catalog tables created");
        Ok(())
    }

    /// Drops all catalog tables in reverse dependency order.
    pub fn down(&mut self) -> Result<()> {
        self.execute_in_transaction("drop tables", &drop_sql())?;
        info!("catalog tables dropped");
        Ok(())
    }

    /// Inserts the bundled demo data.
    pub fn seed(&mut self) -> Result<MigrationStatus> {
        self.execute_in_transaction("seed demo data", SEED_SQL)?;
        let status = self.status()?;
        info!(
            members = status.member_count,
            books = status.book_count,
            copies = status.copy_count,
            loans = status.loan_count,
            "demo data seeded"
        );
        Ok(status)
    }

    /// Executes an external SQL script (schema and/or data) as written.
    ///
    /// The script is not wrapped in a transaction, so dumps that carry their
    /// own `BEGIN TRANSACTION; ... COMMIT;` run unchanged. If a statement
    /// fails while the script's own transaction is open, that transaction is
    /// rolled back.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Script`] if the file cannot be read, or
    /// [`StoreError::StoreAccess`] if any statement fails.
    pub fn run_script(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let sql = std::fs::read_to_string(path).map_err(|source| StoreError::Script {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = sql.len(), "executing SQL script");

        if let Err(err) = self.conn.execute_batch(&sql) {
            if !self.conn.is_autocommit() {
                // Best effort; the statement error is the one worth reporting.
                let _ = self.conn.execute_batch("ROLLBACK");
            }
            return Err(store_err_for("execute SQL script", path.display())(err));
        }
        Ok(())
    }

    /// Drops, recreates and reseeds the catalog.
    pub fn refresh(&mut self) -> Result<MigrationStatus> {
        self.down()?;
        self.up()?;
        self.seed()
    }

    /// Returns whether the tables exist and how many rows each holds.
    pub fn status(&self) -> Result<MigrationStatus> {
        if !self.tables_exist()? {
            return Ok(MigrationStatus::default());
        }

        Ok(MigrationStatus {
            tables_exist: true,
            member_count: self.count_rows("Members", None)?,
            book_count: self.count_rows("Books", None)?,
            copy_count: self.count_rows("BookCopies", None)?,
            loan_count: self.count_rows("Loans", None)?,
            active_loan_count: self.count_rows("Loans", Some("ActualReturnDate IS NULL"))?,
        })
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Consumes the migration and returns the underlying connection.
    pub fn into_connection(self) -> Connection {
        self.conn
    }

    fn execute_in_transaction(&mut self, operation: &'static str, sql: &str) -> Result<()> {
        let tx = self.conn.transaction().map_err(store_err(operation))?;
        tx.execute_batch(sql).map_err(store_err(operation))?;
        tx.commit().map_err(store_err(operation))?;
        Ok(())
    }

    /// Checks whether every catalog table exists.
    fn tables_exist(&self) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1")
            .map_err(store_err("read migration status"))?;
        for table in crate::schema::TABLES {
            let count: i64 = stmt
                .query_row([table], |row| row.get(0))
                .map_err(store_err("read migration status"))?;
            if count == 0 {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn count_rows(&self, table: &str, filter: Option<&str>) -> Result<usize> {
        let sql = match filter {
            Some(filter) => format!("SELECT COUNT(*) FROM {table} WHERE {filter}"),
            None => format!("SELECT COUNT(*) FROM {table}"),
        };
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(store_err_for("count rows", format!("table {table}")))?;
        Ok(count as usize)
    }
}

/// Snapshot of the catalog tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Whether all catalog tables exist.
    pub tables_exist: bool,
    pub member_count: usize,
    pub book_count: usize,
    pub copy_count: usize,
    pub loan_count: usize,
    /// Loans without an actual return date.
    pub active_loan_count: usize,
}
