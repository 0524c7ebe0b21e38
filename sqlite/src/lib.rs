//! SQLite backend for the library catalog demo.
//!
//! This crate owns everything that touches the database:
//!
//! - **`schema`** — the bundled catalog DDL and demo data
//! - **`migration`** — lifecycle operations (up/down/seed/refresh/status)
//! - **`catalog`** — member, copy and loan operations with typed records
//! - **`introspect`** — reads catalog metadata into a
//!   [`SchemaModel`](library_erd_core::SchemaModel)
//!
//! # Quick start
//!
//! ```no_run
//! use library_erd_sqlite::{Catalog, Migration, introspect};
//! use rusqlite::Connection;
//!
//! let mut migration = Migration::new(Connection::open("library.db").unwrap()).unwrap();
//! migration.up().unwrap();
//! migration.seed().unwrap();
//! let conn = migration.into_connection();
//!
//! let catalog = Catalog::new(&conn).unwrap();
//! println!("{} active loans", catalog.list_active_loans().unwrap().len());
//!
//! let model = introspect(&conn).unwrap();
//! println!("{} tables, {} relations", model.tables.len(), model.relations.len());
//! ```

mod catalog;
mod error;
mod introspect;
mod migration;
mod records;
mod schema;

pub use catalog::{Catalog, LOAN_PERIOD_DAYS};
pub use error::{Result, StoreError};
pub use introspect::{introspect, introspect_sorted, list_tables};
pub use migration::{Migration, MigrationStatus};
pub use records::{ActiveLoan, CopyId, CopyStatus, LoanId, LoanReceipt, MemberId};
pub use schema::{SCHEMA_SQL, SEED_SQL, TABLES};
