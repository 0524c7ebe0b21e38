//! Bundled SQL for the library catalog.
//!
//! The schema and demo data live in `sql/` next to the crate manifest and are
//! embedded at compile time, so a seeded database can be produced without
//! shipping the scripts alongside the binary.
//!
//! # Table structure
//!
//! - `Members`: registered readers, `Email` is unique
//! - `Books`: catalogued titles
//! - `BookCopies`: loanable copies of a book with a `Status`
//! - `Loans`: copy issued to a member; `ActualReturnDate` is NULL while active

/// `CREATE TABLE` / `CREATE INDEX` statements for all catalog tables.
pub const SCHEMA_SQL: &str = include_str!("../sql/library_schema.sql");

/// Demo rows: three titles, four copies, two members, one active loan.
pub const SEED_SQL: &str = include_str!("../sql/library_seed.sql");

/// Catalog tables in dependency order (referenced tables first).
pub const TABLES: [&str; 4] = ["Members", "Books", "BookCopies", "Loans"];

/// Generates SQL to drop all catalog tables in reverse dependency order.
pub fn drop_sql() -> String {
    TABLES
        .iter()
        .rev()
        .map(|table| format!("DROP TABLE IF EXISTS {table};\n"))
        .collect()
}
