//! Schema introspection through SQLite catalog metadata.
//!
//! Reads `sqlite_master` for the user tables, then `pragma_table_info` and
//! `pragma_foreign_key_list` per table, and assembles a
//! [`SchemaModel`]. Only read queries are issued.
//!
//! Table order is the catalog's storage order (normally creation order).
//! Relations are reported table by table in the order SQLite lists the
//! foreign keys. Use [`introspect_sorted`] when a stable, name-ordered model
//! is needed.
//!
//! # Example
//!
//! ```no_run
//! use library_erd_sqlite::introspect;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("library.db").unwrap();
//! let model = introspect(&conn).unwrap();
//! for table in &model.tables {
//!     println!("{} ({} columns)", table.name, table.columns.len());
//! }
//! ```

use library_erd_core::{Column, Relation, SchemaModel, Table};
use rusqlite::{Connection, params};
use tracing::debug;

use crate::error::{Result, store_err, store_err_for};

/// Target column used when a foreign key references a table without a
/// declared primary key.
const IMPLICIT_KEY: &str = "rowid";

/// One row of `pragma_foreign_key_list`, before the target column is resolved.
struct ForeignKeyRow {
    /// Position of the column within a composite key, starting at 0.
    seq: usize,
    to_table: String,
    from_column: String,
    /// NULL when the key references the parent's primary key implicitly.
    to_column: Option<String>,
}

/// Reads the structural model of every user table.
///
/// # Errors
///
/// Returns [`StoreError::StoreAccess`](crate::StoreError::StoreAccess) if any
/// catalog query fails. No partial model is returned.
pub fn introspect(conn: &Connection) -> Result<SchemaModel> {
    let names = list_tables(conn)?;

    let mut model = SchemaModel::new();
    for name in &names {
        let columns = table_columns(conn, name)?;
        model.tables.push(Table {
            name: name.clone(),
            columns,
        });
    }

    for name in &names {
        for fk in foreign_keys(conn, name)? {
            let to_column = match fk.to_column {
                Some(column) => column,
                None => implicit_target(conn, &fk.to_table, fk.seq)?,
            };
            model.relations.push(Relation {
                from_table: name.clone(),
                from_column: fk.from_column,
                to_table: fk.to_table,
                to_column,
            });
        }
    }

    debug!(
        tables = model.tables.len(),
        relations = model.relations.len(),
        "schema introspected"
    );
    Ok(model)
}

/// Like [`introspect`], with tables sorted by name.
pub fn introspect_sorted(conn: &Connection) -> Result<SchemaModel> {
    Ok(introspect(conn)?.sorted())
}

/// User table names, excluding SQLite's internal `sqlite_*` tables.
pub fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
        .map_err(store_err("list tables"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(store_err("list tables"))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(store_err("list tables"))?;
    Ok(names)
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<Column>> {
    let key = format!("table {table}");
    let mut stmt = conn
        .prepare(r#"SELECT name, type, "notnull", pk FROM pragma_table_info(?1) ORDER BY cid"#)
        .map_err(store_err_for("describe columns", &key))?;
    let columns = stmt
        .query_map(params![table], |row| {
            Ok(Column {
                name: row.get(0)?,
                data_type: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                not_null: row.get::<_, i64>(2)? != 0,
                primary_key: row.get::<_, i64>(3)? > 0,
            })
        })
        .map_err(store_err_for("describe columns", &key))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(store_err_for("describe columns", &key))?;
    Ok(columns)
}

fn foreign_keys(conn: &Connection, table: &str) -> Result<Vec<ForeignKeyRow>> {
    let key = format!("table {table}");
    let mut stmt = conn
        .prepare(
            r#"SELECT seq, "table", "from", "to" FROM pragma_foreign_key_list(?1) ORDER BY id, seq"#,
        )
        .map_err(store_err_for("list foreign keys", &key))?;
    let rows = stmt
        .query_map(params![table], |row| {
            Ok(ForeignKeyRow {
                seq: row.get::<_, i64>(0)?.try_into().unwrap_or_default(),
                to_table: row.get(1)?,
                from_column: row.get(2)?,
                to_column: row.get(3)?,
            })
        })
        .map_err(store_err_for("list foreign keys", &key))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(store_err_for("list foreign keys", &key))?;
    Ok(rows)
}

/// Primary-key column of `table` at key position `seq`, or `rowid` when the
/// table declares no primary key (or does not exist).
fn implicit_target(conn: &Connection, table: &str, seq: usize) -> Result<String> {
    let key = format!("table {table}");
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info(?1) WHERE pk > 0 ORDER BY pk")
        .map_err(store_err_for("resolve implicit key", &key))?;
    let mut primary_key = stmt
        .query_map(params![table], |row| row.get::<_, String>(0))
        .map_err(store_err_for("resolve implicit key", &key))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(store_err_for("resolve implicit key", &key))?;
    if seq < primary_key.len() {
        Ok(primary_key.swap_remove(seq))
    } else {
        Ok(IMPLICIT_KEY.to_string())
    }
}
