//! Structural consistency checks for a [`SchemaModel`].
//!
//! Introspection reads the catalog one table at a time, so a snapshot taken
//! while the schema changes can contain relations pointing at tables that are
//! no longer (or not yet) listed. These checks catch that before a diagram is
//! built, so no dangling edge is ever emitted.
//!
//! # Examples
//!
//! ```
//! use library_erd_core::*;
//!
//! let mut model = SchemaModel::new();
//! model.tables.push(Table::new("Loans"));
//! assert!(validate_model(&model).is_ok());
//!
//! model.relations.push(Relation::new("Loans", "MemberID", "Members", "MemberID"));
//! let err = validate_model(&model).unwrap_err();
//! assert!(matches!(err, ModelConsistencyError::UnknownTable { .. }));
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{Relation, SchemaModel};

/// The model is not a consistent snapshot of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelConsistencyError {
    /// A relation names a table that is not part of the model.
    #[error(
        "relation {}.{} -> {}.{} references unknown table '{table}'",
        .relation.from_table,
        .relation.from_column,
        .relation.to_table,
        .relation.to_column
    )]
    UnknownTable {
        /// The offending relation.
        relation: Relation,
        /// The missing table name (source or target).
        table: String,
    },
    /// Two tables share a name.
    #[error("duplicate table in model: {0}")]
    DuplicateTable(String),
    /// Two columns in the same table share a name.
    #[error("duplicate column '{column}' in table '{table}'")]
    DuplicateColumn { table: String, column: String },
}

/// Checks that table and column names are unique and that every relation
/// connects two tables of the model.
///
/// Returns the first problem found, in table order then relation order.
pub fn validate_model(model: &SchemaModel) -> Result<(), ModelConsistencyError> {
    let mut tables: HashSet<&str> = HashSet::with_capacity(model.tables.len());
    for table in &model.tables {
        if !tables.insert(table.name.as_str()) {
            return Err(ModelConsistencyError::DuplicateTable(table.name.clone()));
        }

        let mut columns: HashSet<&str> = HashSet::with_capacity(table.columns.len());
        for column in &table.columns {
            if !columns.insert(column.name.as_str()) {
                return Err(ModelConsistencyError::DuplicateColumn {
                    table: table.name.clone(),
                    column: column.name.clone(),
                });
            }
        }
    }

    for relation in &model.relations {
        for endpoint in [&relation.from_table, &relation.to_table] {
            if !tables.contains(endpoint.as_str()) {
                return Err(ModelConsistencyError::UnknownTable {
                    relation: relation.clone(),
                    table: endpoint.clone(),
                });
            }
        }
    }

    Ok(())
}
