//! Structural model of an introspected relational schema.
//!
//! A [`SchemaModel`] is the in-memory result of reading a database catalog:
//! the user tables with their ordered columns, and the foreign-key
//! [`Relation`]s between them. The model is rebuilt on every run and never
//! persisted.

use serde::{Deserialize, Serialize};

/// A single column of a table.
///
/// # Examples
///
/// ```
/// use library_erd_core::Column;
///
/// let id = Column::primary_key("MemberID", "INTEGER");
/// assert!(id.primary_key);
///
/// let email = Column::new("Email", "TEXT").not_null();
/// assert!(email.not_null);
/// assert!(!email.primary_key);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name, unique within its table.
    pub name: String,
    /// Declared type as written in the DDL. SQLite allows this to be empty.
    pub data_type: String,
    /// Whether the column is part of the primary key.
    pub primary_key: bool,
    /// Whether the column carries a `NOT NULL` constraint.
    #[serde(default)]
    pub not_null: bool,
}

impl Column {
    /// Creates a nullable, non-key column.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            primary_key: false,
            not_null: false,
        }
    }

    /// Creates a primary-key column.
    pub fn primary_key(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            primary_key: true,
            ..Self::new(name, data_type)
        }
    }

    /// Marks the column as `NOT NULL`.
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }
}

/// A table and its columns in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl Table {
    /// Creates an empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Appends a column (builder-style).
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Finds a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns the primary-key columns in declaration order.
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.primary_key)
    }
}

/// A foreign-key reference from one table column to another.
///
/// # Examples
///
/// ```
/// use library_erd_core::Relation;
///
/// let rel = Relation::new("Loans", "MemberID", "Members", "MemberID");
/// assert_eq!(rel.label(), "MemberID → MemberID");
/// assert!(!rel.is_self_reference());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
}

impl Relation {
    pub fn new(
        from_table: impl Into<String>,
        from_column: impl Into<String>,
        to_table: impl Into<String>,
        to_column: impl Into<String>,
    ) -> Self {
        Self {
            from_table: from_table.into(),
            from_column: from_column.into(),
            to_table: to_table.into(),
            to_column: to_column.into(),
        }
    }

    /// Edge label in `from_column → to_column` form.
    pub fn label(&self) -> String {
        format!("{} → {}", self.from_column, self.to_column)
    }

    /// True when the key points back at its own table.
    pub fn is_self_reference(&self) -> bool {
        self.from_table == self.to_table
    }
}

/// Introspected tables and the relations between them.
///
/// Table order is the order the catalog reported them in; relation order is
/// discovery order. Neither is guaranteed to be alphabetical unless the
/// model was passed through [`SchemaModel::sorted`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaModel {
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl SchemaModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a table by name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Returns the table names in model order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    /// Relations declared by (not pointing at) the given table.
    pub fn relations_from<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a Relation> {
        self.relations.iter().filter(move |r| r.from_table == table)
    }

    /// Returns a copy with tables sorted by name.
    ///
    /// Relations are regrouped to follow the new table order while keeping
    /// their relative discovery order within each source table.
    pub fn sorted(&self) -> Self {
        let mut tables = self.tables.clone();
        tables.sort_by(|a, b| a.name.cmp(&b.name));

        let mut relations = Vec::with_capacity(self.relations.len());
        for table in &tables {
            relations.extend(self.relations_from(&table.name).cloned());
        }
        // Relations whose source table is not in the model keep their place
        // at the end so validation can still report them.
        relations.extend(
            self.relations
                .iter()
                .filter(|r| self.table(&r.from_table).is_none())
                .cloned(),
        );

        Self { tables, relations }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library_model() -> SchemaModel {
        SchemaModel {
            tables: vec![
                Table::new("Members").with_column(Column::primary_key("MemberID", "INTEGER")),
                Table::new("Books").with_column(Column::primary_key("BookID", "INTEGER")),
                Table::new("BookCopies")
                    .with_column(Column::primary_key("CopyID", "INTEGER"))
                    .with_column(Column::new("BookID", "INTEGER").not_null()),
            ],
            relations: vec![Relation::new("BookCopies", "BookID", "Books", "BookID")],
        }
    }

    #[test]
    fn test_table_lookup() {
        let model = library_model();
        assert!(model.table("Books").is_some());
        assert!(model.table("books").is_none());
        assert_eq!(
            model.table_names().collect::<Vec<_>>(),
            vec!["Members", "Books", "BookCopies"]
        );
    }

    #[test]
    fn test_primary_key_columns() {
        let model = library_model();
        let copies = model.table("BookCopies").unwrap();
        let pks: Vec<_> = copies.primary_key_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(pks, vec!["CopyID"]);
        assert!(copies.column("BookID").unwrap().not_null);
    }

    #[test]
    fn test_sorted_orders_tables_and_relations() {
        let mut model = library_model();
        model
            .relations
            .insert(0, Relation::new("Members", "MemberID", "Members", "MemberID"));

        let sorted = model.sorted();
        assert_eq!(
            sorted.table_names().collect::<Vec<_>>(),
            vec!["BookCopies", "Books", "Members"]
        );
        assert_eq!(sorted.relations[0].from_table, "BookCopies");
        assert_eq!(sorted.relations[1].from_table, "Members");
    }

    #[test]
    fn test_sorted_keeps_orphan_relations() {
        let mut model = library_model();
        model
            .relations
            .push(Relation::new("Ghost", "X", "Books", "BookID"));
        let sorted = model.sorted();
        assert_eq!(sorted.relations.len(), 2);
        assert_eq!(sorted.relations[1].from_table, "Ghost");
    }

    #[test]
    fn test_model_json_roundtrip_defaults() {
        let json = r#"{"tables":[{"name":"Books"}]}"#;
        let model: SchemaModel = serde_json::from_str(json).unwrap();
        assert_eq!(model.tables.len(), 1);
        assert!(model.tables[0].columns.is_empty());
        assert!(model.relations.is_empty());
    }
}
