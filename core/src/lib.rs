//! Structural schema model and ER diagram graph construction.
//!
//! This crate holds the I/O-free half of the ERD pipeline:
//!
//! - [`SchemaModel`] — introspected tables ([`Table`], [`Column`]) and the
//!   foreign-key [`Relation`]s between them.
//! - [`validate_model`] — catches inconsistent snapshots (duplicate names,
//!   relations to unknown tables) as [`ModelConsistencyError`].
//! - [`build_diagram`] — turns a model into a renderer-neutral
//!   [`DiagramGraph`] with one node per table and one edge per relation.
//! - [`DiagramGraph::to_dot`] — Graphviz DOT source for the graph.
//!
//! # Example
//!
//! ```
//! use library_erd_core::*;
//!
//! let mut model = SchemaModel::new();
//! model.tables.push(Table::new("Members").with_column(Column::primary_key("MemberID", "INTEGER")));
//! model.tables.push(
//!     Table::new("Loans")
//!         .with_column(Column::primary_key("LoanID", "INTEGER"))
//!         .with_column(Column::new("MemberID", "INTEGER").not_null()),
//! );
//! model.relations.push(Relation::new("Loans", "MemberID", "Members", "MemberID"));
//!
//! let graph = build_diagram(&model).unwrap();
//! assert_eq!(graph.nodes.len(), 2);
//! assert_eq!(graph.edges.len(), 1);
//! assert!(graph.to_dot().contains("MemberID → MemberID"));
//! ```

mod diagram;
mod dot;
mod model;
mod validate;

pub use diagram::{
    DiagramGraph, Edge, GraphStyle, Node, NodeRow, Port, build_diagram, build_diagram_with_style,
};
pub use model::{Column, Relation, SchemaModel, Table};
pub use validate::{ModelConsistencyError, validate_model};
