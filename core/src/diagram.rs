//! Conversion of a [`SchemaModel`] into an abstract ER diagram graph.
//!
//! The graph is a renderer-neutral description: one [`Node`] per table with
//! its column listing, and one directed [`Edge`] per foreign key. Turning it
//! into an image is left to an external renderer; [`DiagramGraph::to_dot`]
//! produces the Graphviz form.
//!
//! # Example
//!
//! ```
//! use library_erd_core::*;
//!
//! let mut model = SchemaModel::new();
//! model.tables.push(Table::new("Books").with_column(Column::primary_key("BookID", "INTEGER")));
//! model.tables.push(
//!     Table::new("BookCopies")
//!         .with_column(Column::primary_key("CopyID", "INTEGER"))
//!         .with_column(Column::new("BookID", "INTEGER")),
//! );
//! model.relations.push(Relation::new("BookCopies", "BookID", "Books", "BookID"));
//!
//! let graph = build_diagram(&model).unwrap();
//! assert_eq!(graph.nodes.len(), 2);
//! assert_eq!(graph.edges[0].label, "BookID → BookID");
//! ```

use serde::{Deserialize, Serialize};

use crate::validate::{ModelConsistencyError, validate_model};
use crate::{SchemaModel, Table};

/// Compass point an edge attaches to on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Port {
    North,
    East,
    South,
    West,
}

impl Port {
    /// Graphviz compass-point name.
    pub fn as_compass(self) -> &'static str {
        match self {
            Port::North => "n",
            Port::East => "e",
            Port::South => "s",
            Port::West => "w",
        }
    }
}

/// Graph-wide presentation attributes passed through to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphStyle {
    /// Rank direction (`LR`, `TB`, ...).
    pub rank_dir: String,
    /// Edge routing (`ortho`, `spline`, `polyline`, ...).
    pub splines: String,
    pub node_sep: f64,
    pub rank_sep: f64,
    pub font_name: String,
    pub edge_font_size: f64,
    /// Background colour of the table-name header row.
    pub header_color: String,
    /// Marker shown in front of primary-key columns.
    pub primary_key_marker: String,
}

impl Default for GraphStyle {
    fn default() -> Self {
        Self {
            rank_dir: "LR".to_string(),
            splines: "ortho".to_string(),
            node_sep: 1.0,
            rank_sep: 1.5,
            font_name: "Arial".to_string(),
            edge_font_size: 10.0,
            header_color: "#336699".to_string(),
            primary_key_marker: "🔑".to_string(),
        }
    }
}

/// One column line inside a table node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRow {
    pub primary_key: bool,
    pub name: String,
    pub data_type: String,
}

/// A table node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Node identifier; the table name.
    pub id: String,
    /// Header text; the table name.
    pub title: String,
    pub rows: Vec<NodeRow>,
}

impl Node {
    fn from_table(table: &Table) -> Self {
        Self {
            id: table.name.clone(),
            title: table.name.clone(),
            rows: table
                .columns
                .iter()
                .map(|c| NodeRow {
                    primary_key: c.primary_key,
                    name: c.name.clone(),
                    data_type: c.data_type.clone(),
                })
                .collect(),
        }
    }
}

/// A directed foreign-key edge from the referencing to the referenced table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    /// `from_column → to_column`.
    pub label: String,
    pub tail_port: Port,
    pub head_port: Port,
}

impl Edge {
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Renderer-neutral ER diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramGraph {
    /// Graph identifier used by the renderer.
    pub name: String,
    /// Free-form description carried into the rendered source.
    pub comment: String,
    pub style: GraphStyle,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl DiagramGraph {
    /// Finds a node by table name.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Edges leaving or entering the given node.
    pub fn incident_edges<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges
            .iter()
            .filter(move |e| e.source == id || e.target == id)
    }
}

/// Builds the diagram graph with the default [`GraphStyle`].
///
/// # Errors
///
/// Returns [`ModelConsistencyError`] when the model has duplicate tables or
/// columns, or a relation that points at a table outside the model. No
/// partial graph is produced.
pub fn build_diagram(model: &SchemaModel) -> Result<DiagramGraph, ModelConsistencyError> {
    build_diagram_with_style(model, GraphStyle::default())
}

/// Builds the diagram graph with an explicit style.
///
/// Nodes follow the model's table order and edges its relation order.
/// Tables without relations become standalone nodes, and self-referencing
/// keys become self-loop edges.
pub fn build_diagram_with_style(
    model: &SchemaModel,
    style: GraphStyle,
) -> Result<DiagramGraph, ModelConsistencyError> {
    validate_model(model)?;

    let nodes = model.tables.iter().map(Node::from_table).collect();
    let edges = model
        .relations
        .iter()
        .map(|r| Edge {
            source: r.from_table.clone(),
            target: r.to_table.clone(),
            label: r.label(),
            tail_port: Port::East,
            head_port: Port::West,
        })
        .collect();

    Ok(DiagramGraph {
        name: "ERD".to_string(),
        comment: "Library DB Schema".to_string(),
        style,
        nodes,
        edges,
    })
}
