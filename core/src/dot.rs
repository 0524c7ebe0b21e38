//! Graphviz DOT emission for [`DiagramGraph`].
//!
//! Table nodes use HTML-like labels (`shape=plain` with an inner `<table>`),
//! so identifiers and column types are HTML-escaped inside labels and
//! quote-escaped everywhere else.

use std::fmt::Write;

use crate::diagram::{DiagramGraph, Edge, Node};

impl DiagramGraph {
    /// Renders the graph as Graphviz DOT source.
    ///
    /// # Examples
    ///
    /// ```
    /// use library_erd_core::*;
    ///
    /// let mut model = SchemaModel::new();
    /// model.tables.push(Table::new("Members").with_column(Column::primary_key("MemberID", "INTEGER")));
    /// let dot = build_diagram(&model).unwrap().to_dot();
    /// assert!(dot.starts_with("digraph \"ERD\" {"));
    /// assert!(dot.contains("<b>Members</b>"));
    /// ```
    pub fn to_dot(&self) -> String {
        let style = &self.style;
        let mut out = String::new();

        let _ = writeln!(out, "digraph {} {{", quote(&self.name));
        if !self.comment.is_empty() {
            let _ = writeln!(out, "    // {}", self.comment.replace('\n', " "));
        }
        let _ = writeln!(
            out,
            "    graph [rankdir={}, splines={}, nodesep=\"{}\", ranksep=\"{}\", fontname={}];",
            quote(&style.rank_dir),
            quote(&style.splines),
            style.node_sep,
            style.rank_sep,
            quote(&style.font_name)
        );
        let _ = writeln!(
            out,
            "    node [shape=\"plain\", fontname={}];",
            quote(&style.font_name)
        );
        let _ = writeln!(
            out,
            "    edge [fontname={}, fontsize=\"{}\"];",
            quote(&style.font_name),
            style.edge_font_size
        );

        for node in &self.nodes {
            let _ = writeln!(
                out,
                "    {} [label=<{}>];",
                quote(&node.id),
                self.node_label(node)
            );
        }

        for edge in &self.edges {
            let _ = writeln!(out, "    {}", edge_statement(edge));
        }

        out.push_str("}\n");
        out
    }

    fn node_label(&self, node: &Node) -> String {
        let style = &self.style;
        let mut label = String::from(r#"<table border="1" cellborder="1" cellspacing="0">"#);
        let _ = write!(
            label,
            r#"<tr><td bgcolor="{}" colspan="2"><font color="white"><b>{}</b></font></td></tr>"#,
            escape_html(&style.header_color),
            escape_html(&node.title)
        );
        for row in &node.rows {
            let marker = if row.primary_key {
                style.primary_key_marker.as_str()
            } else {
                ""
            };
            let _ = write!(
                label,
                r#"<tr><td align="left">{} {}</td><td align="left">{}</td></tr>"#,
                escape_html(marker),
                escape_html(&row.name),
                escape_html(&row.data_type)
            );
        }
        label.push_str("</table>");
        label
    }
}

fn edge_statement(edge: &Edge) -> String {
    format!(
        "{} -> {} [label={}, tailport=\"{}\", headport=\"{}\"];",
        quote(&edge.source),
        quote(&edge.target),
        quote(&edge.label),
        edge.tail_port.as_compass(),
        edge.head_port.as_compass()
    )
}

/// Wraps a DOT identifier in double quotes.
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
