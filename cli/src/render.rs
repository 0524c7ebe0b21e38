//! Render collaborators that turn a [`DiagramGraph`] into a file.
//!
//! [`GraphvizRenderer`] shells out to Graphviz `dot`; a missing binary, a
//! non-zero exit or a timeout is reported as [`RenderError::Unavailable`],
//! which callers keep apart from store errors. [`DotFileRenderer`] and
//! [`JsonFileRenderer`] only write files and never need external tools.

use std::ffi::OsString;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use library_erd_core::DiagramGraph;
use thiserror::Error;
use tracing::{debug, info};
use wait_timeout::ChildExt;

use crate::config::{DiagramFormat, RenderConfig};

#[derive(Debug, Error)]
pub enum RenderError {
    /// The external renderer is missing or failed.
    #[error("renderer unavailable: {0}")]
    Unavailable(String),

    #[error("failed to write '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize diagram: {0}")]
    Json(#[from] serde_json::Error),
}

/// Produces an artifact for a diagram at `base` plus a format extension.
pub trait Renderer {
    /// Renders the graph and returns the path of the produced file.
    fn render(&self, graph: &DiagramGraph, base: &Path) -> Result<PathBuf, RenderError>;
}

/// Picks the renderer for an output format.
pub fn renderer_for(format: DiagramFormat, config: &RenderConfig) -> Box<dyn Renderer> {
    match format {
        DiagramFormat::Dot => Box::new(DotFileRenderer),
        DiagramFormat::Json => Box::new(JsonFileRenderer),
        DiagramFormat::Png | DiagramFormat::Svg | DiagramFormat::Pdf => {
            Box::new(GraphvizRenderer::new(format, config))
        }
    }
}

/// Writes the DOT source only.
pub struct DotFileRenderer;

impl Renderer for DotFileRenderer {
    fn render(&self, graph: &DiagramGraph, base: &Path) -> Result<PathBuf, RenderError> {
        let path = with_extension(base, "dot");
        write_file(&path, graph.to_dot().as_bytes())?;
        Ok(path)
    }
}

/// Writes the graph description as pretty-printed JSON.
pub struct JsonFileRenderer;

impl Renderer for JsonFileRenderer {
    fn render(&self, graph: &DiagramGraph, base: &Path) -> Result<PathBuf, RenderError> {
        let path = with_extension(base, "json");
        let raw = serde_json::to_string_pretty(graph)?;
        write_file(&path, raw.as_bytes())?;
        Ok(path)
    }
}

/// Renders through the Graphviz `dot` executable.
pub struct GraphvizRenderer {
    binary: String,
    format: DiagramFormat,
    timeout: Duration,
    keep_source: bool,
}

impl GraphvizRenderer {
    pub fn new(format: DiagramFormat, config: &RenderConfig) -> Self {
        Self {
            binary: config.dot_binary.clone(),
            format,
            timeout: Duration::from_secs(config.timeout_secs),
            keep_source: config.keep_source,
        }
    }

    fn run_dot(&self, source: &Path, target: &Path) -> Result<(), RenderError> {
        let mut command = Command::new(&self.binary);
        command
            .arg(format!("-T{}", self.format.extension()))
            .arg(source)
            .arg("-o")
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        debug!(binary = %self.binary, source = %source.display(), "running graphviz");

        let mut child = command.spawn().map_err(|err| {
            RenderError::Unavailable(if err.kind() == std::io::ErrorKind::NotFound {
                format!(
                    "'{}' not found; install Graphviz (the program, not only a library)",
                    self.binary
                )
            } else {
                format!("failed to start '{}': {err}", self.binary)
            })
        })?;

        // Drain stderr in the background so a chatty renderer cannot block on
        // a full pipe while we wait for it.
        let stderr_thread = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut buf = String::new();
                let _ = pipe.read_to_string(&mut buf);
                buf
            })
        });

        let status = match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(RenderError::Unavailable(format!(
                    "'{}' timed out after {}s",
                    self.binary,
                    self.timeout.as_secs()
                )));
            }
            Err(err) => {
                let _ = child.kill();
                return Err(RenderError::Unavailable(format!(
                    "failed waiting for '{}': {err}",
                    self.binary
                )));
            }
        };

        let stderr = stderr_thread
            .and_then(|t| t.join().ok())
            .unwrap_or_default();
        if !status.success() {
            let detail = stderr.lines().next().unwrap_or("no diagnostic output");
            return Err(RenderError::Unavailable(format!(
                "'{}' exited with {status}: {detail}",
                self.binary
            )));
        }
        Ok(())
    }
}

impl Renderer for GraphvizRenderer {
    fn render(&self, graph: &DiagramGraph, base: &Path) -> Result<PathBuf, RenderError> {
        let source = with_extension(base, "dot");
        let target = with_extension(base, self.format.extension());
        write_file(&source, graph.to_dot().as_bytes())?;

        let result = self.run_dot(&source, &target);
        if !self.keep_source {
            let _ = fs::remove_file(&source);
        }
        result?;

        info!(path = %target.display(), "diagram rendered");
        Ok(target)
    }
}

/// Appends `.ext` to the full path, leaving any existing dots alone.
fn with_extension(base: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), RenderError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| RenderError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    fs::write(path, contents).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use library_erd_core::{Column, Relation, SchemaModel, Table, build_diagram};

    fn graph() -> DiagramGraph {
        let mut model = SchemaModel::new();
        model
            .tables
            .push(Table::new("Books").with_column(Column::primary_key("BookID", "INTEGER")));
        model.tables.push(
            Table::new("BookCopies")
                .with_column(Column::primary_key("CopyID", "INTEGER"))
                .with_column(Column::new("BookID", "INTEGER")),
        );
        model
            .relations
            .push(Relation::new("BookCopies", "BookID", "Books", "BookID"));
        build_diagram(&model).unwrap()
    }

    #[test]
    fn test_with_extension_keeps_dots() {
        assert_eq!(
            with_extension(Path::new("out/v1.2/erd"), "png"),
            PathBuf::from("out/v1.2/erd.png")
        );
        assert_eq!(
            with_extension(Path::new("library.erd"), "dot"),
            PathBuf::from("library.erd.dot")
        );
    }

    #[test]
    fn test_dot_file_renderer() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("nested").join("erd");
        let path = DotFileRenderer.render(&graph(), &base).unwrap();
        assert_eq!(path, dir.path().join("nested").join("erd.dot"));
        let dot = fs::read_to_string(&path).unwrap();
        assert!(dot.contains(r#""BookCopies" -> "Books""#));
    }

    #[test]
    fn test_json_file_renderer() {
        let dir = tempfile::tempdir().unwrap();
        let path = JsonFileRenderer
            .render(&graph(), &dir.path().join("erd"))
            .unwrap();
        let parsed: DiagramGraph = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(parsed, graph());
    }

    #[test]
    fn test_missing_graphviz_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let config = RenderConfig {
            dot_binary: "library-erd-no-such-dot-binary".to_string(),
            ..RenderConfig::default()
        };
        let renderer = GraphvizRenderer::new(DiagramFormat::Png, &config);
        let base = dir.path().join("erd");
        let err = renderer.render(&graph(), &base).unwrap_err();
        assert!(matches!(err, RenderError::Unavailable(_)));
        // Intermediate source is cleaned up even on failure.
        assert!(!with_extension(&base, "dot").exists());
        assert!(!with_extension(&base, "png").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_graphviz_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let config = RenderConfig {
            dot_binary: "false".to_string(),
            keep_source: true,
            ..RenderConfig::default()
        };
        let renderer = GraphvizRenderer::new(DiagramFormat::Svg, &config);
        let base = dir.path().join("erd");
        let err = renderer.render(&graph(), &base).unwrap_err();
        assert!(err.to_string().starts_with("renderer unavailable"));
        assert!(with_extension(&base, "dot").exists());
    }

    #[test]
    fn test_renderer_for_formats() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = renderer_for(DiagramFormat::Json, &RenderConfig::default());
        let path = renderer.render(&graph(), &dir.path().join("g")).unwrap();
        assert_eq!(path.extension().unwrap(), "json");
    }
}
