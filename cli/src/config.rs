//! YAML configuration for the `library-erd` binary.
//!
//! Every field has a default, so a config file only needs the keys it wants
//! to change. Command-line flags override values loaded from the file.
//!
//! # Example YAML
//!
//! ```yaml
//! database: library.db
//! logging:
//!   level: info
//! showcase:
//!   title: "1984"
//!   member:
//!     first_name: Alice
//!     last_name: Future
//!     email: alice@future.com
//!     membership_expiry: 2099-12-31
//! erd:
//!   output: library_erd
//!   format: png
//!   sorted: false
//!   render:
//!     dot_binary: dot
//!     timeout_secs: 30
//!     keep_source: false
//!   style:
//!     rank_dir: LR
//!     splines: ortho
//! ```

use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use library_erd_core::GraphStyle;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config '{}': {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite database file shared by all subcommands.
    pub database: PathBuf,
    pub logging: LoggingConfig,
    pub showcase: ShowcaseConfig,
    pub erd: ErdConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("library.db"),
            logging: LoggingConfig::default(),
            showcase: ShowcaseConfig::default(),
            erd: ErdConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the file when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Scenario run by `library-erd showcase`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowcaseConfig {
    /// External SQL script used instead of the bundled schema and data.
    pub schema_script: Option<PathBuf>,
    /// Title the new member borrows.
    pub title: String,
    pub member: MemberConfig,
}

impl Default for ShowcaseConfig {
    fn default() -> Self {
        Self {
            schema_script: None,
            title: "1984".to_string(),
            member: MemberConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberConfig {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub membership_expiry: NaiveDate,
}

impl Default for MemberConfig {
    fn default() -> Self {
        Self {
            first_name: "Alice".to_string(),
            last_name: "Future".to_string(),
            email: "alice@future.com".to_string(),
            membership_expiry: NaiveDate::from_ymd_opt(2099, 12, 31).unwrap_or(NaiveDate::MAX),
        }
    }
}

/// Output produced by `library-erd erd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiagramFormat {
    #[default]
    Png,
    Svg,
    Pdf,
    /// Graphviz source only; no renderer needed.
    Dot,
    /// The diagram graph as JSON; no renderer needed.
    Json,
}

impl DiagramFormat {
    pub fn extension(self) -> &'static str {
        match self {
            DiagramFormat::Png => "png",
            DiagramFormat::Svg => "svg",
            DiagramFormat::Pdf => "pdf",
            DiagramFormat::Dot => "dot",
            DiagramFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErdConfig {
    /// Output path without extension.
    pub output: PathBuf,
    pub format: DiagramFormat,
    /// Sort tables by name instead of catalog order.
    pub sorted: bool,
    /// Run the seeding process when the database file is missing.
    pub bootstrap: bool,
    /// Seeding command; `{db}` is replaced with the database path. Defaults
    /// to `<this executable> showcase --db {db}`.
    pub seed_command: Option<Vec<String>>,
    pub render: RenderConfig,
    pub style: GraphStyle,
}

impl Default for ErdConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("library_erd"),
            format: DiagramFormat::default(),
            sorted: false,
            bootstrap: true,
            seed_command: None,
            render: RenderConfig::default(),
            style: GraphStyle::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Graphviz executable.
    pub dot_binary: String,
    pub timeout_secs: u64,
    /// Keep the intermediate `.dot` file next to the image.
    pub keep_source: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dot_binary: "dot".to_string(),
            timeout_secs: 30,
            keep_source: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.database, PathBuf::from("library.db"));
        assert_eq!(config.erd.format, DiagramFormat::Png);
        assert!(config.erd.bootstrap);
        assert_eq!(config.erd.render.timeout_secs, 30);
        assert_eq!(config.showcase.member.email, "alice@future.com");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
database: other.db
erd:
  format: svg
  style:
    rank_dir: TB
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.database, PathBuf::from("other.db"));
        assert_eq!(config.erd.format, DiagramFormat::Svg);
        assert_eq!(config.erd.style.rank_dir, "TB");
        assert_eq!(config.erd.style.splines, "ortho");
        assert_eq!(config.erd.output, PathBuf::from("library_erd"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_member_expiry_parses_iso_date() {
        let yaml = r#"
showcase:
  member:
    first_name: Bob
    last_name: Stone
    email: bob@example.com
    membership_expiry: 2030-06-30
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config.showcase.member.membership_expiry,
            NaiveDate::from_ymd_opt(2030, 6, 30).unwrap()
        );
        assert_eq!(config.showcase.title, "1984");
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load("/nonexistent/library-erd.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "erd:\n  sorted: true\n").unwrap();
        let config = AppConfig::load_or_default(Some(&path)).unwrap();
        assert!(config.erd.sorted);
    }

    #[test]
    fn test_extension() {
        assert_eq!(DiagramFormat::Json.extension(), "json");
        assert_eq!(DiagramFormat::Png.extension(), "png");
    }
}
