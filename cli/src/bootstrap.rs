//! Creates the database through the seeding process when it is missing.
//!
//! The diagram generator never writes to the database itself. When the file
//! does not exist it runs the seeding process (by default this executable's
//! own `showcase` subcommand) and checks that the file appeared.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use thiserror::Error;
use tracing::info;

/// Placeholder replaced with the database path in a custom seed command.
const DB_PLACEHOLDER: &str = "{db}";

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("database '{}' does not exist and bootstrapping is disabled", .path.display())]
    Disabled { path: PathBuf },

    #[error("seed command is empty")]
    EmptyCommand,

    #[error("cannot locate the current executable: {0}")]
    CurrentExe(#[source] std::io::Error),

    #[error("seeding process '{program}' could not be started: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("seeding process '{program}' failed with {status}")]
    Failed { program: String, status: ExitStatus },

    #[error("seeding process finished but '{}' was not created", .path.display())]
    Missing { path: PathBuf },
}

/// Makes sure `db` exists, running the seed command if it does not.
///
/// Returns `true` when the database had to be created.
pub fn ensure_database(
    db: &Path,
    enabled: bool,
    seed_command: Option<&[String]>,
) -> Result<bool, BootstrapError> {
    if db.exists() {
        return Ok(false);
    }
    if !enabled {
        return Err(BootstrapError::Disabled {
            path: db.to_path_buf(),
        });
    }

    let argv = match seed_command {
        Some(command) => substitute_db(command, db),
        None => default_seed_command(db)?,
    };
    let (program, args) = argv.split_first().ok_or(BootstrapError::EmptyCommand)?;

    info!(db = %db.display(), program = %program, "database not found, running seeding process");
    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|source| BootstrapError::Spawn {
            program: program.clone(),
            source,
        })?;
    if !status.success() {
        return Err(BootstrapError::Failed {
            program: program.clone(),
            status,
        });
    }
    if !db.exists() {
        return Err(BootstrapError::Missing {
            path: db.to_path_buf(),
        });
    }

    info!(db = %db.display(), "database created");
    Ok(true)
}

fn default_seed_command(db: &Path) -> Result<Vec<String>, BootstrapError> {
    let exe = std::env::current_exe().map_err(BootstrapError::CurrentExe)?;
    Ok(vec![
        exe.to_string_lossy().into_owned(),
        "showcase".to_string(),
        "--db".to_string(),
        db.to_string_lossy().into_owned(),
    ])
}

fn substitute_db(command: &[String], db: &Path) -> Vec<String> {
    let db = db.to_string_lossy();
    command
        .iter()
        .map(|part| part.replace(DB_PLACEHOLDER, &db))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_database_is_left_alone() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(!ensure_database(file.path(), false, None).unwrap());
    }

    #[test]
    fn test_disabled_bootstrap() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("library.db");
        assert!(matches!(
            ensure_database(&db, false, None),
            Err(BootstrapError::Disabled { .. })
        ));
    }

    #[test]
    fn test_empty_command() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("library.db");
        assert!(matches!(
            ensure_database(&db, true, Some(&[][..])),
            Err(BootstrapError::EmptyCommand)
        ));
    }

    #[test]
    fn test_missing_seed_program() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("library.db");
        let command = vec!["library-erd-no-such-seeder".to_string()];
        assert!(matches!(
            ensure_database(&db, true, Some(command.as_slice())),
            Err(BootstrapError::Spawn { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_seed_command_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("library.db");
        let command = vec!["touch".to_string(), "{db}".to_string()];
        assert!(ensure_database(&db, true, Some(command.as_slice())).unwrap());
        assert!(db.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_seed_command_that_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("library.db");
        let command = vec!["true".to_string()];
        assert!(matches!(
            ensure_database(&db, true, Some(command.as_slice())),
            Err(BootstrapError::Missing { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_seed_command() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("library.db");
        let command = vec!["false".to_string()];
        assert!(matches!(
            ensure_database(&db, true, Some(command.as_slice())),
            Err(BootstrapError::Failed { .. })
        ));
    }

    #[test]
    fn test_substitute_db() {
        let command = vec!["seed".to_string(), "--out={db}".to_string()];
        assert_eq!(
            substitute_db(&command, Path::new("x/library.db")),
            vec!["seed".to_string(), "--out=x/library.db".to_string()]
        );
    }
}
