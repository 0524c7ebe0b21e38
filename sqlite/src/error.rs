//! Error types for catalog, introspection and migration operations.
//!
//! Messages name the failing operation and the offending key. The raw SQLite
//! error is kept as the [`source`](std::error::Error::source) of
//! [`StoreError::StoreAccess`] rather than spliced into the message.

use std::path::PathBuf;

use thiserror::Error;

use crate::records::{CopyId, MemberId};

/// Errors that can occur while accessing the library store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connectivity or query failure; fatal to the current operation.
    #[error(
        "store access failed during {operation}{}",
        .key.as_deref().map(|k| format!(" of {k}")).unwrap_or_default()
    )]
    StoreAccess {
        operation: &'static str,
        /// Table, row or value the operation was working on, when there is one.
        key: Option<String>,
        #[source]
        source: rusqlite::Error,
    },

    /// A member with this email already exists.
    #[error("a member with email '{email}' already exists")]
    DuplicateEmail { email: String },

    /// The requested row does not exist (or is not in the expected state).
    #[error("{what} not found")]
    NotFound { what: String },

    /// Issuing a loan failed; the copy status and loans table are unchanged.
    #[error("loan of copy {copy_id} to member {member_id} failed: {reason}")]
    LoanFailed {
        copy_id: CopyId,
        member_id: MemberId,
        reason: String,
    },

    /// An external SQL script could not be read.
    #[error("failed to read SQL script '{}'", .path.display())]
    Script {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;

/// Builds a `map_err` adapter that tags a SQLite error with the operation name.
pub(crate) fn store_err(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> StoreError {
    move |source| StoreError::StoreAccess {
        operation,
        key: None,
        source,
    }
}

/// Like [`store_err`], naming the key the operation was working on.
pub(crate) fn store_err_for(
    operation: &'static str,
    key: impl std::fmt::Display,
) -> impl FnOnce(rusqlite::Error) -> StoreError {
    let key = key.to_string();
    move |source| StoreError::StoreAccess {
        operation,
        key: Some(key),
        source,
    }
}

/// True when the error is a `UNIQUE` constraint violation.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Short, store-neutral description of why a statement failed.
pub(crate) fn failure_reason(err: &rusqlite::Error) -> &'static str {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => match e.extended_code {
            rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => "unknown copy or member",
            rusqlite::ffi::SQLITE_CONSTRAINT_CHECK => "invalid status transition",
            rusqlite::ffi::SQLITE_CONSTRAINT_NOTNULL => "missing required value",
            _ if e.code == rusqlite::ErrorCode::DatabaseBusy
                || e.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                "database is busy"
            }
            _ => "store rejected the change",
        },
        _ => "store rejected the change",
    }
}
