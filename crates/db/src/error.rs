//! Errors returned by the data-access layer.
//!
//! Absent rows are not errors: lookups return `Option` and mutations report
//! affected rows. Only store failures reach this type.

use thiserror::Error;

/// Errors returned by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A store constraint rejected the write because of existing rows
    /// (duplicate isbn, dangling or still-referenced author).
    #[error("conflict: {message}")]
    Conflict { message: String },
    /// A `CHECK` constraint rejected a value (over-long text, negative stock).
    #[error("invalid value: {message}")]
    Invalid { message: String },
    /// A database or connection error occurred.
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref err, ref detail) = e {
            if err.code == rusqlite::ErrorCode::ConstraintViolation {
                let message = detail.clone().unwrap_or_else(|| e.to_string());
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_CHECK {
                    return Self::Invalid { message };
                }
                return Self::Conflict { message };
            }
        }
        Self::Storage {
            message: e.to_string(),
        }
    }
}
