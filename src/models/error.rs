use sqlx::error::DatabaseError;
use thiserror::Error;

/// Failures surfaced by the company and job data-access operations.
///
/// Every variant except `Database` is a client-side problem; the HTTP layer
/// maps them onto status codes in `crate::error`.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Malformed or contradictory input (empty update, min > max, bad field values)
    #[error("{0}")]
    Validation(String),

    /// Create conflicts with an existing unique key
    #[error("{0}")]
    Duplicate(String),

    /// Create references a parent row that does not exist
    #[error("{0}")]
    Referential(String),

    /// Target of get/update/remove does not exist
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type ModelResult<T> = Result<T, ModelError>;

impl ModelError {
    pub fn validation(message: impl Into<String>) -> Self {
        ModelError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ModelError::NotFound(message.into())
    }

    /// Reclassify constraint violations raised by a write.
    ///
    /// `conflict` names the violations the statement can actually raise
    /// (a taken key, a missing parent); check violations always become
    /// `Validation` and anything else stays a `Database` error.
    pub(crate) fn from_write(
        err: sqlx::Error,
        conflict: impl FnOnce(&dyn DatabaseError) -> Option<ModelError>,
    ) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if let Some(mapped) = conflict(db.as_ref()) {
                return mapped;
            }
            if db.is_check_violation() {
                return ModelError::Validation(format!("Invalid value: {}", db.message()));
            }
        }
        ModelError::Database(err)
    }
}
