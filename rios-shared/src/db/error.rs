/// Storage errors
///
/// Backends translate their native failures into [`StoreError`] so the
/// services never inspect driver-specific codes.

use thiserror::Error;

/// PostgreSQL SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL SQLSTATE for foreign_key_violation
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Failure reported by a store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Target row does not exist
    #[error("Row not found")]
    NotFound,

    /// A unique constraint rejected the write
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// A foreign key rejected the write or delete
    #[error("Foreign key constraint violated: {constraint}")]
    ForeignKeyViolation { constraint: String },

    /// Any other backend failure
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) => {
                let constraint = db.constraint().unwrap_or_default().to_string();
                match db.code().as_deref() {
                    Some(UNIQUE_VIOLATION) => StoreError::UniqueViolation { constraint },
                    Some(FOREIGN_KEY_VIOLATION) => StoreError::ForeignKeyViolation { constraint },
                    _ => StoreError::Backend(err.to_string()),
                }
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}
