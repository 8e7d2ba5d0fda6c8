//! Database-specific error types and conversions.

use mallops_core::error::MallopsError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for MallopsError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => MallopsError::NotFound { entity, id },
            other => {
                let message = other.to_string();
                // Unique index violations are conflicts, not storage
                // failures.
                if message.contains("already contains") {
                    MallopsError::AlreadyExists { entity: message }
                } else {
                    MallopsError::Database(message)
                }
            }
        }
    }
}
