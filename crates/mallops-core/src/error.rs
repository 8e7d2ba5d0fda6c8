//! Error types for the MALLOPS system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MallopsError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The operation is legal for the caller but not in the entity's
    /// current state (e.g. document fetch for an unapproved permit).
    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type MallopsResult<T> = Result<T, MallopsError>;
