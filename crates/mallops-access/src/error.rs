//! Access gate error types.

use mallops_core::error::MallopsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("missing authentication token")]
    MissingCredentials,

    #[error("invalid or unknown session")]
    InvalidSession,

    #[error("session has expired")]
    SessionExpired,

    #[error("account is inactive")]
    AccountInactive,

    /// Deliberately carries no detail; the HTTP layer renders a bare 403.
    #[error("forbidden")]
    Forbidden,
}

impl From<AccessError> for MallopsError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::MissingCredentials
            | AccessError::InvalidSession
            | AccessError::SessionExpired
            | AccessError::AccountInactive => MallopsError::AuthenticationFailed {
                reason: err.to_string(),
            },
            AccessError::Forbidden => MallopsError::AuthorizationDenied {
                reason: err.to_string(),
            },
        }
    }
}

pub type AccessResult<T> = Result<T, AccessError>;
