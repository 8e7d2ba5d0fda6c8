//! Caller identity and credential extraction.

use mallops_core::models::user::{User, UserRole};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// The resolved caller: everything the gate needs to decide.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: UserRole,
    pub mall_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
}

impl From<&User> for AuthContext {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
            mall_id: user.mall_id,
            tenant_id: user.tenant_id,
        }
    }
}

/// Pull the raw token out of the request: `Authorization: Bearer …` wins,
/// the named cookie is the fallback.
pub fn extract_token(
    authorization: Option<&str>,
    cookie_header: Option<&str>,
    cookie_name: &str,
) -> Option<String> {
    if let Some(header) = authorization
        && let Some(token) = header.strip_prefix("Bearer ")
        && !token.is_empty()
    {
        return Some(token.to_string());
    }

    let cookies = cookie_header?;
    for pair in cookies.split(';') {
        let pair = pair.trim();
        if let Some((name, value)) = pair.split_once('=')
            && name == cookie_name
            && !value.is_empty()
        {
            return Some(value.to_string());
        }
    }
    None
}

/// SHA-256 hex digest of a raw token. Only hashes are ever stored or
/// compared.
pub fn token_hash(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
