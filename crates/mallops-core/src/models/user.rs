//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role determines which actions the access gate allows.
///
/// There is no hierarchy resolution: the policy table names allowed roles
/// literally. `SuperAdmin` only bypasses the *ownership* check, never the
/// role table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    SuperAdmin,
    MallAdmin,
    TenantAdmin,
    TenantUser,
}

impl UserRole {
    /// True for roles that operate within a single tenant.
    pub fn is_tenant_scoped(self) -> bool {
        matches!(self, UserRole::TenantAdmin | UserRole::TenantUser)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Mall scope; `None` for SUPER_ADMIN.
    pub mall_id: Option<Uuid>,
    /// Tenant scope; `None` for admin roles.
    pub tenant_id: Option<Uuid>,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub mall_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub metadata: Option<serde_json::Value>,
}

/// Fields that can be updated on an existing user.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub metadata: Option<serde_json::Value>,
}
