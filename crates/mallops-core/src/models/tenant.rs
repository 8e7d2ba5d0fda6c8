//! Tenant domain model.
//!
//! A tenant is a business operating inside a mall. Work permits are
//! submitted by tenants; notifications default to addressing all of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    /// The mall this tenant operates in.
    pub mall_id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// URL-safe unique identifier within the mall (e.g., `unit-214`).
    pub slug: String,
    /// Arbitrary key-value metadata.
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub mall_id: Uuid,
    pub name: String,
    pub slug: String,
    pub metadata: Option<serde_json::Value>,
}

/// Fields that can be updated on an existing tenant.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTenant {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub metadata: Option<serde_json::Value>,
}
