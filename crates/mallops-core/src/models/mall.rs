//! Mall domain model.
//!
//! A mall is the top-level scope: tenants, mall admins, and work permits
//! all hang off a mall.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mall {
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// URL-safe unique identifier (e.g., `riverside-center`).
    pub slug: String,
    /// Arbitrary key-value metadata.
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new mall.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMall {
    pub name: String,
    pub slug: String,
    pub metadata: Option<serde_json::Value>,
}

/// Fields that can be updated on an existing mall.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateMall {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub metadata: Option<serde_json::Value>,
}
