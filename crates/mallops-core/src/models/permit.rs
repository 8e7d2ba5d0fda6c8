//! Work-permit domain model.
//!
//! A work permit is a tenant's request to perform on-site work (hot work,
//! electrical, fit-out, ...) subject to mall-admin approval. Status
//! transitions are admin-driven; no engine enforces transition ordering —
//! any status may be set by a caller who passes the access gate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermitStatus {
    PendingApproval,
    Approved,
    Active,
    Completed,
    Rejected,
    Cancelled,
}

/// Attachment metadata. Upload storage is an external collaborator; the
/// permit only carries where the file lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub content_type: String,
    pub url: String,
}

/// An inspector's comment or violation note on a permit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermitNote {
    pub author_id: Uuid,
    pub text: String,
    pub noted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkPermit {
    pub id: Uuid,
    /// Human-readable reference shown on documents (e.g., `WP-3F9A21C4`).
    pub permit_number: String,
    pub mall_id: Uuid,
    pub tenant_id: Uuid,
    /// Kind of work (e.g., `hot_work`, `electrical`).
    pub permit_type: String,
    pub risk_level: String,
    pub category: String,
    pub work_description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: PermitStatus,
    pub attachments: Vec<Attachment>,
    pub comments: Vec<PermitNote>,
    pub violations: Vec<PermitNote>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to submit a new permit. Status always starts at
/// `PendingApproval`; the permit number is assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkPermit {
    pub mall_id: Uuid,
    pub tenant_id: Uuid,
    pub permit_type: String,
    pub risk_level: String,
    pub category: String,
    pub work_description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub attachments: Option<Vec<Attachment>>,
    pub created_by: Uuid,
}

/// Admin-driven field overwrites. A `status` change goes through
/// [`crate::repository::WorkPermitRepository::transition`] instead so the
/// notification fan-out lands in the same transaction.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateWorkPermit {
    pub permit_type: Option<String>,
    pub risk_level: Option<String>,
    pub category: Option<String>,
    pub work_description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// List-query filters. All are conjunctive; `search` matches the permit
/// number or the work description as a substring.
#[derive(Debug, Clone, Default)]
pub struct PermitFilter {
    pub mall_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
    pub status: Option<PermitStatus>,
    pub search: Option<String>,
}
