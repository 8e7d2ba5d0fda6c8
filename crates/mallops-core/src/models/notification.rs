//! Notification domain model.
//!
//! A notification is created once; a read-tracking recipient row exists per
//! addressed user. Each recipient row denormalizes the user's tenant so
//! read-status can be reported as tenant sets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    /// Category tag (e.g., `announcement`, `work_permit`).
    #[serde(rename = "type")]
    pub kind: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotification {
    pub title: String,
    pub body: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub created_by: Uuid,
    /// Explicit recipient users. `None` or empty fans out to every active
    /// tenant-scoped user.
    pub recipients: Option<Vec<Uuid>>,
}

/// Per-user read-tracking row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecipient {
    pub notification_id: Uuid,
    pub user_id: Uuid,
    /// The user's tenant at fan-out time; `None` for admin recipients.
    pub tenant_id: Option<Uuid>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Tenant-level read report: the full tenant set partitioned by whether
/// any of the tenant's recipients has read the notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadStatus {
    pub read: Vec<Uuid>,
    pub unread: Vec<Uuid>,
}

/// A notification as seen by one recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserNotification {
    #[serde(flatten)]
    pub notification: Notification,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
}
