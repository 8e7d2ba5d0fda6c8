//! SurrealDB implementation of [`NotificationRepository`].
//!
//! Fan-out happens inside the creation transaction: the notification row
//! and its recipient rows commit or roll back together. Recipient rows
//! have no UUID identity of their own; they are addressed by the
//! `(notification_id, user_id)` unique index.

use chrono::{DateTime, Utc};
use mallops_core::error::MallopsResult;
use mallops_core::models::notification::{
    CreateNotification, Notification, NotificationRecipient, ReadStatus, UserNotification,
};
use mallops_core::repository::{NotificationRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct NotificationRow {
    title: String,
    body: String,
    kind: String,
    created_by: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct NotificationRowWithId {
    record_id: String,
    title: String,
    body: String,
    kind: String,
    created_by: String,
    created_at: DateTime<Utc>,
}

fn row_to_notification(row: NotificationRow, id: Uuid) -> Result<Notification, DbError> {
    let created_by = Uuid::parse_str(&row.created_by)
        .map_err(|e| DbError::Migration(format!("invalid creator UUID: {e}")))?;
    Ok(Notification {
        id,
        title: row.title,
        body: row.body,
        kind: row.kind,
        created_by,
        created_at: row.created_at,
    })
}

impl NotificationRowWithId {
    fn try_into_notification(self) -> Result<Notification, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let row = NotificationRow {
            title: self.title,
            body: self.body,
            kind: self.kind,
            created_by: self.created_by,
            created_at: self.created_at,
        };
        row_to_notification(row, id)
    }
}

#[derive(Debug, SurrealValue)]
struct RecipientRow {
    notification_id: String,
    user_id: String,
    tenant_id: Option<String>,
    is_read: bool,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl RecipientRow {
    fn try_into_recipient(self) -> Result<NotificationRecipient, DbError> {
        let notification_id = Uuid::parse_str(&self.notification_id)
            .map_err(|e| DbError::Migration(format!("invalid notification UUID: {e}")))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Migration(format!("invalid user UUID: {e}")))?;
        let tenant_id = self
            .tenant_id
            .map(|t| {
                Uuid::parse_str(&t)
                    .map_err(|e| DbError::Migration(format!("invalid tenant UUID: {e}")))
            })
            .transpose()?;
        Ok(NotificationRecipient {
            notification_id,
            user_id,
            tenant_id,
            is_read: self.is_read,
            read_at: self.read_at,
            created_at: self.created_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// Row struct for tenant-id projections.
#[derive(Debug, SurrealValue)]
struct TenantIdRow {
    record_id: String,
}

/// SurrealDB implementation of the Notification repository.
#[derive(Clone)]
pub struct SurrealNotificationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealNotificationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch(&self, id: Uuid) -> Result<Notification, DbError> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('notification', $id)")
            .bind(("id", id_str.clone()))
            .await?;

        let rows: Vec<NotificationRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "notification".into(),
            id: id_str,
        })?;

        row_to_notification(row, id)
    }
}

impl<C: Connection> NotificationRepository for SurrealNotificationRepository<C> {
    async fn create(&self, input: CreateNotification) -> MallopsResult<Notification> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let explicit: Vec<String> = input
            .recipients
            .unwrap_or_default()
            .iter()
            .map(Uuid::to_string)
            .collect();

        // One transaction for the notification and every recipient row.
        // With an explicit list the user's tenant is resolved per
        // recipient; the default audience is every active tenant-scoped
        // user.
        let query = if explicit.is_empty() {
            "BEGIN TRANSACTION; \
             CREATE type::record('notification', $id) SET \
                 title = $title, body = $body, kind = $kind, \
                 created_by = $created_by; \
             FOR $recipient IN ( \
                 SELECT meta::id(id) AS uid, tenant_id FROM user \
                 WHERE tenant_id != NONE AND status = 'Active' \
             ) { \
                 CREATE notification_recipient SET \
                     notification_id = $id, \
                     user_id = $recipient.uid, \
                     tenant_id = $recipient.tenant_id, \
                     is_read = false; \
             }; \
             COMMIT TRANSACTION;"
        } else {
            "BEGIN TRANSACTION; \
             CREATE type::record('notification', $id) SET \
                 title = $title, body = $body, kind = $kind, \
                 created_by = $created_by; \
             FOR $uid IN $recipients { \
                 CREATE notification_recipient SET \
                     notification_id = $id, \
                     user_id = $uid, \
                     tenant_id = \
                         (SELECT VALUE tenant_id FROM type::record('user', $uid))[0], \
                     is_read = false; \
             }; \
             COMMIT TRANSACTION;"
        };

        let mut builder = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("title", input.title))
            .bind(("body", input.body))
            .bind(("kind", input.kind))
            .bind(("created_by", input.created_by.to_string()));
        if !explicit.is_empty() {
            builder = builder.bind(("recipients", explicit));
        }

        let result = builder.await.map_err(DbError::from)?;
        result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        Ok(self.fetch(id).await?)
    }

    async fn mark_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
        tenant_id: Option<Uuid>,
    ) -> MallopsResult<NotificationRecipient> {
        let nid = notification_id.to_string();
        let uid = user_id.to_string();

        let mut existing = self
            .db
            .query(
                "SELECT * FROM notification_recipient \
                 WHERE notification_id = $notification_id \
                 AND user_id = $user_id",
            )
            .bind(("notification_id", nid.clone()))
            .bind(("user_id", uid.clone()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<RecipientRow> = existing.take(0).map_err(DbError::from)?;

        // Idempotent: absent row is created already-read, present row gets
        // a fresh read timestamp.
        let query = if rows.is_empty() {
            "CREATE notification_recipient SET \
             notification_id = $notification_id, \
             user_id = $user_id, \
             tenant_id = $tenant_id, \
             is_read = true, \
             read_at = time::now()"
        } else {
            "UPDATE notification_recipient SET \
             is_read = true, read_at = time::now() \
             WHERE notification_id = $notification_id \
             AND user_id = $user_id"
        };

        let result = self
            .db
            .query(query)
            .bind(("notification_id", nid.clone()))
            .bind(("user_id", uid))
            .bind(("tenant_id", tenant_id.map(|t| t.to_string())))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<RecipientRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "notification_recipient".into(),
            id: nid,
        })?;

        Ok(row.try_into_recipient()?)
    }

    async fn read_status(&self, notification_id: Uuid) -> MallopsResult<ReadStatus> {
        let mut result = self
            .db
            .query(
                "SELECT VALUE tenant_id FROM notification_recipient \
                 WHERE notification_id = $notification_id \
                 AND is_read = true AND tenant_id != NONE",
            )
            .bind(("notification_id", notification_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let read_raw: Vec<String> = result.take(0).map_err(DbError::from)?;

        let mut read = Vec::new();
        for raw in read_raw {
            let id = Uuid::parse_str(&raw)
                .map_err(|e| DbError::Migration(format!("invalid tenant UUID: {e}")))?;
            if !read.contains(&id) {
                read.push(id);
            }
        }

        // Full tenant scan; the report is the whole partition, unpaginated.
        let mut tenants_result = self
            .db
            .query("SELECT meta::id(id) AS record_id FROM tenant ORDER BY created_at ASC")
            .await
            .map_err(DbError::from)?;
        let tenant_rows: Vec<TenantIdRow> = tenants_result.take(0).map_err(DbError::from)?;

        let mut unread = Vec::new();
        for row in tenant_rows {
            let id = Uuid::parse_str(&row.record_id)
                .map_err(|e| DbError::Migration(format!("invalid tenant UUID: {e}")))?;
            if !read.contains(&id) {
                unread.push(id);
            }
        }

        Ok(ReadStatus { read, unread })
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> MallopsResult<PaginatedResult<UserNotification>> {
        let uid = user_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM notification_recipient \
                 WHERE user_id = $user_id GROUP ALL",
            )
            .bind(("user_id", uid.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT * FROM notification_recipient \
                 WHERE user_id = $user_id \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("user_id", uid))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;
        let recipient_rows: Vec<RecipientRow> = result.take(0).map_err(DbError::from)?;

        let recipients = recipient_rows
            .into_iter()
            .map(RecipientRow::try_into_recipient)
            .collect::<Result<Vec<_>, DbError>>()?;

        let ids: Vec<String> = recipients
            .iter()
            .map(|r| r.notification_id.to_string())
            .collect();

        let mut notif_result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM notification \
                 WHERE meta::id(id) IN $ids",
            )
            .bind(("ids", ids))
            .await
            .map_err(DbError::from)?;
        let notif_rows: Vec<NotificationRowWithId> =
            notif_result.take(0).map_err(DbError::from)?;

        let notifications = notif_rows
            .into_iter()
            .map(NotificationRowWithId::try_into_notification)
            .collect::<Result<Vec<_>, DbError>>()?;

        // Recipient order (newest first) drives the result order.
        let items = recipients
            .into_iter()
            .filter_map(|r| {
                notifications
                    .iter()
                    .find(|n| n.id == r.notification_id)
                    .map(|n| UserNotification {
                        notification: n.clone(),
                        is_read: r.is_read,
                        read_at: r.read_at,
                    })
            })
            .collect();

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
