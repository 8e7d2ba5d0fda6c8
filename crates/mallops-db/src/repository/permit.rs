//! SurrealDB implementation of [`WorkPermitRepository`].
//!
//! [`SurrealWorkPermitRepository::transition`] is the one place a permit
//! status changes: the permit update, the notification row, and the
//! per-recipient rows are issued inside a single `BEGIN TRANSACTION …
//! COMMIT TRANSACTION` query, so a failed fan-out rolls the status change
//! back with it.

use chrono::{DateTime, Utc};
use mallops_core::error::MallopsResult;
use mallops_core::models::permit::{
    Attachment, CreateWorkPermit, PermitFilter, PermitNote, PermitStatus, UpdateWorkPermit,
    WorkPermit,
};
use mallops_core::repository::{
    PaginatedResult, Pagination, StatusNotice, WorkPermitRepository,
};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AttachmentRow {
    name: String,
    content_type: String,
    url: String,
}

impl From<Attachment> for AttachmentRow {
    fn from(a: Attachment) -> Self {
        Self {
            name: a.name,
            content_type: a.content_type,
            url: a.url,
        }
    }
}

impl From<AttachmentRow> for Attachment {
    fn from(row: AttachmentRow) -> Self {
        Self {
            name: row.name,
            content_type: row.content_type,
            url: row.url,
        }
    }
}

#[derive(Debug, SurrealValue)]
struct NoteRow {
    author_id: String,
    text: String,
    noted_at: DateTime<Utc>,
}

impl NoteRow {
    fn try_into_note(self) -> Result<PermitNote, DbError> {
        let author_id = Uuid::parse_str(&self.author_id)
            .map_err(|e| DbError::Migration(format!("invalid author UUID: {e}")))?;
        Ok(PermitNote {
            author_id,
            text: self.text,
            noted_at: self.noted_at,
        })
    }
}

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct PermitRow {
    permit_number: String,
    mall_id: String,
    tenant_id: String,
    permit_type: String,
    risk_level: String,
    category: String,
    work_description: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    status: String,
    attachments: Vec<AttachmentRow>,
    comments: Vec<NoteRow>,
    violations: Vec<NoteRow>,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct PermitRowWithId {
    record_id: String,
    permit_number: String,
    mall_id: String,
    tenant_id: String,
    permit_type: String,
    risk_level: String,
    category: String,
    work_description: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    status: String,
    attachments: Vec<AttachmentRow>,
    comments: Vec<NoteRow>,
    violations: Vec<NoteRow>,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<PermitStatus, DbError> {
    match s {
        "PENDING_APPROVAL" => Ok(PermitStatus::PendingApproval),
        "APPROVED" => Ok(PermitStatus::Approved),
        "ACTIVE" => Ok(PermitStatus::Active),
        "COMPLETED" => Ok(PermitStatus::Completed),
        "REJECTED" => Ok(PermitStatus::Rejected),
        "CANCELLED" => Ok(PermitStatus::Cancelled),
        other => Err(DbError::Migration(format!(
            "unknown permit status: {other}"
        ))),
    }
}

fn status_to_string(status: PermitStatus) -> &'static str {
    match status {
        PermitStatus::PendingApproval => "PENDING_APPROVAL",
        PermitStatus::Approved => "APPROVED",
        PermitStatus::Active => "ACTIVE",
        PermitStatus::Completed => "COMPLETED",
        PermitStatus::Rejected => "REJECTED",
        PermitStatus::Cancelled => "CANCELLED",
    }
}

fn notes(rows: Vec<NoteRow>) -> Result<Vec<PermitNote>, DbError> {
    rows.into_iter().map(NoteRow::try_into_note).collect()
}

impl PermitRow {
    fn into_permit(self, id: Uuid) -> Result<WorkPermit, DbError> {
        let mall_id = Uuid::parse_str(&self.mall_id)
            .map_err(|e| DbError::Migration(format!("invalid mall UUID: {e}")))?;
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| DbError::Migration(format!("invalid tenant UUID: {e}")))?;
        let created_by = Uuid::parse_str(&self.created_by)
            .map_err(|e| DbError::Migration(format!("invalid creator UUID: {e}")))?;
        Ok(WorkPermit {
            id,
            permit_number: self.permit_number,
            mall_id,
            tenant_id,
            permit_type: self.permit_type,
            risk_level: self.risk_level,
            category: self.category,
            work_description: self.work_description,
            start_date: self.start_date,
            end_date: self.end_date,
            status: parse_status(&self.status)?,
            attachments: self.attachments.into_iter().map(Into::into).collect(),
            comments: notes(self.comments)?,
            violations: notes(self.violations)?,
            created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl PermitRowWithId {
    fn try_into_permit(self) -> Result<WorkPermit, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let row = PermitRow {
            permit_number: self.permit_number,
            mall_id: self.mall_id,
            tenant_id: self.tenant_id,
            permit_type: self.permit_type,
            risk_level: self.risk_level,
            category: self.category,
            work_description: self.work_description,
            start_date: self.start_date,
            end_date: self.end_date,
            status: self.status,
            attachments: self.attachments,
            comments: self.comments,
            violations: self.violations,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        row.into_permit(id)
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the WorkPermit repository.
#[derive(Clone)]
pub struct SurrealWorkPermitRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealWorkPermitRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn append_note(
        &self,
        field: &'static str,
        id: Uuid,
        author_id: Uuid,
        text: String,
    ) -> MallopsResult<WorkPermit> {
        let id_str = id.to_string();
        let note = NoteRow {
            author_id: author_id.to_string(),
            text,
            noted_at: Utc::now(),
        };

        let query = format!(
            "UPDATE type::record('work_permit', $id) SET \
             {field} += $note, updated_at = time::now()"
        );

        let result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("note", note))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<PermitRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "work_permit".into(),
            id: id_str,
        })?;

        Ok(row.into_permit(id)?)
    }
}

impl<C: Connection> WorkPermitRepository for SurrealWorkPermitRepository<C> {
    async fn create(&self, input: CreateWorkPermit) -> MallopsResult<WorkPermit> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        // Reference shown on documents; derived from the record UUID since
        // no cross-request coordination exists for a sequential counter.
        let permit_number = format!(
            "WP-{}",
            id.simple().to_string()[..8].to_uppercase()
        );
        let attachments: Vec<AttachmentRow> = input
            .attachments
            .unwrap_or_default()
            .into_iter()
            .map(Into::into)
            .collect();

        let result = self
            .db
            .query(
                "CREATE type::record('work_permit', $id) SET \
                 permit_number = $permit_number, \
                 mall_id = $mall_id, \
                 tenant_id = $tenant_id, \
                 permit_type = $permit_type, \
                 risk_level = $risk_level, \
                 category = $category, \
                 work_description = $work_description, \
                 start_date = $start_date, \
                 end_date = $end_date, \
                 status = 'PENDING_APPROVAL', \
                 attachments = $attachments, \
                 created_by = $created_by",
            )
            .bind(("id", id_str.clone()))
            .bind(("permit_number", permit_number))
            .bind(("mall_id", input.mall_id.to_string()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("permit_type", input.permit_type))
            .bind(("risk_level", input.risk_level))
            .bind(("category", input.category))
            .bind(("work_description", input.work_description))
            .bind(("start_date", input.start_date))
            .bind(("end_date", input.end_date))
            .bind(("attachments", attachments))
            .bind(("created_by", input.created_by.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<PermitRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "work_permit".into(),
            id: id_str,
        })?;

        Ok(row.into_permit(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> MallopsResult<WorkPermit> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('work_permit', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermitRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "work_permit".into(),
            id: id_str,
        })?;

        Ok(row.into_permit(id)?)
    }

    async fn list(
        &self,
        filter: PermitFilter,
        pagination: Pagination,
    ) -> MallopsResult<PaginatedResult<WorkPermit>> {
        let mut conds = Vec::new();
        if filter.mall_id.is_some() {
            conds.push("mall_id = $mall_id");
        }
        if filter.tenant_id.is_some() {
            conds.push("tenant_id = $tenant_id");
        }
        if filter.status.is_some() {
            conds.push("status = $status");
        }
        if filter.search.is_some() {
            conds.push(
                "(permit_number CONTAINS $search \
                 OR work_description CONTAINS $search)",
            );
        }
        let where_clause = if conds.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conds.join(" AND "))
        };

        let count_query =
            format!("SELECT count() AS total FROM work_permit{where_clause} GROUP ALL");
        let list_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM work_permit{where_clause} \
             ORDER BY created_at DESC \
             LIMIT $limit START $offset"
        );

        let mut count_builder = self.db.query(&count_query);
        let mut list_builder = self
            .db
            .query(&list_query)
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));

        if let Some(mall_id) = filter.mall_id {
            count_builder = count_builder.bind(("mall_id", mall_id.to_string()));
            list_builder = list_builder.bind(("mall_id", mall_id.to_string()));
        }
        if let Some(tenant_id) = filter.tenant_id {
            count_builder = count_builder.bind(("tenant_id", tenant_id.to_string()));
            list_builder = list_builder.bind(("tenant_id", tenant_id.to_string()));
        }
        if let Some(status) = filter.status {
            count_builder = count_builder.bind(("status", status_to_string(status)));
            list_builder = list_builder.bind(("status", status_to_string(status)));
        }
        if let Some(search) = filter.search {
            count_builder = count_builder.bind(("search", search.clone()));
            list_builder = list_builder.bind(("search", search));
        }

        let mut count_result = count_builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = list_builder.await.map_err(DbError::from)?;
        let rows: Vec<PermitRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_permit())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn update(&self, id: Uuid, input: UpdateWorkPermit) -> MallopsResult<WorkPermit> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.permit_type.is_some() {
            sets.push("permit_type = $permit_type");
        }
        if input.risk_level.is_some() {
            sets.push("risk_level = $risk_level");
        }
        if input.category.is_some() {
            sets.push("category = $category");
        }
        if input.work_description.is_some() {
            sets.push("work_description = $work_description");
        }
        if input.start_date.is_some() {
            sets.push("start_date = $start_date");
        }
        if input.end_date.is_some() {
            sets.push("end_date = $end_date");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('work_permit', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(permit_type) = input.permit_type {
            builder = builder.bind(("permit_type", permit_type));
        }
        if let Some(risk_level) = input.risk_level {
            builder = builder.bind(("risk_level", risk_level));
        }
        if let Some(category) = input.category {
            builder = builder.bind(("category", category));
        }
        if let Some(work_description) = input.work_description {
            builder = builder.bind(("work_description", work_description));
        }
        if let Some(start_date) = input.start_date {
            builder = builder.bind(("start_date", start_date));
        }
        if let Some(end_date) = input.end_date {
            builder = builder.bind(("end_date", end_date));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<PermitRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "work_permit".into(),
            id: id_str,
        })?;

        Ok(row.into_permit(id)?)
    }

    async fn transition(
        &self,
        id: Uuid,
        status: PermitStatus,
        actor_id: Uuid,
        notice: StatusNotice,
    ) -> MallopsResult<WorkPermit> {
        // Resolve the permit first: yields a proper NotFound and the tenant
        // whose users receive the fan-out.
        let permit = self.get_by_id(id).await?;
        let notification_id = Uuid::new_v4();

        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 UPDATE type::record('work_permit', $id) SET \
                     status = $status, updated_at = time::now(); \
                 CREATE type::record('notification', $notification_id) SET \
                     title = $title, body = $body, kind = $kind, \
                     created_by = $actor_id; \
                 FOR $recipient IN ( \
                     SELECT meta::id(id) AS uid, tenant_id FROM user \
                     WHERE tenant_id = $tenant_id AND status = 'Active' \
                 ) { \
                     CREATE notification_recipient SET \
                         notification_id = $notification_id, \
                         user_id = $recipient.uid, \
                         tenant_id = $recipient.tenant_id, \
                         is_read = false; \
                 }; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("status", status_to_string(status)))
            .bind(("notification_id", notification_id.to_string()))
            .bind(("title", notice.title))
            .bind(("body", notice.body))
            .bind(("kind", notice.kind))
            .bind(("actor_id", actor_id.to_string()))
            .bind(("tenant_id", permit.tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        self.get_by_id(id).await
    }

    async fn add_comment(
        &self,
        id: Uuid,
        author_id: Uuid,
        text: String,
    ) -> MallopsResult<WorkPermit> {
        self.append_note("comments", id, author_id, text).await
    }

    async fn add_violation(
        &self,
        id: Uuid,
        author_id: Uuid,
        text: String,
    ) -> MallopsResult<WorkPermit> {
        self.append_note("violations", id, author_id, text).await
    }
}
