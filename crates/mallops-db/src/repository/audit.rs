//! SurrealDB implementation of [`AuditLogRepository`].
//!
//! The `audit_log` table is append-only; the schema forbids update and
//! delete at the permission level.

use chrono::{DateTime, Utc};
use mallops_core::error::MallopsResult;
use mallops_core::models::audit::{AuditLogEntry, AuditOutcome, CreateAuditLogEntry};
use mallops_core::repository::{AuditLogFilter, AuditLogRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AuditRow {
    mall_id: Option<String>,
    actor_id: String,
    action: String,
    resource_id: Option<String>,
    outcome: String,
    metadata: serde_json::Value,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct AuditRowWithId {
    record_id: String,
    mall_id: Option<String>,
    actor_id: String,
    action: String,
    resource_id: Option<String>,
    outcome: String,
    metadata: serde_json::Value,
    timestamp: DateTime<Utc>,
}

fn parse_outcome(s: &str) -> Result<AuditOutcome, DbError> {
    match s {
        "Success" => Ok(AuditOutcome::Success),
        "Failure" => Ok(AuditOutcome::Failure),
        "Denied" => Ok(AuditOutcome::Denied),
        other => Err(DbError::Migration(format!(
            "unknown audit outcome: {other}"
        ))),
    }
}

fn outcome_to_string(outcome: &AuditOutcome) -> &'static str {
    match outcome {
        AuditOutcome::Success => "Success",
        AuditOutcome::Failure => "Failure",
        AuditOutcome::Denied => "Denied",
    }
}

fn parse_opt_uuid(value: Option<String>, what: &str) -> Result<Option<Uuid>, DbError> {
    value
        .map(|s| {
            Uuid::parse_str(&s)
                .map_err(|e| DbError::Migration(format!("invalid {what} UUID: {e}")))
        })
        .transpose()
}

impl AuditRow {
    fn into_entry(self, id: Uuid) -> Result<AuditLogEntry, DbError> {
        let actor_id = Uuid::parse_str(&self.actor_id)
            .map_err(|e| DbError::Migration(format!("invalid actor UUID: {e}")))?;
        Ok(AuditLogEntry {
            id,
            mall_id: parse_opt_uuid(self.mall_id, "mall")?,
            actor_id,
            action: self.action,
            resource_id: parse_opt_uuid(self.resource_id, "resource")?,
            outcome: parse_outcome(&self.outcome)?,
            metadata: self.metadata,
            timestamp: self.timestamp,
        })
    }
}

impl AuditRowWithId {
    fn try_into_entry(self) -> Result<AuditLogEntry, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let row = AuditRow {
            mall_id: self.mall_id,
            actor_id: self.actor_id,
            action: self.action,
            resource_id: self.resource_id,
            outcome: self.outcome,
            metadata: self.metadata,
            timestamp: self.timestamp,
        };
        row.into_entry(id)
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the AuditLog repository.
#[derive(Clone)]
pub struct SurrealAuditLogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAuditLogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AuditLogRepository for SurrealAuditLogRepository<C> {
    async fn append(&self, input: CreateAuditLogEntry) -> MallopsResult<AuditLogEntry> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let metadata = input
            .metadata
            .unwrap_or(serde_json::Value::Object(Default::default()));

        let result = self
            .db
            .query(
                "CREATE type::record('audit_log', $id) SET \
                 mall_id = $mall_id, \
                 actor_id = $actor_id, \
                 action = $action, \
                 resource_id = $resource_id, \
                 outcome = $outcome, \
                 metadata = $metadata",
            )
            .bind(("id", id_str.clone()))
            .bind(("mall_id", input.mall_id.map(|m| m.to_string())))
            .bind(("actor_id", input.actor_id.to_string()))
            .bind(("action", input.action))
            .bind(("resource_id", input.resource_id.map(|r| r.to_string())))
            .bind(("outcome", outcome_to_string(&input.outcome)))
            .bind(("metadata", metadata))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<AuditRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "audit_log".into(),
            id: id_str,
        })?;

        Ok(row.into_entry(id)?)
    }

    async fn list(
        &self,
        filter: AuditLogFilter,
        pagination: Pagination,
    ) -> MallopsResult<PaginatedResult<AuditLogEntry>> {
        let mut conds = Vec::new();
        if filter.actor_id.is_some() {
            conds.push("actor_id = $actor_id");
        }
        if filter.action.is_some() {
            conds.push("action = $action");
        }
        if filter.from.is_some() {
            conds.push("timestamp >= $from_ts");
        }
        if filter.to.is_some() {
            conds.push("timestamp <= $to_ts");
        }
        let where_clause = if conds.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conds.join(" AND "))
        };

        let count_query =
            format!("SELECT count() AS total FROM audit_log{where_clause} GROUP ALL");
        let list_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM audit_log{where_clause} \
             ORDER BY timestamp DESC \
             LIMIT $limit START $offset"
        );

        let mut count_builder = self.db.query(&count_query);
        let mut list_builder = self
            .db
            .query(&list_query)
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));

        if let Some(actor_id) = filter.actor_id {
            count_builder = count_builder.bind(("actor_id", actor_id.to_string()));
            list_builder = list_builder.bind(("actor_id", actor_id.to_string()));
        }
        if let Some(action) = filter.action {
            count_builder = count_builder.bind(("action", action.clone()));
            list_builder = list_builder.bind(("action", action));
        }
        if let Some(from) = filter.from {
            count_builder = count_builder.bind(("from_ts", from));
            list_builder = list_builder.bind(("from_ts", from));
        }
        if let Some(to) = filter.to {
            count_builder = count_builder.bind(("to_ts", to));
            list_builder = list_builder.bind(("to_ts", to));
        }

        let mut count_result = count_builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = list_builder.await.map_err(DbError::from)?;
        let rows: Vec<AuditRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_entry())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
