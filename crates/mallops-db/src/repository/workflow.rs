//! SurrealDB implementation of [`WorkflowRepository`].
//!
//! A workflow and its initial task instances are created in one
//! transaction. Workflow status and task statuses are stored and mutated
//! independently.

use chrono::{DateTime, Utc};
use mallops_core::error::MallopsResult;
use mallops_core::models::workflow::{
    CreateTaskInstance, CreateWorkflow, TaskInstance, UpdateTaskInstance, Workflow,
    WorkflowStatus,
};
use mallops_core::repository::{PaginatedResult, Pagination, WorkflowRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct WorkflowRow {
    workflow_type: String,
    created_by: String,
    data: serde_json::Value,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct WorkflowRowWithId {
    record_id: String,
    workflow_type: String,
    created_by: String,
    data: serde_json::Value,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct TaskRow {
    workflow_id: String,
    assigned_to: String,
    step: String,
    status: String,
    comment: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct TaskRowWithId {
    record_id: String,
    workflow_id: String,
    assigned_to: String,
    step: String,
    status: String,
    comment: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Initial steps are shipped to the transaction as one bound array; the
/// record UUIDs are generated here so task rows keep UUID identities.
#[derive(Debug, SurrealValue)]
struct StepSeed {
    id: String,
    assigned_to: String,
    step: String,
}

fn parse_status(s: &str) -> Result<WorkflowStatus, DbError> {
    match s {
        "pending" => Ok(WorkflowStatus::Pending),
        "in_progress" => Ok(WorkflowStatus::InProgress),
        "approved" => Ok(WorkflowStatus::Approved),
        "rejected" => Ok(WorkflowStatus::Rejected),
        "completed" => Ok(WorkflowStatus::Completed),
        "cancelled" => Ok(WorkflowStatus::Cancelled),
        other => Err(DbError::Migration(format!(
            "unknown workflow status: {other}"
        ))),
    }
}

fn status_to_string(status: WorkflowStatus) -> &'static str {
    match status {
        WorkflowStatus::Pending => "pending",
        WorkflowStatus::InProgress => "in_progress",
        WorkflowStatus::Approved => "approved",
        WorkflowStatus::Rejected => "rejected",
        WorkflowStatus::Completed => "completed",
        WorkflowStatus::Cancelled => "cancelled",
    }
}

impl WorkflowRow {
    fn into_workflow(self, id: Uuid) -> Result<Workflow, DbError> {
        let created_by = Uuid::parse_str(&self.created_by)
            .map_err(|e| DbError::Migration(format!("invalid creator UUID: {e}")))?;
        Ok(Workflow {
            id,
            workflow_type: self.workflow_type,
            created_by,
            data: self.data,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl WorkflowRowWithId {
    fn try_into_workflow(self) -> Result<Workflow, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let row = WorkflowRow {
            workflow_type: self.workflow_type,
            created_by: self.created_by,
            data: self.data,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        row.into_workflow(id)
    }
}

impl TaskRow {
    fn into_task(self, id: Uuid) -> Result<TaskInstance, DbError> {
        let workflow_id = Uuid::parse_str(&self.workflow_id)
            .map_err(|e| DbError::Migration(format!("invalid workflow UUID: {e}")))?;
        let assigned_to = Uuid::parse_str(&self.assigned_to)
            .map_err(|e| DbError::Migration(format!("invalid assignee UUID: {e}")))?;
        Ok(TaskInstance {
            id,
            workflow_id,
            assigned_to,
            step: self.step,
            status: parse_status(&self.status)?,
            comment: self.comment,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl TaskRowWithId {
    fn try_into_task(self) -> Result<TaskInstance, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let row = TaskRow {
            workflow_id: self.workflow_id,
            assigned_to: self.assigned_to,
            step: self.step,
            status: self.status,
            comment: self.comment,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        row.into_task(id)
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Workflow repository.
#[derive(Clone)]
pub struct SurrealWorkflowRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealWorkflowRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> WorkflowRepository for SurrealWorkflowRepository<C> {
    async fn create(&self, input: CreateWorkflow) -> MallopsResult<Workflow> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let data = input
            .data
            .unwrap_or(serde_json::Value::Object(Default::default()));
        let steps: Vec<StepSeed> = input
            .steps
            .into_iter()
            .map(|s| StepSeed {
                id: Uuid::new_v4().to_string(),
                assigned_to: s.assigned_to.to_string(),
                step: s.step,
            })
            .collect();

        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 CREATE type::record('workflow', $id) SET \
                     workflow_type = $workflow_type, \
                     created_by = $created_by, \
                     data = $data, \
                     status = 'pending'; \
                 FOR $s IN $steps { \
                     CREATE type::record('task_instance', $s.id) SET \
                         workflow_id = $id, \
                         assigned_to = $s.assigned_to, \
                         step = $s.step, \
                         status = 'pending'; \
                 }; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id_str.clone()))
            .bind(("workflow_type", input.workflow_type))
            .bind(("created_by", input.created_by.to_string()))
            .bind(("data", data))
            .bind(("steps", steps))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> MallopsResult<Workflow> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('workflow', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<WorkflowRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "workflow".into(),
            id: id_str,
        })?;

        Ok(row.into_workflow(id)?)
    }

    async fn list(&self, pagination: Pagination) -> MallopsResult<PaginatedResult<Workflow>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM workflow GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM workflow \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<WorkflowRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_workflow())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn update_status(&self, id: Uuid, status: WorkflowStatus) -> MallopsResult<Workflow> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('workflow', $id) SET \
                 status = $status, updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("status", status_to_string(status)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<WorkflowRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "workflow".into(),
            id: id_str,
        })?;

        Ok(row.into_workflow(id)?)
    }

    async fn add_task(&self, input: CreateTaskInstance) -> MallopsResult<TaskInstance> {
        // The owning workflow must exist; appending tasks to a missing
        // workflow would otherwise succeed silently.
        self.get_by_id(input.workflow_id).await?;

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('task_instance', $id) SET \
                 workflow_id = $workflow_id, \
                 assigned_to = $assigned_to, \
                 step = $step, \
                 status = 'pending'",
            )
            .bind(("id", id_str.clone()))
            .bind(("workflow_id", input.workflow_id.to_string()))
            .bind(("assigned_to", input.assigned_to.to_string()))
            .bind(("step", input.step))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<TaskRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "task_instance".into(),
            id: id_str,
        })?;

        Ok(row.into_task(id)?)
    }

    async fn get_tasks(&self, workflow_id: Uuid) -> MallopsResult<Vec<TaskInstance>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM task_instance \
                 WHERE workflow_id = $workflow_id \
                 ORDER BY created_at ASC",
            )
            .bind(("workflow_id", workflow_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TaskRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_task())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn update_task(
        &self,
        task_id: Uuid,
        input: UpdateTaskInstance,
    ) -> MallopsResult<TaskInstance> {
        let id_str = task_id.to_string();

        let mut sets = Vec::new();
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.comment.is_some() {
            sets.push("comment = $comment");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('task_instance', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(status) = input.status {
            builder = builder.bind(("status", status_to_string(status)));
        }
        if let Some(comment) = input.comment {
            builder = builder.bind(("comment", comment));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<TaskRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "task_instance".into(),
            id: id_str,
        })?;

        Ok(row.into_task(task_id)?)
    }
}
