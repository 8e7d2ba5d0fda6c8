//! Workflow domain model.
//!
//! A workflow groups ordered task instances; each task has an assignee and
//! its own status and comment. Workflow status and task statuses are
//! mutated independently — nothing derives one from the other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shared by workflows and their task instances.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Pending,
    InProgress,
    Approved,
    Rejected,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: Uuid,
    /// Kind of request this workflow carries (e.g., `work_permit`,
    /// `letter`, `leave_request`).
    pub workflow_type: String,
    pub created_by: Uuid,
    /// Free-form request payload.
    pub data: serde_json::Value,
    pub status: WorkflowStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInstance {
    pub id: Uuid,
    pub workflow_id: Uuid,
    /// User this step is assigned to.
    pub assigned_to: Uuid,
    /// Step label (e.g., `manager_approval`, `inspector_review`).
    pub step: String,
    pub status: WorkflowStatus,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An initial step supplied at workflow creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub assigned_to: Uuid,
    pub step: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkflow {
    pub workflow_type: String,
    pub created_by: Uuid,
    pub data: Option<serde_json::Value>,
    /// Initial task instances, in order.
    pub steps: Vec<WorkflowStep>,
}

/// Appends a task to an existing workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskInstance {
    pub workflow_id: Uuid,
    pub assigned_to: Uuid,
    pub step: String,
}

/// Task mutation: status and/or comment, each optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTaskInstance {
    pub status: Option<WorkflowStatus>,
    pub comment: Option<String>,
}
