//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Mall- and tenant-scoped data is
//! isolated through scoping fields on the models; the access gate decides
//! which scopes a caller may touch.

use uuid::Uuid;

use crate::error::MallopsResult;
use crate::models::{
    audit::{AuditLogEntry, CreateAuditLogEntry},
    mall::{CreateMall, Mall, UpdateMall},
    notification::{
        CreateNotification, Notification, NotificationRecipient, ReadStatus, UserNotification,
    },
    permit::{CreateWorkPermit, PermitFilter, PermitStatus, UpdateWorkPermit, WorkPermit},
    session::{CreateSession, Session},
    tenant::{CreateTenant, Tenant, UpdateTenant},
    user::{CreateUser, UpdateUser, User},
    workflow::{
        CreateTaskInstance, CreateWorkflow, TaskInstance, UpdateTaskInstance, Workflow,
        WorkflowStatus,
    },
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Mall & Tenant (global scope)
// ---------------------------------------------------------------------------

pub trait MallRepository: Send + Sync {
    fn create(&self, input: CreateMall) -> impl Future<Output = MallopsResult<Mall>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = MallopsResult<Mall>> + Send;
    fn get_by_slug(&self, slug: &str) -> impl Future<Output = MallopsResult<Mall>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateMall,
    ) -> impl Future<Output = MallopsResult<Mall>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = MallopsResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = MallopsResult<PaginatedResult<Mall>>> + Send;
}

pub trait TenantRepository: Send + Sync {
    fn create(&self, input: CreateTenant) -> impl Future<Output = MallopsResult<Tenant>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = MallopsResult<Tenant>> + Send;
    fn get_by_slug(
        &self,
        mall_id: Uuid,
        slug: &str,
    ) -> impl Future<Output = MallopsResult<Tenant>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateTenant,
    ) -> impl Future<Output = MallopsResult<Tenant>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = MallopsResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = MallopsResult<PaginatedResult<Tenant>>> + Send;
    fn list_by_mall(
        &self,
        mall_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = MallopsResult<PaginatedResult<Tenant>>> + Send;
}

// ---------------------------------------------------------------------------
// Users & Sessions
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = MallopsResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = MallopsResult<User>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = MallopsResult<User>> + Send;
    fn list_by_tenant(
        &self,
        tenant_id: Uuid,
    ) -> impl Future<Output = MallopsResult<Vec<User>>> + Send;
}

pub trait SessionRepository: Send + Sync {
    fn create(&self, input: CreateSession) -> impl Future<Output = MallopsResult<Session>> + Send;
    fn get_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = MallopsResult<Session>> + Send;
}

// ---------------------------------------------------------------------------
// Work permits
// ---------------------------------------------------------------------------

/// Notification content attached to a permit status change. Recipients are
/// always the permit tenant's active users; the store writes permit update,
/// notification, and recipient rows in one transaction.
#[derive(Debug, Clone)]
pub struct StatusNotice {
    pub title: String,
    pub body: String,
    pub kind: String,
}

pub trait WorkPermitRepository: Send + Sync {
    /// Persist a submitted permit. Status starts at `PendingApproval` and a
    /// permit number is assigned.
    fn create(
        &self,
        input: CreateWorkPermit,
    ) -> impl Future<Output = MallopsResult<WorkPermit>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = MallopsResult<WorkPermit>> + Send;
    fn list(
        &self,
        filter: PermitFilter,
        pagination: Pagination,
    ) -> impl Future<Output = MallopsResult<PaginatedResult<WorkPermit>>> + Send;
    /// Field overwrites without a status change.
    fn update(
        &self,
        id: Uuid,
        input: UpdateWorkPermit,
    ) -> impl Future<Output = MallopsResult<WorkPermit>> + Send;
    /// Set the permit status and fan a notification out to the permit
    /// tenant's users, atomically.
    fn transition(
        &self,
        id: Uuid,
        status: PermitStatus,
        actor_id: Uuid,
        notice: StatusNotice,
    ) -> impl Future<Output = MallopsResult<WorkPermit>> + Send;
    fn add_comment(
        &self,
        id: Uuid,
        author_id: Uuid,
        text: String,
    ) -> impl Future<Output = MallopsResult<WorkPermit>> + Send;
    fn add_violation(
        &self,
        id: Uuid,
        author_id: Uuid,
        text: String,
    ) -> impl Future<Output = MallopsResult<WorkPermit>> + Send;
}

// ---------------------------------------------------------------------------
// Workflows
// ---------------------------------------------------------------------------

pub trait WorkflowRepository: Send + Sync {
    /// Create a workflow and its initial task instances.
    fn create(
        &self,
        input: CreateWorkflow,
    ) -> impl Future<Output = MallopsResult<Workflow>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = MallopsResult<Workflow>> + Send;
    /// Newest first.
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = MallopsResult<PaginatedResult<Workflow>>> + Send;
    /// Workflow status is independent of its tasks' statuses.
    fn update_status(
        &self,
        id: Uuid,
        status: WorkflowStatus,
    ) -> impl Future<Output = MallopsResult<Workflow>> + Send;
    fn add_task(
        &self,
        input: CreateTaskInstance,
    ) -> impl Future<Output = MallopsResult<TaskInstance>> + Send;
    /// Tasks of a workflow, oldest first.
    fn get_tasks(
        &self,
        workflow_id: Uuid,
    ) -> impl Future<Output = MallopsResult<Vec<TaskInstance>>> + Send;
    fn update_task(
        &self,
        task_id: Uuid,
        input: UpdateTaskInstance,
    ) -> impl Future<Output = MallopsResult<TaskInstance>> + Send;
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

pub trait NotificationRepository: Send + Sync {
    /// Create the notification and its recipient rows in one transaction.
    /// Explicit recipients are used verbatim; otherwise every active
    /// tenant-scoped user is addressed.
    fn create(
        &self,
        input: CreateNotification,
    ) -> impl Future<Output = MallopsResult<Notification>> + Send;
    /// Idempotent: creates the recipient row if absent, else refreshes the
    /// read timestamp.
    fn mark_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
        tenant_id: Option<Uuid>,
    ) -> impl Future<Output = MallopsResult<NotificationRecipient>> + Send;
    /// Compares the full tenant set against recipient rows marked read.
    fn read_status(
        &self,
        notification_id: Uuid,
    ) -> impl Future<Output = MallopsResult<ReadStatus>> + Send;
    /// Notifications addressed to the user, newest first.
    fn list_for_user(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = MallopsResult<PaginatedResult<UserNotification>>> + Send;
}

// ---------------------------------------------------------------------------
// Audit (append-only)
// ---------------------------------------------------------------------------

/// Query filters for audit log entries.
#[derive(Debug, Clone, Default)]
pub struct AuditLogFilter {
    pub actor_id: Option<Uuid>,
    pub action: Option<String>,
    pub from: Option<chrono::DateTime<chrono::Utc>>,
    pub to: Option<chrono::DateTime<chrono::Utc>>,
}

pub trait AuditLogRepository: Send + Sync {
    /// Append a new audit log entry. No update or delete operations exist.
    fn append(
        &self,
        input: CreateAuditLogEntry,
    ) -> impl Future<Output = MallopsResult<AuditLogEntry>> + Send;
    fn list(
        &self,
        filter: AuditLogFilter,
        pagination: Pagination,
    ) -> impl Future<Output = MallopsResult<PaginatedResult<AuditLogEntry>>> + Send;
}
