//! Shared application state.
//!
//! Repositories are thin wrappers around the shared database handle, so
//! they are constructed on demand per request.

use mallops_access::{AccessConfig, AccessService, AuthContext};
use mallops_core::models::audit::{AuditOutcome, CreateAuditLogEntry};
use mallops_core::repository::AuditLogRepository;
use mallops_db::repository::{
    SurrealAuditLogRepository, SurrealMallRepository, SurrealNotificationRepository,
    SurrealSessionRepository, SurrealTenantRepository, SurrealUserRepository,
    SurrealWorkPermitRepository, SurrealWorkflowRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use tracing::warn;
use uuid::Uuid;

pub type Db = Surreal<Any>;

#[derive(Clone)]
pub struct AppState {
    db: Db,
    access: AccessConfig,
}

impl AppState {
    pub fn new(db: Db, access: AccessConfig) -> Self {
        Self { db, access }
    }

    pub fn malls(&self) -> SurrealMallRepository<Any> {
        SurrealMallRepository::new(self.db.clone())
    }

    pub fn tenants(&self) -> SurrealTenantRepository<Any> {
        SurrealTenantRepository::new(self.db.clone())
    }

    pub fn users(&self) -> SurrealUserRepository<Any> {
        SurrealUserRepository::new(self.db.clone())
    }

    pub fn sessions(&self) -> SurrealSessionRepository<Any> {
        SurrealSessionRepository::new(self.db.clone())
    }

    pub fn permits(&self) -> SurrealWorkPermitRepository<Any> {
        SurrealWorkPermitRepository::new(self.db.clone())
    }

    pub fn workflows(&self) -> SurrealWorkflowRepository<Any> {
        SurrealWorkflowRepository::new(self.db.clone())
    }

    pub fn notifications(&self) -> SurrealNotificationRepository<Any> {
        SurrealNotificationRepository::new(self.db.clone())
    }

    pub fn audit_log(&self) -> SurrealAuditLogRepository<Any> {
        SurrealAuditLogRepository::new(self.db.clone())
    }

    pub fn access(&self) -> AccessService<SurrealUserRepository<Any>, SurrealSessionRepository<Any>> {
        AccessService::new(self.users(), self.sessions(), self.access.clone())
    }

    /// Best-effort audit append. Audit rows never fail the operation they
    /// record; a failed append is logged and dropped.
    pub async fn audit(
        &self,
        ctx: &AuthContext,
        action: &str,
        resource_id: Option<Uuid>,
        outcome: AuditOutcome,
    ) {
        let entry = CreateAuditLogEntry {
            mall_id: ctx.mall_id,
            actor_id: ctx.user_id,
            action: action.to_string(),
            resource_id,
            outcome,
            metadata: None,
        };
        if let Err(err) = self.audit_log().append(entry).await {
            warn!(action, error = %err, "failed to append audit log entry");
        }
    }
}
