//! Access service — credential resolution and gate checks.

use chrono::Utc;
use mallops_core::models::user::{UserRole, UserStatus};
use mallops_core::repository::{SessionRepository, UserRepository};
use uuid::Uuid;

use crate::config::AccessConfig;
use crate::error::{AccessError, AccessResult};
use crate::identity::{AuthContext, token_hash};
use crate::policy::{Action, permits};

/// Access service.
///
/// Generic over repository implementations so that the gate has no
/// dependency on the database crate.
#[derive(Clone)]
pub struct AccessService<U: UserRepository, S: SessionRepository> {
    user_repo: U,
    session_repo: S,
    config: AccessConfig,
}

impl<U: UserRepository, S: SessionRepository> AccessService<U, S> {
    pub fn new(user_repo: U, session_repo: S, config: AccessConfig) -> Self {
        Self {
            user_repo,
            session_repo,
            config,
        }
    }

    pub fn config(&self) -> &AccessConfig {
        &self.config
    }

    /// Resolve a raw token into the caller's context.
    ///
    /// The token is hashed and looked up in the session store; expired or
    /// unknown sessions and inactive accounts all fail closed.
    pub async fn authenticate(&self, token: &str) -> AccessResult<AuthContext> {
        let hash = token_hash(token);
        let session = self
            .session_repo
            .get_by_token_hash(&hash)
            .await
            .map_err(|_| AccessError::InvalidSession)?;

        if session.expires_at <= Utc::now() {
            return Err(AccessError::SessionExpired);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .map_err(|_| AccessError::InvalidSession)?;

        if user.status != UserStatus::Active {
            return Err(AccessError::AccountInactive);
        }

        Ok(AuthContext::from(&user))
    }

    /// Role table check for one action.
    pub fn require(&self, ctx: &AuthContext, action: Action) -> AccessResult<()> {
        if permits(ctx.role, action) {
            Ok(())
        } else {
            Err(AccessError::Forbidden)
        }
    }

    /// Ownership check against a resource's mall/tenant scope.
    ///
    /// SUPER_ADMIN bypasses; MALL_ADMIN must match the resource's mall;
    /// tenant roles must match the resource's tenant (and its mall, when
    /// the caller carries one).
    pub fn require_resource(
        &self,
        ctx: &AuthContext,
        resource_mall: Option<Uuid>,
        resource_tenant: Option<Uuid>,
    ) -> AccessResult<()> {
        if ctx.role == UserRole::SuperAdmin {
            return Ok(());
        }

        if let Some(mall) = resource_mall
            && let Some(own_mall) = ctx.mall_id
            && mall != own_mall
        {
            return Err(AccessError::Forbidden);
        }

        if ctx.role.is_tenant_scoped()
            && let Some(tenant) = resource_tenant
            && ctx.tenant_id != Some(tenant)
        {
            return Err(AccessError::Forbidden);
        }

        Ok(())
    }
}
