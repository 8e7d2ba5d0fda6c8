//! Integration tests for the access service against in-memory SurrealDB.

use chrono::{Duration, Utc};
use mallops_access::{AccessConfig, AccessError, AccessService, Action, token_hash};
use mallops_core::models::session::CreateSession;
use mallops_core::models::user::{CreateUser, UpdateUser, UserRole, UserStatus};
use mallops_core::repository::{SessionRepository, UserRepository};
use mallops_db::repository::{SurrealSessionRepository, SurrealUserRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    mallops_db::run_migrations(&db).await.unwrap();
    db
}

fn service(
    db: &Surreal<Db>,
) -> AccessService<SurrealUserRepository<Db>, SurrealSessionRepository<Db>> {
    AccessService::new(
        SurrealUserRepository::new(db.clone()),
        SurrealSessionRepository::new(db.clone()),
        AccessConfig::default(),
    )
}

async fn seed_user(db: &Surreal<Db>, role: UserRole, name: &str) -> Uuid {
    SurrealUserRepository::new(db.clone())
        .create(CreateUser {
            mall_id: Some(Uuid::new_v4()),
            tenant_id: role.is_tenant_scoped().then(Uuid::new_v4),
            username: name.into(),
            email: format!("{name}@example.com"),
            role,
            metadata: None,
        })
        .await
        .unwrap()
        .id
}

async fn seed_session(db: &Surreal<Db>, user_id: Uuid, token: &str, ttl: Duration) {
    SurrealSessionRepository::new(db.clone())
        .create(CreateSession {
            user_id,
            token_hash: token_hash(token),
            ip_address: None,
            user_agent: None,
            expires_at: Utc::now() + ttl,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn authenticate_resolves_a_valid_session() {
    let db = setup().await;
    let user_id = seed_user(&db, UserRole::TenantUser, "valid-user").await;
    seed_session(&db, user_id, "valid-token", Duration::hours(1)).await;

    let ctx = service(&db).authenticate("valid-token").await.unwrap();
    assert_eq!(ctx.user_id, user_id);
    assert_eq!(ctx.role, UserRole::TenantUser);
    assert!(ctx.tenant_id.is_some());
}

#[tokio::test]
async fn unknown_token_is_rejected() {
    let db = setup().await;
    let result = service(&db).authenticate("never-issued").await;
    assert!(matches!(result, Err(AccessError::InvalidSession)));
}

#[tokio::test]
async fn expired_session_is_rejected() {
    let db = setup().await;
    let user_id = seed_user(&db, UserRole::TenantUser, "expired-user").await;
    seed_session(&db, user_id, "expired-token", Duration::hours(-1)).await;

    let result = service(&db).authenticate("expired-token").await;
    assert!(matches!(result, Err(AccessError::SessionExpired)));
}

#[tokio::test]
async fn inactive_account_is_rejected() {
    let db = setup().await;
    let user_id = seed_user(&db, UserRole::TenantAdmin, "inactive-user").await;
    seed_session(&db, user_id, "inactive-token", Duration::hours(1)).await;

    SurrealUserRepository::new(db.clone())
        .update(
            user_id,
            UpdateUser {
                status: Some(UserStatus::Inactive),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let result = service(&db).authenticate("inactive-token").await;
    assert!(matches!(result, Err(AccessError::AccountInactive)));
}

#[tokio::test]
async fn role_table_gates_actions() {
    let db = setup().await;
    let svc = service(&db);

    let tenant_user_id = seed_user(&db, UserRole::TenantUser, "role-tenant").await;
    seed_session(&db, tenant_user_id, "role-tenant-token", Duration::hours(1)).await;
    let tenant_ctx = svc.authenticate("role-tenant-token").await.unwrap();

    assert!(svc.require(&tenant_ctx, Action::PermitCreate).is_ok());
    assert!(matches!(
        svc.require(&tenant_ctx, Action::PermitUpdate),
        Err(AccessError::Forbidden)
    ));
    assert!(matches!(
        svc.require(&tenant_ctx, Action::NotificationCreate),
        Err(AccessError::Forbidden)
    ));
}

#[tokio::test]
async fn ownership_check_enforces_mall_and_tenant_scope() {
    let db = setup().await;
    let svc = service(&db);

    let user_id = seed_user(&db, UserRole::TenantUser, "scope-user").await;
    seed_session(&db, user_id, "scope-token", Duration::hours(1)).await;
    let ctx = svc.authenticate("scope-token").await.unwrap();

    let own_mall = ctx.mall_id.unwrap();
    let own_tenant = ctx.tenant_id.unwrap();

    assert!(svc
        .require_resource(&ctx, Some(own_mall), Some(own_tenant))
        .is_ok());
    assert!(matches!(
        svc.require_resource(&ctx, Some(own_mall), Some(Uuid::new_v4())),
        Err(AccessError::Forbidden)
    ));
    assert!(matches!(
        svc.require_resource(&ctx, Some(Uuid::new_v4()), Some(own_tenant)),
        Err(AccessError::Forbidden)
    ));
}

#[tokio::test]
async fn super_admin_bypasses_ownership_but_not_the_role_table() {
    let db = setup().await;
    let svc = service(&db);

    let admin_id = seed_user(&db, UserRole::SuperAdmin, "root-admin").await;
    seed_session(&db, admin_id, "root-token", Duration::hours(1)).await;
    let ctx = svc.authenticate("root-token").await.unwrap();

    // Any mall, any tenant.
    assert!(svc
        .require_resource(&ctx, Some(Uuid::new_v4()), Some(Uuid::new_v4()))
        .is_ok());

    // Literal role table still applies: permits are tenant-submitted.
    assert!(matches!(
        svc.require(&ctx, Action::PermitCreate),
        Err(AccessError::Forbidden)
    ));
}
