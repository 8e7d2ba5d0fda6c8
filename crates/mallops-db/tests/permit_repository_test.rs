//! Integration tests for the WorkPermit repository using in-memory
//! SurrealDB.

use chrono::{Duration, Utc};
use mallops_core::models::mall::CreateMall;
use mallops_core::models::permit::{
    Attachment, CreateWorkPermit, PermitFilter, PermitStatus, UpdateWorkPermit,
};
use mallops_core::models::tenant::CreateTenant;
use mallops_core::models::user::{CreateUser, UserRole};
use mallops_core::repository::{
    MallRepository, NotificationRepository, Pagination, StatusNotice, TenantRepository,
    UserRepository, WorkPermitRepository,
};
use mallops_db::repository::{
    SurrealMallRepository, SurrealNotificationRepository, SurrealTenantRepository,
    SurrealUserRepository, SurrealWorkPermitRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    mallops_db::run_migrations(&db).await.unwrap();
    db
}

struct Fixture {
    db: Surreal<Db>,
    mall_id: Uuid,
    tenant_id: Uuid,
    submitter: Uuid,
}

/// Helper: a mall, a tenant, and one tenant user who submits permits.
async fn fixture() -> Fixture {
    let db = setup().await;

    let mall = SurrealMallRepository::new(db.clone())
        .create(CreateMall {
            name: "Harbor Mall".into(),
            slug: "harbor".into(),
            metadata: None,
        })
        .await
        .unwrap();

    let tenant = SurrealTenantRepository::new(db.clone())
        .create(CreateTenant {
            mall_id: mall.id,
            name: "Deli".into(),
            slug: "deli".into(),
            metadata: None,
        })
        .await
        .unwrap();

    let submitter = SurrealUserRepository::new(db.clone())
        .create(CreateUser {
            mall_id: Some(mall.id),
            tenant_id: Some(tenant.id),
            username: "deli-owner".into(),
            email: "owner@deli.example".into(),
            role: UserRole::TenantAdmin,
            metadata: None,
        })
        .await
        .unwrap();

    Fixture {
        db,
        mall_id: mall.id,
        tenant_id: tenant.id,
        submitter: submitter.id,
    }
}

fn permit_input(fx: &Fixture, description: &str) -> CreateWorkPermit {
    CreateWorkPermit {
        mall_id: fx.mall_id,
        tenant_id: fx.tenant_id,
        permit_type: "hot_work".into(),
        risk_level: "high".into(),
        category: "maintenance".into(),
        work_description: description.into(),
        start_date: Utc::now(),
        end_date: Utc::now() + Duration::days(3),
        attachments: None,
        created_by: fx.submitter,
    }
}

#[tokio::test]
async fn create_defaults_to_pending_approval() {
    let fx = fixture().await;
    let repo = SurrealWorkPermitRepository::new(fx.db.clone());

    let permit = repo.create(permit_input(&fx, "Replace fryer hood")).await.unwrap();

    assert_eq!(permit.status, PermitStatus::PendingApproval);
    assert!(permit.permit_number.starts_with("WP-"));
    assert_eq!(permit.tenant_id, fx.tenant_id);
    assert_eq!(permit.mall_id, fx.mall_id);
    assert!(permit.comments.is_empty());
    assert!(permit.violations.is_empty());

    let fetched = repo.get_by_id(permit.id).await.unwrap();
    assert_eq!(fetched.id, permit.id);
    assert_eq!(fetched.permit_number, permit.permit_number);
    assert_eq!(fetched.work_description, "Replace fryer hood");
}

#[tokio::test]
async fn create_carries_attachment_metadata() {
    let fx = fixture().await;
    let repo = SurrealWorkPermitRepository::new(fx.db.clone());

    let mut input = permit_input(&fx, "Install signage");
    input.attachments = Some(vec![Attachment {
        name: "site-plan.pdf".into(),
        content_type: "application/pdf".into(),
        url: "https://files.example/site-plan.pdf".into(),
    }]);

    let permit = repo.create(input).await.unwrap();
    assert_eq!(permit.attachments.len(), 1);
    assert_eq!(permit.attachments[0].name, "site-plan.pdf");

    let fetched = repo.get_by_id(permit.id).await.unwrap();
    assert_eq!(fetched.attachments.len(), 1);
    assert_eq!(fetched.attachments[0].url, "https://files.example/site-plan.pdf");
}

#[tokio::test]
async fn list_filters_by_status_tenant_and_search() {
    let fx = fixture().await;
    let repo = SurrealWorkPermitRepository::new(fx.db.clone());

    let p1 = repo.create(permit_input(&fx, "Electrical rewiring")).await.unwrap();
    repo.create(permit_input(&fx, "Paint the storefront")).await.unwrap();

    // A permit for a different tenant in the same mall.
    let other_tenant = SurrealTenantRepository::new(fx.db.clone())
        .create(CreateTenant {
            mall_id: fx.mall_id,
            name: "Florist".into(),
            slug: "florist".into(),
            metadata: None,
        })
        .await
        .unwrap();
    let mut other_input = permit_input(&fx, "Electrical outlet fix");
    other_input.tenant_id = other_tenant.id;
    repo.create(other_input).await.unwrap();

    // Approve one permit to exercise the status filter.
    repo.transition(
        p1.id,
        PermitStatus::Approved,
        fx.submitter,
        StatusNotice {
            title: "approved".into(),
            body: "approved".into(),
            kind: "work_permit".into(),
        },
    )
    .await
    .unwrap();

    let approved = repo
        .list(
            PermitFilter {
                status: Some(PermitStatus::Approved),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(approved.total, 1);
    assert_eq!(approved.items[0].id, p1.id);

    let mine = repo
        .list(
            PermitFilter {
                tenant_id: Some(fx.tenant_id),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(mine.total, 2);

    let searched = repo
        .list(
            PermitFilter {
                search: Some("Electrical".into()),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(searched.total, 2);

    let scoped_search = repo
        .list(
            PermitFilter {
                tenant_id: Some(fx.tenant_id),
                search: Some("Electrical".into()),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(scoped_search.total, 1);

    // Searching by permit number finds the same record.
    let by_number = repo
        .list(
            PermitFilter {
                search: Some(p1.permit_number.clone()),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(by_number.total, 1);
    assert_eq!(by_number.items[0].id, p1.id);
}

#[tokio::test]
async fn update_overwrites_fields_without_touching_status() {
    let fx = fixture().await;
    let repo = SurrealWorkPermitRepository::new(fx.db.clone());

    let permit = repo.create(permit_input(&fx, "Before")).await.unwrap();

    let updated = repo
        .update(
            permit.id,
            UpdateWorkPermit {
                work_description: Some("After".into()),
                risk_level: Some("low".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.work_description, "After");
    assert_eq!(updated.risk_level, "low");
    assert_eq!(updated.permit_type, "hot_work"); // unchanged
    assert_eq!(updated.status, PermitStatus::PendingApproval);
    assert!(updated.updated_at >= permit.updated_at);
}

#[tokio::test]
async fn transition_updates_status_and_fans_out_to_tenant_users() {
    let fx = fixture().await;
    let repo = SurrealWorkPermitRepository::new(fx.db.clone());
    let users = SurrealUserRepository::new(fx.db.clone());
    let notifications = SurrealNotificationRepository::new(fx.db.clone());

    // A second user in the same tenant and one in another tenant.
    let coworker = users
        .create(CreateUser {
            mall_id: Some(fx.mall_id),
            tenant_id: Some(fx.tenant_id),
            username: "deli-staff".into(),
            email: "staff@deli.example".into(),
            role: UserRole::TenantUser,
            metadata: None,
        })
        .await
        .unwrap();
    let outsider_tenant = SurrealTenantRepository::new(fx.db.clone())
        .create(CreateTenant {
            mall_id: fx.mall_id,
            name: "Arcade".into(),
            slug: "arcade".into(),
            metadata: None,
        })
        .await
        .unwrap();
    let outsider = users
        .create(CreateUser {
            mall_id: Some(fx.mall_id),
            tenant_id: Some(outsider_tenant.id),
            username: "arcade-owner".into(),
            email: "owner@arcade.example".into(),
            role: UserRole::TenantAdmin,
            metadata: None,
        })
        .await
        .unwrap();

    let permit = repo.create(permit_input(&fx, "Gas line check")).await.unwrap();

    let updated = repo
        .transition(
            permit.id,
            PermitStatus::Approved,
            fx.submitter,
            StatusNotice {
                title: format!("Work permit {}", permit.permit_number),
                body: "approved".into(),
                kind: "work_permit".into(),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, PermitStatus::Approved);

    // Both users of the permit's tenant were addressed, the outsider not.
    for user in [fx.submitter, coworker.id] {
        let page = notifications
            .list_for_user(user, Pagination::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1, "tenant user should be addressed");
        assert!(!page.items[0].is_read);
        assert_eq!(page.items[0].notification.kind, "work_permit");
    }
    let outsider_page = notifications
        .list_for_user(outsider.id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(outsider_page.total, 0);
}

#[tokio::test]
async fn transition_of_missing_permit_is_not_found() {
    let fx = fixture().await;
    let repo = SurrealWorkPermitRepository::new(fx.db.clone());

    let result = repo
        .transition(
            Uuid::new_v4(),
            PermitStatus::Approved,
            fx.submitter,
            StatusNotice {
                title: "t".into(),
                body: "b".into(),
                kind: "work_permit".into(),
            },
        )
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn comments_and_violations_append_independently() {
    let fx = fixture().await;
    let repo = SurrealWorkPermitRepository::new(fx.db.clone());

    let permit = repo.create(permit_input(&fx, "Roof access")).await.unwrap();

    let after_comment = repo
        .add_comment(permit.id, fx.submitter, "Ladder secured".into())
        .await
        .unwrap();
    assert_eq!(after_comment.comments.len(), 1);
    assert_eq!(after_comment.comments[0].text, "Ladder secured");
    assert_eq!(after_comment.comments[0].author_id, fx.submitter);
    assert!(after_comment.violations.is_empty());

    let after_violation = repo
        .add_violation(permit.id, fx.submitter, "No harness worn".into())
        .await
        .unwrap();
    assert_eq!(after_violation.comments.len(), 1);
    assert_eq!(after_violation.violations.len(), 1);
    assert_eq!(after_violation.violations[0].text, "No harness worn");

    let second = repo
        .add_comment(permit.id, fx.submitter, "Harness corrected".into())
        .await
        .unwrap();
    assert_eq!(second.comments.len(), 2);
}
