//! Integration tests for the Notification repository using in-memory
//! SurrealDB.

use mallops_core::models::mall::CreateMall;
use mallops_core::models::notification::CreateNotification;
use mallops_core::models::tenant::CreateTenant;
use mallops_core::models::user::{CreateUser, UpdateUser, UserRole, UserStatus};
use mallops_core::repository::{
    MallRepository, NotificationRepository, Pagination, TenantRepository, UserRepository,
};
use mallops_db::repository::{
    SurrealMallRepository, SurrealNotificationRepository, SurrealTenantRepository,
    SurrealUserRepository,
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
    admin: Uuid,
    tenant_a: Uuid,
    tenant_b: Uuid,
    user_a1: Uuid,
    user_a2: Uuid,
    user_b1: Uuid,
}

/// One mall, two tenants, a mall admin, and three tenant users.
async fn fixture() -> Fixture {
    let db = setup().await;
    let malls = SurrealMallRepository::new(db.clone());
    let tenants = SurrealTenantRepository::new(db.clone());
    let users = SurrealUserRepository::new(db.clone());

    let mall = malls
        .create(CreateMall {
            name: "Galleria".into(),
            slug: "galleria".into(),
            metadata: None,
        })
        .await
        .unwrap();

    let tenant_a = tenants
        .create(CreateTenant {
            mall_id: mall.id,
            name: "Tenant A".into(),
            slug: "tenant-a".into(),
            metadata: None,
        })
        .await
        .unwrap();
    let tenant_b = tenants
        .create(CreateTenant {
            mall_id: mall.id,
            name: "Tenant B".into(),
            slug: "tenant-b".into(),
            metadata: None,
        })
        .await
        .unwrap();

    let admin = users
        .create(CreateUser {
            mall_id: Some(mall.id),
            tenant_id: None,
            username: "galleria-admin".into(),
            email: "admin@galleria.example".into(),
            role: UserRole::MallAdmin,
            metadata: None,
        })
        .await
        .unwrap();
    let user_a1 = users
        .create(CreateUser {
            mall_id: Some(mall.id),
            tenant_id: Some(tenant_a.id),
            username: "a1".into(),
            email: "a1@example.com".into(),
            role: UserRole::TenantAdmin,
            metadata: None,
        })
        .await
        .unwrap();
    let user_a2 = users
        .create(CreateUser {
            mall_id: Some(mall.id),
            tenant_id: Some(tenant_a.id),
            username: "a2".into(),
            email: "a2@example.com".into(),
            role: UserRole::TenantUser,
            metadata: None,
        })
        .await
        .unwrap();
    let user_b1 = users
        .create(CreateUser {
            mall_id: Some(mall.id),
            tenant_id: Some(tenant_b.id),
            username: "b1".into(),
            email: "b1@example.com".into(),
            role: UserRole::TenantAdmin,
            metadata: None,
        })
        .await
        .unwrap();

    Fixture {
        db,
        admin: admin.id,
        tenant_a: tenant_a.id,
        tenant_b: tenant_b.id,
        user_a1: user_a1.id,
        user_a2: user_a2.id,
        user_b1: user_b1.id,
    }
}

fn announcement(created_by: Uuid, recipients: Option<Vec<Uuid>>) -> CreateNotification {
    CreateNotification {
        title: "Fire drill".into(),
        body: "Quarterly fire drill on Friday.".into(),
        kind: "announcement".into(),
        created_by,
        recipients,
    }
}

#[tokio::test]
async fn explicit_recipients_are_used_verbatim() {
    let fx = fixture().await;
    let repo = SurrealNotificationRepository::new(fx.db.clone());

    let notification = repo
        .create(announcement(fx.admin, Some(vec![fx.user_a1])))
        .await
        .unwrap();
    assert_eq!(notification.title, "Fire drill");

    let addressed = repo
        .list_for_user(fx.user_a1, Pagination::default())
        .await
        .unwrap();
    assert_eq!(addressed.total, 1);
    assert_eq!(addressed.items[0].notification.id, notification.id);
    assert!(!addressed.items[0].is_read);

    for skipped in [fx.user_a2, fx.user_b1, fx.admin] {
        let page = repo.list_for_user(skipped, Pagination::default()).await.unwrap();
        assert_eq!(page.total, 0);
    }
}

#[tokio::test]
async fn default_fanout_addresses_every_active_tenant_user() {
    let fx = fixture().await;
    let repo = SurrealNotificationRepository::new(fx.db.clone());
    let users = SurrealUserRepository::new(fx.db.clone());

    // Deactivated accounts drop out of the default audience.
    users
        .update(
            fx.user_a2,
            UpdateUser {
                status: Some(UserStatus::Inactive),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    repo.create(announcement(fx.admin, None)).await.unwrap();

    for addressed in [fx.user_a1, fx.user_b1] {
        let page = repo.list_for_user(addressed, Pagination::default()).await.unwrap();
        assert_eq!(page.total, 1, "active tenant user should be addressed");
    }

    // The inactive user and the (tenant-less) admin are not addressed.
    for skipped in [fx.user_a2, fx.admin] {
        let page = repo.list_for_user(skipped, Pagination::default()).await.unwrap();
        assert_eq!(page.total, 0);
    }
}

#[tokio::test]
async fn mark_read_is_idempotent() {
    let fx = fixture().await;
    let repo = SurrealNotificationRepository::new(fx.db.clone());

    let notification = repo
        .create(announcement(fx.admin, None))
        .await
        .unwrap();

    let first = repo
        .mark_read(notification.id, fx.user_a1, Some(fx.tenant_a))
        .await
        .unwrap();
    assert!(first.is_read);
    let first_read_at = first.read_at.expect("read timestamp set");

    let second = repo
        .mark_read(notification.id, fx.user_a1, Some(fx.tenant_a))
        .await
        .unwrap();
    assert!(second.is_read);
    assert!(second.read_at.expect("read timestamp set") >= first_read_at);

    // Still exactly one recipient row for this user.
    let page = repo
        .list_for_user(fx.user_a1, Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert!(page.items[0].is_read);
}

#[tokio::test]
async fn mark_read_creates_row_when_user_was_not_addressed() {
    let fx = fixture().await;
    let repo = SurrealNotificationRepository::new(fx.db.clone());

    let notification = repo
        .create(announcement(fx.admin, Some(vec![fx.user_a1])))
        .await
        .unwrap();

    // user_b1 was not addressed; marking read still records the row.
    let recipient = repo
        .mark_read(notification.id, fx.user_b1, Some(fx.tenant_b))
        .await
        .unwrap();
    assert!(recipient.is_read);
    assert_eq!(recipient.tenant_id, Some(fx.tenant_b));

    let page = repo
        .list_for_user(fx.user_b1, Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn read_status_partitions_the_full_tenant_set() {
    let fx = fixture().await;
    let repo = SurrealNotificationRepository::new(fx.db.clone());

    let notification = repo
        .create(announcement(fx.admin, None))
        .await
        .unwrap();

    let before = repo.read_status(notification.id).await.unwrap();
    assert!(before.read.is_empty());
    assert_eq!(before.unread.len(), 2);
    assert!(before.unread.contains(&fx.tenant_a));
    assert!(before.unread.contains(&fx.tenant_b));

    repo.mark_read(notification.id, fx.user_a1, Some(fx.tenant_a))
        .await
        .unwrap();

    let after = repo.read_status(notification.id).await.unwrap();
    assert_eq!(after.read, vec![fx.tenant_a]);
    assert_eq!(after.unread, vec![fx.tenant_b]);

    // A second reader from the same tenant does not duplicate the entry.
    repo.mark_read(notification.id, fx.user_a2, Some(fx.tenant_a))
        .await
        .unwrap();
    let again = repo.read_status(notification.id).await.unwrap();
    assert_eq!(again.read, vec![fx.tenant_a]);
    assert_eq!(again.unread, vec![fx.tenant_b]);
}

#[tokio::test]
async fn list_for_user_returns_newest_first_with_read_flags() {
    let fx = fixture().await;
    let repo = SurrealNotificationRepository::new(fx.db.clone());

    let first = repo.create(announcement(fx.admin, None)).await.unwrap();
    let second = repo
        .create(CreateNotification {
            title: "Parking closure".into(),
            body: "Level 2 closed next week.".into(),
            kind: "announcement".into(),
            created_by: fx.admin,
            recipients: None,
        })
        .await
        .unwrap();

    repo.mark_read(first.id, fx.user_a1, Some(fx.tenant_a))
        .await
        .unwrap();

    let page = repo
        .list_for_user(fx.user_a1, Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items[0].notification.id, second.id);
    assert!(!page.items[0].is_read);
    assert_eq!(page.items[1].notification.id, first.id);
    assert!(page.items[1].is_read);
}
