//! Integration tests for Mall and Tenant repository implementations
//! using in-memory SurrealDB.

use mallops_core::models::mall::CreateMall;
use mallops_core::models::tenant::CreateTenant;
use mallops_core::repository::{MallRepository, Pagination, TenantRepository};
use mallops_db::repository::{SurrealMallRepository, SurrealTenantRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    mallops_db::run_migrations(&db).await.unwrap();
    db
}

// -----------------------------------------------------------------------
// Mall tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_and_get_mall() {
    let db = setup().await;
    let repo = SurrealMallRepository::new(db);

    let mall = repo
        .create(CreateMall {
            name: "Riverside Center".into(),
            slug: "riverside".into(),
            metadata: None,
        })
        .await
        .unwrap();

    assert_eq!(mall.name, "Riverside Center");
    assert_eq!(mall.slug, "riverside");

    // Get by ID should return the same mall.
    let fetched = repo.get_by_id(mall.id).await.unwrap();
    assert_eq!(fetched.id, mall.id);
    assert_eq!(fetched.name, mall.name);
    assert_eq!(fetched.slug, mall.slug);
}

#[tokio::test]
async fn get_mall_by_slug() {
    let db = setup().await;
    let repo = SurrealMallRepository::new(db);

    let mall = repo
        .create(CreateMall {
            name: "Slug Test".into(),
            slug: "slug-test".into(),
            metadata: None,
        })
        .await
        .unwrap();

    let fetched = repo.get_by_slug("slug-test").await.unwrap();
    assert_eq!(fetched.id, mall.id);
    assert_eq!(fetched.slug, "slug-test");
}

#[tokio::test]
async fn update_mall() {
    let db = setup().await;
    let repo = SurrealMallRepository::new(db);

    let mall = repo
        .create(CreateMall {
            name: "Before".into(),
            slug: "update-test".into(),
            metadata: None,
        })
        .await
        .unwrap();

    let updated = repo
        .update(
            mall.id,
            mallops_core::models::mall::UpdateMall {
                name: Some("After".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.id, mall.id);
    assert_eq!(updated.name, "After");
    assert_eq!(updated.slug, "update-test"); // unchanged
    assert!(updated.updated_at >= mall.updated_at);
}

#[tokio::test]
async fn delete_mall() {
    let db = setup().await;
    let repo = SurrealMallRepository::new(db);

    let mall = repo
        .create(CreateMall {
            name: "To Delete".into(),
            slug: "delete-test".into(),
            metadata: None,
        })
        .await
        .unwrap();

    repo.delete(mall.id).await.unwrap();

    let result = repo.get_by_id(mall.id).await;
    assert!(result.is_err(), "should not find deleted mall");
}

#[tokio::test]
async fn list_malls_with_pagination() {
    let db = setup().await;
    let repo = SurrealMallRepository::new(db);

    for i in 0..5 {
        repo.create(CreateMall {
            name: format!("Mall {i}"),
            slug: format!("mall-{i}"),
            metadata: None,
        })
        .await
        .unwrap();
    }

    let page1 = repo
        .list(Pagination {
            offset: 0,
            limit: 3,
        })
        .await
        .unwrap();

    assert_eq!(page1.items.len(), 3);
    assert_eq!(page1.total, 5);
    assert_eq!(page1.offset, 0);
    assert_eq!(page1.limit, 3);

    let page2 = repo
        .list(Pagination {
            offset: 3,
            limit: 3,
        })
        .await
        .unwrap();

    assert_eq!(page2.items.len(), 2);
    assert_eq!(page2.total, 5);
}

#[tokio::test]
async fn duplicate_mall_slug_rejected() {
    let db = setup().await;
    let repo = SurrealMallRepository::new(db);

    repo.create(CreateMall {
        name: "First".into(),
        slug: "unique-slug".into(),
        metadata: None,
    })
    .await
    .unwrap();

    let result = repo
        .create(CreateMall {
            name: "Second".into(),
            slug: "unique-slug".into(),
            metadata: None,
        })
        .await;

    assert!(result.is_err(), "duplicate slug should be rejected");
}

// -----------------------------------------------------------------------
// Tenant tests
// -----------------------------------------------------------------------

/// Helper: create a mall and return its ID.
async fn create_mall(
    repo: &SurrealMallRepository<surrealdb::engine::local::Db>,
    slug: &str,
) -> uuid::Uuid {
    repo.create(CreateMall {
        name: format!("Mall {slug}"),
        slug: slug.into(),
        metadata: None,
    })
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn create_and_get_tenant() {
    let db = setup().await;
    let mall_repo = SurrealMallRepository::new(db.clone());
    let tenant_repo = SurrealTenantRepository::new(db);

    let mall_id = create_mall(&mall_repo, "tenant-test-mall").await;

    let tenant = tenant_repo
        .create(CreateTenant {
            mall_id,
            name: "Corner Cafe".into(),
            slug: "corner-cafe".into(),
            metadata: None,
        })
        .await
        .unwrap();

    assert_eq!(tenant.mall_id, mall_id);
    assert_eq!(tenant.name, "Corner Cafe");
    assert_eq!(tenant.slug, "corner-cafe");

    let fetched = tenant_repo.get_by_id(tenant.id).await.unwrap();
    assert_eq!(fetched.id, tenant.id);
    assert_eq!(fetched.mall_id, mall_id);
}

#[tokio::test]
async fn get_tenant_by_slug() {
    let db = setup().await;
    let mall_repo = SurrealMallRepository::new(db.clone());
    let tenant_repo = SurrealTenantRepository::new(db);

    let mall_id = create_mall(&mall_repo, "slug-tenant-mall").await;

    let tenant = tenant_repo
        .create(CreateTenant {
            mall_id,
            name: "Bookshop".into(),
            slug: "bookshop".into(),
            metadata: None,
        })
        .await
        .unwrap();

    let fetched = tenant_repo.get_by_slug(mall_id, "bookshop").await.unwrap();
    assert_eq!(fetched.id, tenant.id);
}

#[tokio::test]
async fn list_tenants_by_mall() {
    let db = setup().await;
    let mall_repo = SurrealMallRepository::new(db.clone());
    let tenant_repo = SurrealTenantRepository::new(db);

    let mall1 = create_mall(&mall_repo, "list-mall-1").await;
    let mall2 = create_mall(&mall_repo, "list-mall-2").await;

    // Create 3 tenants under mall1 and 1 under mall2.
    for i in 0..3 {
        tenant_repo
            .create(CreateTenant {
                mall_id: mall1,
                name: format!("Tenant {i}"),
                slug: format!("t-{i}"),
                metadata: None,
            })
            .await
            .unwrap();
    }
    tenant_repo
        .create(CreateTenant {
            mall_id: mall2,
            name: "Other Tenant".into(),
            slug: "other".into(),
            metadata: None,
        })
        .await
        .unwrap();

    let list = tenant_repo
        .list_by_mall(mall1, Pagination::default())
        .await
        .unwrap();
    assert_eq!(list.total, 3);
    assert_eq!(list.items.len(), 3);

    let list2 = tenant_repo
        .list_by_mall(mall2, Pagination::default())
        .await
        .unwrap();
    assert_eq!(list2.total, 1);

    // The global listing spans both malls.
    let all = tenant_repo.list(Pagination::default()).await.unwrap();
    assert_eq!(all.total, 4);
}

#[tokio::test]
async fn delete_tenant() {
    let db = setup().await;
    let mall_repo = SurrealMallRepository::new(db.clone());
    let tenant_repo = SurrealTenantRepository::new(db);

    let mall_id = create_mall(&mall_repo, "del-tenant-mall").await;

    let tenant = tenant_repo
        .create(CreateTenant {
            mall_id,
            name: "Ephemeral".into(),
            slug: "ephemeral".into(),
            metadata: None,
        })
        .await
        .unwrap();

    tenant_repo.delete(tenant.id).await.unwrap();

    let result = tenant_repo.get_by_id(tenant.id).await;
    assert!(result.is_err(), "should not find deleted tenant");
}

#[tokio::test]
async fn update_tenant() {
    let db = setup().await;
    let mall_repo = SurrealMallRepository::new(db.clone());
    let tenant_repo = SurrealTenantRepository::new(db);

    let mall_id = create_mall(&mall_repo, "upd-tenant-mall").await;

    let tenant = tenant_repo
        .create(CreateTenant {
            mall_id,
            name: "Before".into(),
            slug: "upd-test".into(),
            metadata: None,
        })
        .await
        .unwrap();

    let updated = tenant_repo
        .update(
            tenant.id,
            mallops_core::models::tenant::UpdateTenant {
                name: Some("After".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "After");
    assert_eq!(updated.slug, "upd-test"); // unchanged
    assert!(updated.updated_at >= tenant.updated_at);
}
