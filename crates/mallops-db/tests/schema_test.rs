//! Migration runner behavior against in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use surrealdb_types::SurrealValue;

#[derive(Debug, SurrealValue)]
struct MigrationRow {
    version: u32,
    name: String,
}

#[tokio::test]
async fn migrations_apply_and_are_recorded() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    mallops_db::run_migrations(&db).await.unwrap();

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version ASC")
        .await
        .unwrap();
    let rows: Vec<MigrationRow> = result.take(0).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].version, 1);
    assert_eq!(rows[0].name, "initial_schema");
}

#[tokio::test]
async fn rerunning_migrations_is_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    mallops_db::run_migrations(&db).await.unwrap();
    mallops_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("SELECT * FROM _migration").await.unwrap();
    let rows: Vec<MigrationRow> = result.take(0).unwrap();
    assert_eq!(rows.len(), 1, "re-running must not re-record migrations");
}

#[tokio::test]
async fn schema_rejects_invalid_enum_values() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    mallops_db::run_migrations(&db).await.unwrap();

    // The status ASSERT constraint rejects values outside the enum.
    let result = db
        .query(
            "CREATE work_permit SET \
             permit_number = 'WP-X', mall_id = 'm', tenant_id = 't', \
             permit_type = 'hot_work', risk_level = 'high', \
             category = 'maintenance', work_description = 'x', \
             start_date = time::now(), end_date = time::now(), \
             status = 'NOT_A_STATUS', created_by = 'u'",
        )
        .await
        .unwrap()
        .check();

    assert!(result.is_err(), "invalid status value should be rejected");
}
