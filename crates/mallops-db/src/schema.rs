//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Malls (global scope)
-- =======================================================================
DEFINE TABLE mall SCHEMAFULL;
DEFINE FIELD name ON TABLE mall TYPE string;
DEFINE FIELD slug ON TABLE mall TYPE string;
DEFINE FIELD metadata ON TABLE mall TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE mall TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE mall TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_mall_slug ON TABLE mall COLUMNS slug UNIQUE;

-- =======================================================================
-- Tenants (scoped to mall)
-- =======================================================================
DEFINE TABLE tenant SCHEMAFULL;
DEFINE FIELD mall_id ON TABLE tenant TYPE string;
DEFINE FIELD name ON TABLE tenant TYPE string;
DEFINE FIELD slug ON TABLE tenant TYPE string;
DEFINE FIELD metadata ON TABLE tenant TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tenant_mall_slug ON TABLE tenant \
    COLUMNS mall_id, slug UNIQUE;

-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD mall_id ON TABLE user TYPE option<string>;
DEFINE FIELD tenant_id ON TABLE user TYPE option<string>;
DEFINE FIELD username ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD role ON TABLE user TYPE string \
    ASSERT $value IN ['SUPER_ADMIN', 'MALL_ADMIN', 'TENANT_ADMIN', \
    'TENANT_USER'];
DEFINE FIELD status ON TABLE user TYPE string \
    ASSERT $value IN ['Active', 'Inactive'];
DEFINE FIELD metadata ON TABLE user TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_username ON TABLE user COLUMNS username UNIQUE;
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;
DEFINE INDEX idx_user_tenant ON TABLE user COLUMNS tenant_id;

-- =======================================================================
-- Sessions (issued externally, resolved here)
-- =======================================================================
DEFINE TABLE session SCHEMAFULL;
DEFINE FIELD user_id ON TABLE session TYPE string;
DEFINE FIELD token_hash ON TABLE session TYPE string;
DEFINE FIELD ip_address ON TABLE session TYPE option<string>;
DEFINE FIELD user_agent ON TABLE session TYPE option<string>;
DEFINE FIELD expires_at ON TABLE session TYPE datetime;
DEFINE FIELD created_at ON TABLE session TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_session_token ON TABLE session \
    COLUMNS token_hash UNIQUE;
DEFINE INDEX idx_session_user ON TABLE session COLUMNS user_id;

-- =======================================================================
-- Work permits (scoped to mall and tenant)
-- =======================================================================
DEFINE TABLE work_permit SCHEMAFULL;
DEFINE FIELD permit_number ON TABLE work_permit TYPE string;
DEFINE FIELD mall_id ON TABLE work_permit TYPE string;
DEFINE FIELD tenant_id ON TABLE work_permit TYPE string;
DEFINE FIELD permit_type ON TABLE work_permit TYPE string;
DEFINE FIELD risk_level ON TABLE work_permit TYPE string;
DEFINE FIELD category ON TABLE work_permit TYPE string;
DEFINE FIELD work_description ON TABLE work_permit TYPE string;
DEFINE FIELD start_date ON TABLE work_permit TYPE datetime;
DEFINE FIELD end_date ON TABLE work_permit TYPE datetime;
DEFINE FIELD status ON TABLE work_permit TYPE string \
    ASSERT $value IN ['PENDING_APPROVAL', 'APPROVED', 'ACTIVE', \
    'COMPLETED', 'REJECTED', 'CANCELLED'];
DEFINE FIELD attachments ON TABLE work_permit TYPE array DEFAULT [];
DEFINE FIELD attachments.* ON TABLE work_permit TYPE object FLEXIBLE;
DEFINE FIELD comments ON TABLE work_permit TYPE array DEFAULT [];
DEFINE FIELD comments.* ON TABLE work_permit TYPE object FLEXIBLE;
DEFINE FIELD violations ON TABLE work_permit TYPE array DEFAULT [];
DEFINE FIELD violations.* ON TABLE work_permit TYPE object FLEXIBLE;
DEFINE FIELD created_by ON TABLE work_permit TYPE string;
DEFINE FIELD created_at ON TABLE work_permit TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE work_permit TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_permit_number ON TABLE work_permit \
    COLUMNS permit_number UNIQUE;
DEFINE INDEX idx_permit_mall_status ON TABLE work_permit \
    COLUMNS mall_id, status;
DEFINE INDEX idx_permit_tenant ON TABLE work_permit COLUMNS tenant_id;

-- =======================================================================
-- Workflows and task instances
-- =======================================================================
DEFINE TABLE workflow SCHEMAFULL;
DEFINE FIELD workflow_type ON TABLE workflow TYPE string;
DEFINE FIELD created_by ON TABLE workflow TYPE string;
DEFINE FIELD data ON TABLE workflow TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD status ON TABLE workflow TYPE string \
    ASSERT $value IN ['pending', 'in_progress', 'approved', 'rejected', \
    'completed', 'cancelled'];
DEFINE FIELD created_at ON TABLE workflow TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE workflow TYPE datetime \
    DEFAULT time::now();

DEFINE TABLE task_instance SCHEMAFULL;
DEFINE FIELD workflow_id ON TABLE task_instance TYPE string;
DEFINE FIELD assigned_to ON TABLE task_instance TYPE string;
DEFINE FIELD step ON TABLE task_instance TYPE string;
DEFINE FIELD status ON TABLE task_instance TYPE string \
    ASSERT $value IN ['pending', 'in_progress', 'approved', 'rejected', \
    'completed', 'cancelled'];
DEFINE FIELD comment ON TABLE task_instance TYPE option<string>;
DEFINE FIELD created_at ON TABLE task_instance TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE task_instance TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_task_workflow ON TABLE task_instance \
    COLUMNS workflow_id;

-- =======================================================================
-- Notifications and per-user read tracking
-- =======================================================================
DEFINE TABLE notification SCHEMAFULL;
DEFINE FIELD title ON TABLE notification TYPE string;
DEFINE FIELD body ON TABLE notification TYPE string;
DEFINE FIELD kind ON TABLE notification TYPE string;
DEFINE FIELD created_by ON TABLE notification TYPE string;
DEFINE FIELD created_at ON TABLE notification TYPE datetime \
    DEFAULT time::now();

DEFINE TABLE notification_recipient SCHEMAFULL;
DEFINE FIELD notification_id ON TABLE notification_recipient TYPE string;
DEFINE FIELD user_id ON TABLE notification_recipient TYPE string;
DEFINE FIELD tenant_id ON TABLE notification_recipient \
    TYPE option<string>;
DEFINE FIELD is_read ON TABLE notification_recipient TYPE bool \
    DEFAULT false;
DEFINE FIELD read_at ON TABLE notification_recipient \
    TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE notification_recipient TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_recipient_notification_user \
    ON TABLE notification_recipient \
    COLUMNS notification_id, user_id UNIQUE;
DEFINE INDEX idx_recipient_user ON TABLE notification_recipient \
    COLUMNS user_id;

-- =======================================================================
-- Audit Log (append-only)
-- =======================================================================
DEFINE TABLE audit_log SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD mall_id ON TABLE audit_log TYPE option<string>;
DEFINE FIELD actor_id ON TABLE audit_log TYPE string;
DEFINE FIELD action ON TABLE audit_log TYPE string;
DEFINE FIELD resource_id ON TABLE audit_log TYPE option<string>;
DEFINE FIELD outcome ON TABLE audit_log TYPE string \
    ASSERT $value IN ['Success', 'Failure', 'Denied'];
DEFINE FIELD metadata ON TABLE audit_log TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD timestamp ON TABLE audit_log TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_audit_time ON TABLE audit_log COLUMNS timestamp;
DEFINE INDEX idx_audit_actor ON TABLE audit_log COLUMNS actor_id;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
