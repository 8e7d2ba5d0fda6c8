//! SurrealDB implementation of [`UserRepository`].

use chrono::{DateTime, Utc};
use mallops_core::error::MallopsResult;
use mallops_core::models::user::{CreateUser, UpdateUser, User, UserRole, UserStatus};
use mallops_core::repository::UserRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    mall_id: Option<String>,
    tenant_id: Option<String>,
    username: String,
    email: String,
    role: String,
    status: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    mall_id: Option<String>,
    tenant_id: Option<String>,
    username: String,
    email: String,
    role: String,
    status: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_role(s: &str) -> Result<UserRole, DbError> {
    match s {
        "SUPER_ADMIN" => Ok(UserRole::SuperAdmin),
        "MALL_ADMIN" => Ok(UserRole::MallAdmin),
        "TENANT_ADMIN" => Ok(UserRole::TenantAdmin),
        "TENANT_USER" => Ok(UserRole::TenantUser),
        other => Err(DbError::Migration(format!("unknown user role: {other}"))),
    }
}

fn role_to_string(role: UserRole) -> &'static str {
    match role {
        UserRole::SuperAdmin => "SUPER_ADMIN",
        UserRole::MallAdmin => "MALL_ADMIN",
        UserRole::TenantAdmin => "TENANT_ADMIN",
        UserRole::TenantUser => "TENANT_USER",
    }
}

fn parse_status(s: &str) -> Result<UserStatus, DbError> {
    match s {
        "Active" => Ok(UserStatus::Active),
        "Inactive" => Ok(UserStatus::Inactive),
        other => Err(DbError::Migration(format!("unknown user status: {other}"))),
    }
}

fn status_to_string(status: UserStatus) -> &'static str {
    match status {
        UserStatus::Active => "Active",
        UserStatus::Inactive => "Inactive",
    }
}

fn parse_opt_uuid(value: Option<String>, what: &str) -> Result<Option<Uuid>, DbError> {
    value
        .map(|s| {
            Uuid::parse_str(&s)
                .map_err(|e| DbError::Migration(format!("invalid {what} UUID: {e}")))
        })
        .transpose()
}

impl UserRow {
    fn into_user(self, id: Uuid) -> Result<User, DbError> {
        Ok(User {
            id,
            mall_id: parse_opt_uuid(self.mall_id, "mall")?,
            tenant_id: parse_opt_uuid(self.tenant_id, "tenant")?,
            username: self.username,
            email: self.email,
            role: parse_role(&self.role)?,
            status: parse_status(&self.status)?,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(User {
            id,
            mall_id: parse_opt_uuid(self.mall_id, "mall")?,
            tenant_id: parse_opt_uuid(self.tenant_id, "tenant")?,
            username: self.username,
            email: self.email,
            role: parse_role(&self.role)?,
            status: parse_status(&self.status)?,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> MallopsResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let metadata = input
            .metadata
            .unwrap_or(serde_json::Value::Object(Default::default()));

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 mall_id = $mall_id, \
                 tenant_id = $tenant_id, \
                 username = $username, \
                 email = $email, \
                 role = $role, \
                 status = 'Active', \
                 metadata = $metadata",
            )
            .bind(("id", id_str.clone()))
            .bind(("mall_id", input.mall_id.map(|m| m.to_string())))
            .bind(("tenant_id", input.tenant_id.map(|t| t.to_string())))
            .bind(("username", input.username))
            .bind(("email", input.email))
            .bind(("role", role_to_string(input.role)))
            .bind(("metadata", metadata))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> MallopsResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateUser) -> MallopsResult<User> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.username.is_some() {
            sets.push("username = $username");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.role.is_some() {
            sets.push("role = $role");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.metadata.is_some() {
            sets.push("metadata = $metadata");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('user', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(username) = input.username {
            builder = builder.bind(("username", username));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(role) = input.role {
            builder = builder.bind(("role", role_to_string(role)));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status_to_string(status)));
        }
        if let Some(metadata) = input.metadata {
            builder = builder.bind(("metadata", metadata));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn list_by_tenant(&self, tenant_id: Uuid) -> MallopsResult<Vec<User>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE tenant_id = $tenant_id \
                 ORDER BY created_at ASC",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
