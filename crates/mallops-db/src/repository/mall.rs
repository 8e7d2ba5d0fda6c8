//! SurrealDB implementation of [`MallRepository`].

use chrono::{DateTime, Utc};
use mallops_core::error::MallopsResult;
use mallops_core::models::mall::{CreateMall, Mall, UpdateMall};
use mallops_core::repository::{MallRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct MallRow {
    name: String,
    slug: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MallRow {
    fn into_mall(self, id: Uuid) -> Mall {
        Mall {
            id,
            name: self.name,
            slug: self.slug,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct MallRowWithId {
    record_id: String,
    name: String,
    slug: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MallRowWithId {
    fn try_into_mall(self) -> Result<Mall, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(Mall {
            id,
            name: self.name,
            slug: self.slug,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Mall repository.
#[derive(Clone)]
pub struct SurrealMallRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealMallRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> MallRepository for SurrealMallRepository<C> {
    async fn create(&self, input: CreateMall) -> MallopsResult<Mall> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let metadata = input
            .metadata
            .unwrap_or(serde_json::Value::Object(Default::default()));

        let result = self
            .db
            .query(
                "CREATE type::record('mall', $id) SET \
                 name = $name, slug = $slug, metadata = $metadata",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("slug", input.slug))
            .bind(("metadata", metadata))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<MallRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "mall".into(),
            id: id_str,
        })?;

        Ok(row.into_mall(id))
    }

    async fn get_by_id(&self, id: Uuid) -> MallopsResult<Mall> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('mall', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MallRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "mall".into(),
            id: id_str,
        })?;

        Ok(row.into_mall(id))
    }

    async fn get_by_slug(&self, slug: &str) -> MallopsResult<Mall> {
        let slug_owned = slug.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM mall \
                 WHERE slug = $slug",
            )
            .bind(("slug", slug_owned))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MallRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "mall".into(),
            id: format!("slug={slug}"),
        })?;

        Ok(row.try_into_mall()?)
    }

    async fn update(&self, id: Uuid, input: UpdateMall) -> MallopsResult<Mall> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.slug.is_some() {
            sets.push("slug = $slug");
        }
        if input.metadata.is_some() {
            sets.push("metadata = $metadata");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('mall', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(slug) = input.slug {
            builder = builder.bind(("slug", slug));
        }
        if let Some(metadata) = input.metadata {
            builder = builder.bind(("metadata", metadata));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<MallRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "mall".into(),
            id: id_str,
        })?;

        Ok(row.into_mall(id))
    }

    async fn delete(&self, id: Uuid) -> MallopsResult<()> {
        self.db
            .query("DELETE type::record('mall', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> MallopsResult<PaginatedResult<Mall>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM mall GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM mall \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MallRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_mall())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
