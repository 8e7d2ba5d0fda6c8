//! SurrealDB connection management.
//!
//! Endpoints go through `engine::any`, so a `ws://` URL reaches a remote
//! server while `mem://` spins up the embedded engine (used by tests and
//! local development).

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use tracing::info;

/// Configuration for connecting to SurrealDB.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Endpoint URL (e.g., `ws://127.0.0.1:8000` or `mem://`).
    pub endpoint: String,
    /// SurrealDB namespace.
    pub namespace: String,
    /// SurrealDB database name.
    pub database: String,
    /// Root username for authentication (ignored for `mem://`).
    pub username: String,
    /// Root password for authentication (ignored for `mem://`).
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:8000".into(),
            namespace: "mallops".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

/// Manages a connection to SurrealDB.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Any>,
}

impl DbManager {
    /// Connect to SurrealDB using the provided configuration.
    ///
    /// Authenticates as root for remote endpoints, selects the configured
    /// namespace and database, and returns a ready-to-use manager.
    pub async fn connect(config: &DbConfig) -> Result<Self, surrealdb::Error> {
        info!(
            endpoint = %config.endpoint,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );

        let db = any::connect(&config.endpoint).await?;

        // The embedded engine has no root user to sign in as.
        if !config.endpoint.starts_with("mem:") {
            db.signin(Root {
                username: config.username.clone(),
                password: config.password.clone(),
            })
            .await?;
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        info!("Successfully connected to SurrealDB");

        Ok(Self { db })
    }

    /// Returns a reference to the underlying SurrealDB client.
    pub fn client(&self) -> &Surreal<Any> {
        &self.db
    }
}
