//! Server configuration.
//!
//! Loaded from a TOML file with flag overrides applied by the binary.

use std::path::Path;

use anyhow::Context;
use mallops_access::AccessConfig;
use mallops_db::DbConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind (e.g., `127.0.0.1:8080`).
    pub listen: String,
    pub database: DbConfig,
    pub access: AccessSection,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".into(),
            database: DbConfig::default(),
            access: AccessSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccessSection {
    /// Cookie consulted when no bearer header is present.
    pub cookie_name: String,
}

impl Default for AccessSection {
    fn default() -> Self {
        Self {
            cookie_name: AccessConfig::default().cookie_name,
        }
    }
}

impl ServerConfig {
    /// Read the configuration file, or fall back to defaults when no path
    /// is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("failed to parse config {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn access_config(&self) -> AccessConfig {
        AccessConfig {
            cookie_name: self.access.cookie_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let config = ServerConfig::load(None).unwrap();
        assert_eq!(config.listen, "127.0.0.1:8080");
        assert_eq!(config.access.cookie_name, "accessToken");
    }

    #[test]
    fn parses_partial_toml() {
        let config: ServerConfig = toml::from_str(
            "listen = \"0.0.0.0:3001\"\n\
             [database]\n\
             endpoint = \"mem://\"\n",
        )
        .unwrap();
        assert_eq!(config.listen, "0.0.0.0:3001");
        assert_eq!(config.database.endpoint, "mem://");
        // Untouched sections keep their defaults.
        assert_eq!(config.database.namespace, "mallops");
        assert_eq!(config.access.cookie_name, "accessToken");
    }
}
