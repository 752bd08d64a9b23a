//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Ingestion limits.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Maximum accepted case-set archive size in bytes.
    #[serde(default = "default_max_archive_size")]
    pub max_archive_size: u64,
    /// Maximum accepted single software-package size in bytes.
    #[serde(default = "default_max_package_size")]
    pub max_package_size: u64,
    /// Maximum accepted batch-import archive size in bytes.
    #[serde(default = "default_max_import_archive_size")]
    pub max_import_archive_size: u64,
}

fn default_max_archive_size() -> u64 {
    crate::DEFAULT_MAX_ARCHIVE_SIZE
}

fn default_max_package_size() -> u64 {
    crate::DEFAULT_MAX_PACKAGE_SIZE
}

fn default_max_import_archive_size() -> u64 {
    crate::DEFAULT_MAX_IMPORT_ARCHIVE_SIZE
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_archive_size: default_max_archive_size(),
            max_package_size: default_max_package_size(),
            max_import_archive_size: default_max_import_archive_size(),
        }
    }
}

impl IngestConfig {
    /// Validate ingestion limits.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_archive_size == 0 {
            return Err("ingest.max_archive_size cannot be 0".to_string());
        }
        if self.max_package_size == 0 {
            return Err("ingest.max_package_size cannot be 0".to_string());
        }
        if self.max_import_archive_size == 0 {
            return Err("ingest.max_import_archive_size cannot be 0".to_string());
        }
        Ok(())
    }

    /// The largest request body the server must accept.
    pub fn max_body_size(&self) -> u64 {
        self.max_archive_size
            .max(self.max_package_size)
            .max(self.max_import_archive_size)
    }
}

/// Metadata store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetadataConfig {
    /// SQLite database (recommended for testing and small deployments only).
    Sqlite {
        /// Database file path.
        path: PathBuf,
    },
    /// PostgreSQL database.
    Postgres {
        /// Connection URL (optional if using individual fields).
        /// Takes precedence over individual fields if both are provided.
        url: Option<String>,
        /// Database host (e.g., "localhost" or "db.example.com").
        host: Option<String>,
        /// Database port (default: 5432).
        #[serde(default = "default_pg_port")]
        port: Option<u16>,
        /// Database username.
        username: Option<String>,
        /// Database password.
        /// WARNING: Prefer DIALCENTER_METADATA__PASSWORD env var over storing in config.
        password: Option<String>,
        /// Database name.
        database: Option<String>,
        /// Maximum connections in the pool.
        #[serde(default = "default_max_connections")]
        max_connections: u32,
    },
}

fn default_max_connections() -> u32 {
    10
}

fn default_pg_port() -> Option<u16> {
    Some(5432)
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/metadata.db"),
        }
    }
}

impl MetadataConfig {
    /// Validate metadata configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            MetadataConfig::Sqlite { .. } => Ok(()),
            MetadataConfig::Postgres {
                url,
                host,
                database,
                ..
            } => match (url.as_ref(), host.as_ref(), database.as_ref()) {
                (Some(_), _, _) => Ok(()),
                (None, Some(_), Some(_)) => Ok(()),
                (None, None, _) => Err(
                    "postgres config requires either 'url' or 'host' + 'database'".to_string(),
                ),
                (None, Some(_), None) => Err(
                    "postgres config requires 'database' when using individual fields".to_string(),
                ),
            },
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Ingestion limits.
    #[serde(default)]
    pub ingest: IngestConfig,
    /// Metadata store configuration.
    #[serde(default)]
    pub metadata: MetadataConfig,
}

impl AppConfig {
    /// Validate the full configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.ingest.validate()?;
        self.metadata.validate()?;
        Ok(())
    }
}
