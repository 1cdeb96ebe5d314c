//! Configuration for recall-memory

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// User id every memory operation is scoped to
pub const DEFAULT_USER_ID: &str = "user";

/// Configuration for the memory system
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file holding memory records
    pub database_path: PathBuf,

    /// Fixed single-tenant user id
    pub user_id: String,

    /// Embedding model name (for reference, actual model set in embedding.rs)
    pub embedding_model: String,

    /// Embedding dimensions (384 for all-MiniLM-L6-v2)
    pub embedding_dimensions: usize,

    /// Default result count for search requests that do not give one
    pub default_search_limit: usize,

    /// HTTP server bind host
    pub server_host: String,

    /// HTTP server port
    pub server_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        let database_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("recall")
            .join("memories.db");

        Self {
            database_path,
            user_id: DEFAULT_USER_ID.to_string(),
            embedding_model: "all-MiniLM-L6-v2".to_string(),
            embedding_dimensions: 384,
            default_search_limit: 3,
            server_host: "0.0.0.0".to_string(),
            server_port: 8050,
        }
    }
}

impl Config {
    /// Create a new config with a custom database file
    pub fn with_database_path(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            ..Default::default()
        }
    }

    /// Create a config from a `DATABASE_URL`-style connection string
    pub fn from_database_url(url: &str) -> Result<Self> {
        Ok(Self::with_database_path(Self::database_path_from_url(url)?))
    }

    /// Resolve a connection string to a SQLite file path.
    ///
    /// Accepts `sqlite://path`, `sqlite:path` or a bare path. Any other
    /// scheme (e.g. `postgresql://`) is rejected.
    pub fn database_path_from_url(url: &str) -> Result<PathBuf> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::config("database URL is empty"));
        }

        if let Some(rest) = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
        {
            if rest.is_empty() {
                return Err(Error::config(format!("database URL has no path: {url}")));
            }
            return Ok(PathBuf::from(rest));
        }

        if let Some((scheme, _)) = url.split_once("://") {
            return Err(Error::config(format!(
                "unsupported database scheme '{scheme}': only sqlite is supported"
            )));
        }

        Ok(PathBuf::from(url))
    }

    /// Address the HTTP server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Ensure the database directory exists
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        if let Some(parent) = self.database_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }
}
