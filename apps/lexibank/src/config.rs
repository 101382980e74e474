//! # Configuration
//!
//! `lexibank.toml` settings. Every field has a default, so an empty or
//! missing file is a valid configuration.
//!
//! ```toml
//! [storage]
//! database = "lexibank.db"
//! backend = "redb"        # or "file"
//! chunk_size = 200
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [review]
//! grid_columns = 5
//! ```
//!
//! Lookup order: `--config`, then `LEXIBANK_CONFIG`, then `./lexibank.toml`.
//! Command-line flags override file values.

use lexibank_core::LexiError;
use lexibank_core::chunking::validate_chunk_size;
use lexibank_core::primitives::{DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "lexibank.toml";

/// Maximum config file size.
const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

// =============================================================================
// SECTIONS
// =============================================================================

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub server: ServerConfig,
    pub review: ReviewConfig,
}

/// `[storage]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Database path: a redb file or a snapshot file, per `backend`.
    pub database: PathBuf,
    /// "redb" (ACID database) or "file" (snapshot file loaded into memory)
    pub backend: String,
    /// Items per chunk for stored collections.
    pub chunk_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("lexibank.db"),
            backend: "redb".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// `[server]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// `[review]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReviewConfig {
    /// Cells per row in grid review.
    pub grid_columns: usize,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self { grid_columns: 5 }
    }
}

// =============================================================================
// LOADING
// =============================================================================

impl AppConfig {
    /// Parse and validate TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, LexiError> {
        let config: AppConfig = toml::from_str(text)
            .map_err(|e| LexiError::InvalidConfig(format!("config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration.
    ///
    /// An explicitly named file must exist. The default file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, LexiError> {
        let from_env = std::env::var("LEXIBANK_CONFIG")
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        let path = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => path,
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    tracing::debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                default
            }
        };

        Self::from_file(&path)
    }

    /// Read and parse a config file.
    pub fn from_file(path: &Path) -> Result<Self, LexiError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            LexiError::InvalidConfig(format!("cannot read '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(LexiError::InvalidConfig(format!(
                "config file '{}' exceeds {} bytes",
                path.display(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            LexiError::InvalidConfig(format!("cannot read '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), LexiError> {
        match self.storage.backend.as_str() {
            "redb" | "file" => {}
            other => {
                return Err(LexiError::InvalidConfig(format!(
                    "Unknown backend: {}. Use: redb, file",
                    other
                )));
            }
        }
        validate_chunk_size(self.storage.chunk_size)?;
        if self.review.grid_columns == 0 || self.review.grid_columns > MAX_CHUNK_SIZE {
            return Err(LexiError::InvalidConfig(format!(
                "grid_columns must be 1..={}, got {}",
                MAX_CHUNK_SIZE, self.review.grid_columns
            )));
        }
        Ok(())
    }

    /// Apply command-line overrides, then re-validate.
    pub fn with_overrides(
        mut self,
        database: Option<PathBuf>,
        backend: Option<String>,
    ) -> Result<Self, LexiError> {
        if let Some(database) = database {
            self.storage.database = database;
        }
        if let Some(backend) = backend {
            self.storage.backend = backend;
        }
        self.validate()?;
        Ok(self)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::from_toml_str("").expect("parse");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.storage.backend, "redb");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [storage]
            backend = "file"

            [review]
            grid_columns = 8
            "#,
        )
        .expect("parse");

        assert_eq!(config.storage.backend, "file");
        assert_eq!(config.storage.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.review.grid_columns, 8);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(AppConfig::from_toml_str("[storage]\nchunks = 3\n").is_err());
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(AppConfig::from_toml_str("[storage]\nbackend = \"sqlite\"\n").is_err());
        assert!(AppConfig::from_toml_str("[storage]\nchunk_size = 0\n").is_err());
        assert!(AppConfig::from_toml_str("[review]\ngrid_columns = 0\n").is_err());
    }

    #[test]
    fn overrides_win() {
        let config = AppConfig::default()
            .with_overrides(Some(PathBuf::from("other.db")), Some("file".to_string()))
            .expect("overrides");
        assert_eq!(config.storage.database, PathBuf::from("other.db"));
        assert_eq!(config.storage.backend, "file");
        assert!(
            AppConfig::default()
                .with_overrides(None, Some("nope".to_string()))
                .is_err()
        );
    }

    #[test]
    fn reads_file_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("lexibank.toml");
        std::fs::write(&path, "[server]\nport = 9090\n").expect("write");

        let config = AppConfig::load(Some(&path)).expect("load");
        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(AppConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
