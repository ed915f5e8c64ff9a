//! Service configuration
//!
//! The service is configured from a YAML file plus the environment. File
//! shape:
//!
//! ```yaml
//! field_definitions_file: fields.yml
//! cache:
//!   expiration: 1d
//!   directory: .cicerone-cache
//! namespaces:
//!   entities: "https://example.org/entity/"
//!   manifests: "https://example.org/manifest/"
//! queries:
//!   thumbnails: |
//!     SELECT ?image ?width ?height WHERE { ... }
//! rights:
//!   license_query: |
//!     SELECT ?value WHERE { ... }
//! options:
//!   image_metadata: false
//! ```
//!
//! Relative paths are resolved against the directory containing the config
//! file. The SPARQL endpoint is not part of the file; it comes from the CLI
//! or the `SPARQL_ENDPOINT` environment variable.

use crate::error::{Result, ServiceError};
use cicerone_sparql::cache::config::DEFAULT_CACHE_DIR;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Top-level service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Field definitions file the registry is loaded from
    pub field_definitions_file: PathBuf,

    #[serde(default)]
    pub cache: CacheSettings,

    pub namespaces: NamespaceSettings,

    #[serde(default)]
    pub queries: QuerySettings,

    #[serde(default)]
    pub rights: RightsSettings,

    #[serde(default)]
    pub options: OptionSettings,
}

/// Cache block: TTL string and storage directory
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub expiration: String,
    pub directory: PathBuf,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            expiration: "1d".to_string(),
            directory: PathBuf::from(DEFAULT_CACHE_DIR),
        }
    }
}

/// Base URIs under which subjects and manifest ids are minted
#[derive(Debug, Clone, Deserialize)]
pub struct NamespaceSettings {
    pub entities: String,
    pub manifests: String,
}

/// Optional query template overrides
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    pub label: Option<String>,
    pub images: Option<String>,
    /// No thumbnails are resolved unless this template is set
    pub thumbnails: Option<String>,
}

/// Optional rights facets; an absent facet is simply skipped
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RightsSettings {
    pub license_query: Option<String>,
    pub required_statement_query: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OptionSettings {
    /// Aggregate field metadata for every image subject as well
    pub image_metadata: bool,
}

impl ServiceConfig {
    /// Parse a configuration from YAML source
    pub fn from_yaml(source: &str) -> Result<Self> {
        serde_yaml::from_str(source)
            .map_err(|e| ServiceError::Config(format!("malformed service configuration: {}", e)))
    }

    /// Load the configuration from a YAML file
    ///
    /// Relative `field_definitions_file` and `cache.directory` entries are
    /// resolved against the config file's directory, so the service can be
    /// started from anywhere.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading service configuration from {}", path.display());

        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ServiceError::Config(format!("cannot read {}: {}", path.display(), e)))?;

        let mut config = Self::from_yaml(&source)?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.field_definitions_file = resolve(base, &config.field_definitions_file);
        config.cache.directory = resolve(base, &config.cache.directory);

        Ok(config)
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
