//! Configuration for the persistent cache

use crate::error::{Result, SparqlError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default cache directory when none is configured
pub const DEFAULT_CACHE_DIR: &str = ".cicerone-cache";

/// Configuration for the disk cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Root directory holding one record file per key
    pub root_dir: PathBuf,

    /// Time-to-live for cached records
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            ttl: Duration::from_secs(86400),
        }
    }
}

impl CacheConfig {
    /// Create a configuration from a root directory and a TTL string
    ///
    /// # Example
    /// ```
    /// use cicerone_sparql::cache::CacheConfig;
    ///
    /// let config = CacheConfig::new("/var/cache/cicerone", "12h").unwrap();
    /// assert_eq!(config.ttl.as_secs(), 12 * 3600);
    /// ```
    pub fn new(root_dir: impl Into<PathBuf>, ttl: &str) -> Result<Self> {
        Ok(Self {
            root_dir: root_dir.into(),
            ttl: parse_ttl(ttl)?,
        })
    }

    /// Create a configuration with an explicit TTL duration
    pub fn with_ttl(root_dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            root_dir: root_dir.into(),
            ttl,
        }
    }
}

/// Parse a compact TTL string of the form `<integer><unit>`
///
/// Units: `s` (seconds), `m` (minutes), `h` (hours), `d` (days), `w` (weeks).
/// Anything else fails with `ConfigError`.
///
/// # Example
/// ```
/// use cicerone_sparql::cache::parse_ttl;
/// use std::time::Duration;
///
/// assert_eq!(parse_ttl("90s").unwrap(), Duration::from_secs(90));
/// assert_eq!(parse_ttl("1w").unwrap(), Duration::from_secs(604800));
/// assert!(parse_ttl("5x").is_err());
/// ```
pub fn parse_ttl(input: &str) -> Result<Duration> {
    let input = input.trim();
    let mut chars = input.chars();

    let unit = chars
        .next_back()
        .ok_or_else(|| SparqlError::ConfigError("empty TTL string".to_string()))?;

    let magnitude: u64 = chars.as_str().parse().map_err(|_| {
        SparqlError::ConfigError(format!("invalid TTL magnitude in '{}'", input))
    })?;

    let unit_seconds = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3600,
        'd' => 86400,
        'w' => 604800,
        other => {
            return Err(SparqlError::ConfigError(format!(
                "unknown TTL unit '{}' in '{}'",
                other, input
            )))
        }
    };

    let seconds = magnitude.checked_mul(unit_seconds).ok_or_else(|| {
        SparqlError::ConfigError(format!("TTL '{}' is out of range", input))
    })?;

    Ok(Duration::from_secs(seconds))
}
