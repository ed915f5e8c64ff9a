//! # Persistent Expiring Cache
//!
//! Disk-backed memoization for deterministic, keyable operations (label
//! lookups, metadata aggregation, whole-document assembly).
//!
//! ## Features
//!
//! - **Explicit keys**: [`CacheKeyBuilder`] derives a key from an operation
//!   name plus ordered, named arguments; the storage identifier is the
//!   SHA-256 digest of the canonical key string
//! - **Durable records**: one file per key under a configured root directory
//! - **Lazy TTL expiration**: a lookup whose record is older than the TTL
//!   deletes the record and reports a miss; there is no background sweep
//! - **Runtime reconfiguration**: [`DiskCache::set_expiration`] changes the
//!   TTL for future lookups
//! - **Maintenance**: [`DiskCache::purge_expired`] and [`DiskCache::clear`]
//!   reclaim storage on demand
//!
//! ## Example
//!
//! ```no_run
//! use cicerone_sparql::cache::{CacheConfig, CacheKeyBuilder, DiskCache};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let cache = DiskCache::new(CacheConfig::new(".cache", "1d")?)?;
//!
//! let key = CacheKeyBuilder::new("manifest")
//!     .arg("item_type", "object")
//!     .arg("id", "123")
//!     .build();
//!
//! cache.put(&key, "serialized document").await?;
//! if let Some(value) = cache.get(&key).await? {
//!     println!("Cache hit: {}", value);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod key;
pub mod store;

pub use config::{parse_ttl, CacheConfig};
pub use key::{CacheKey, CacheKeyBuilder};
pub use store::{CacheStats, DiskCache};
