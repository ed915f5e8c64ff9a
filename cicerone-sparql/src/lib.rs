//! # cicerone-sparql
//!
//! A SPARQL client library with field-driven metadata resolution and a
//! persistent expiring cache.
//!
//! ## Features
//!
//! - Async-first SPARQL 1.1 Protocol client with a construction-time
//!   connectivity probe
//! - Declarative field definitions (YAML) with namespace-prefix tables and
//!   display-order filtering
//! - Query templates with subject substitution in both historical spellings
//! - Metadata aggregation with request-scoped label memoization
//! - Disk-persisted memoization with TTL expiration, checked lazily on lookup
//!
//! ## Connecting and resolving
//!
//! ```no_run
//! use cicerone_sparql::{FieldRegistry, MetadataResolver, SparqlClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = SparqlClient::connect("http://localhost:3030/ds/sparql").await?;
//!     let registry = FieldRegistry::from_file("fields.yml").await?;
//!
//!     let resolver = MetadataResolver::new(Arc::new(client), Arc::new(registry));
//!
//!     let subject = "https://example.org/entity/object/123";
//!     let label = resolver.resolve_label(subject).await?;
//!     let metadata = resolver.resolve_metadata(subject).await?;
//!
//!     println!("{}: {} metadata entries", label, metadata.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Caching
//!
//! ```no_run
//! use cicerone_sparql::cache::{CacheConfig, CacheKeyBuilder, DiskCache};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cache = DiskCache::new(CacheConfig::new(".cache", "1d")?)?;
//!
//!     let key = CacheKeyBuilder::new("label")
//!         .arg("subject", "https://example.org/entity/object/123")
//!         .build();
//!
//!     let label: String = cache
//!         .get_or_compute(&key, || async {
//!             // expensive remote lookup goes here
//!             Ok("Mona Lisa".to_string())
//!         })
//!         .await?;
//!
//!     println!("{}", label);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod connection;
pub mod error;
pub mod fields;
pub mod resolver;
pub mod template;

// Re-export main types for convenience
pub use cache::{parse_ttl, CacheConfig, CacheKey, CacheKeyBuilder, CacheStats, DiskCache};
pub use connection::{ProbeResult, QueryExecutor, ResultRow, SparqlClient, PROBE_QUERY};
pub use error::{Result, SparqlError};
pub use fields::{FieldDatatype, FieldDefinition, FieldRegistry};
pub use resolver::{
    ImageDescriptor, LanguageMap, MetadataEntry, MetadataResolver, ThumbnailDescriptor,
    NO_LANGUAGE,
};
pub use template::NamespaceTable;
