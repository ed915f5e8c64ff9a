//! Metadata Resolution Demo
//!
//! Loads field definitions, then resolves label, metadata and images for one
//! subject.
//!
//! Usage:
//!   cargo run --example resolve_demo -- <subject-uri>
//!
//! Environment variables:
//!   SPARQL_ENDPOINT   - SPARQL endpoint URL (default: http://localhost:3030/ds/sparql)
//!   FIELD_DEFINITIONS - Path to the field definitions YAML (default: fields.yml)

use cicerone_sparql::{FieldRegistry, MetadataResolver, SparqlClient, NO_LANGUAGE};
use std::sync::Arc;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let endpoint = std::env::var("SPARQL_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:3030/ds/sparql".to_string());
    let definitions =
        std::env::var("FIELD_DEFINITIONS").unwrap_or_else(|_| "fields.yml".to_string());
    let subject = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://example.org/entity/object/123".to_string());

    info!("=== Metadata Resolution Demo ===");

    let client = SparqlClient::connect(&endpoint).await?;
    let registry = FieldRegistry::from_file(&definitions).await?;
    info!("Loaded {} field definitions", registry.len());

    let resolver = MetadataResolver::new(Arc::new(client), Arc::new(registry));

    info!("\n--- Label ---");
    match resolver.resolve_label(&subject).await {
        Ok(label) => info!("✓ {}", label),
        Err(e) => info!("✗ {}", e),
    }

    info!("\n--- Metadata ---");
    let metadata = resolver.resolve_metadata(&subject).await?;
    for entry in &metadata {
        let label = entry.label[NO_LANGUAGE].join(", ");
        let value = entry.value[NO_LANGUAGE].join(", ");
        info!("{}: {}", label, value);
    }

    info!("\n--- Images ---");
    let images = resolver.resolve_images(&subject).await?;
    for image in &images {
        info!("{} ({}x{})", image.image, image.width, image.height);
    }

    Ok(())
}
