//! Endpoint Probe Demo
//!
//! Connects to a SPARQL endpoint and reports liveness and round-trip time.
//!
//! Usage:
//!   cargo run --example probe_demo
//!
//! Environment variables:
//!   SPARQL_ENDPOINT - SPARQL endpoint URL (default: http://localhost:3030/ds/sparql)

use cicerone_sparql::{QueryExecutor, SparqlClient};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let endpoint = std::env::var("SPARQL_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:3030/ds/sparql".to_string());

    info!("=== SPARQL Endpoint Probe Demo ===");
    info!("Connecting to {}", endpoint);

    let client = SparqlClient::connect(&endpoint).await?;

    let result = client.probe().await;
    if result.healthy {
        info!("✓ Endpoint is healthy ({}ms)", result.response_time_ms);
    } else {
        info!(
            "✗ Endpoint is unhealthy: {}",
            result.error.unwrap_or_else(|| "unknown error".to_string())
        );
    }

    Ok(())
}
