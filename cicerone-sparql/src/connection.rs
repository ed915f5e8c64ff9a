//! SPARQL endpoint connection management and query execution
//!
//! This module provides the main client for talking to a SPARQL endpoint over
//! the SPARQL 1.1 Protocol (HTTP POST, JSON results), including the liveness
//! probe run at construction time and an on-demand endpoint probe for health
//! reporting.

use crate::error::{Result, SparqlError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info};

/// Trivial query used to validate endpoint liveness
pub const PROBE_QUERY: &str = "SELECT ?s ?p ?o WHERE { ?s ?p ?o } LIMIT 1";

const RESULTS_MEDIA_TYPE: &str = "application/sparql-results+json";

/// One result row: bound variable name -> string value
///
/// By convention a field query binds its result to a variable named `value`
/// and may additionally bind a `label` variable when the query itself already
/// resolves a human-readable form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultRow {
    bindings: HashMap<String, String>,
}

impl ResultRow {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable binding (builder style, mainly for tests and fixtures)
    pub fn bind(mut self, var: impl Into<String>, value: impl Into<String>) -> Self {
        self.bindings.insert(var.into(), value.into());
        self
    }

    /// Get the value bound to a variable
    pub fn get(&self, var: &str) -> Option<&str> {
        self.bindings.get(var).map(|s| s.as_str())
    }

    /// The conventional `value` binding
    pub fn value(&self) -> Option<&str> {
        self.get("value")
    }

    /// The conventional `label` binding
    pub fn label(&self) -> Option<&str> {
        self.get("label")
    }

    /// Number of bound variables in this row
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// True if the row has no bindings
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// SPARQL 1.1 Query Results JSON payload, reduced to what the client consumes
#[derive(Debug, Deserialize)]
struct SparqlResults {
    results: SparqlBindings,
}

#[derive(Debug, Deserialize)]
struct SparqlBindings {
    bindings: Vec<HashMap<String, SparqlTerm>>,
}

/// An RDF term in the results payload; only the lexical value is kept
#[derive(Debug, Deserialize)]
struct SparqlTerm {
    value: String,
}

/// Outcome of an endpoint probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Whether the probe query succeeded
    pub healthy: bool,
    /// Round-trip time in milliseconds
    pub response_time_ms: u64,
    /// Timestamp of the probe
    pub timestamp: DateTime<Utc>,
    /// Error message (if unhealthy)
    pub error: Option<String>,
}

/// Query execution capability
///
/// The metadata resolver works against this trait rather than the concrete
/// client, so resolution logic can be exercised with a canned executor.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Execute a rendered query and return its result rows
    async fn execute(&self, query: &str) -> Result<Vec<ResultRow>>;

    /// Probe endpoint liveness on demand
    ///
    /// Never fails; an unreachable endpoint is reported as an unhealthy result
    /// carrying the error message. Suitable for health routes and dashboards.
    async fn probe(&self) -> ProbeResult {
        debug!("Probing endpoint");
        let start = Instant::now();

        match self.execute(PROBE_QUERY).await {
            Ok(_) => ProbeResult {
                healthy: true,
                response_time_ms: start.elapsed().as_millis() as u64,
                timestamp: Utc::now(),
                error: None,
            },
            Err(e) => ProbeResult {
                healthy: false,
                response_time_ms: start.elapsed().as_millis() as u64,
                timestamp: Utc::now(),
                error: Some(e.to_string()),
            },
        }
    }
}

/// SPARQL endpoint client
pub struct SparqlClient {
    endpoint: String,
    http: reqwest::Client,
}

impl SparqlClient {
    /// Connect to a SPARQL endpoint
    ///
    /// Connectivity is validated once with a trivial probe query; construction
    /// fails with `ConnectionError` if the probe fails.
    ///
    /// # Arguments
    /// * `endpoint` - SPARQL endpoint URL (e.g., "http://localhost:3030/ds/sparql")
    ///
    /// # Example
    /// ```no_run
    /// use cicerone_sparql::SparqlClient;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let client = SparqlClient::connect("http://localhost:3030/ds/sparql").await?;
    ///     println!("Connected to {}", client.endpoint());
    ///     Ok(())
    /// }
    /// ```
    pub async fn connect(endpoint: &str) -> Result<Self> {
        info!("Connecting to SPARQL endpoint at {}", endpoint);

        let client = Self {
            endpoint: endpoint.to_string(),
            http: reqwest::Client::new(),
        };

        client
            .run_query(PROBE_QUERY)
            .await
            .map_err(|e| SparqlError::ConnectionError(format!("endpoint probe failed: {}", e)))?;

        info!("Successfully connected to SPARQL endpoint");
        Ok(client)
    }

    /// The endpoint address this client talks to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Execute a rendered query against the endpoint
    ///
    /// # Returns
    /// * `Ok(rows)` - zero or more result rows
    /// * `Err(SparqlError::QueryError)` - on transport failure, a non-success
    ///   HTTP status, or an unparseable result payload
    pub async fn execute(&self, query: &str) -> Result<Vec<ResultRow>> {
        debug!("Executing query ({} bytes)", query.len());

        let rows = self.run_query(query).await?;

        debug!("Query returned {} rows", rows.len());
        Ok(rows)
    }

    async fn run_query(&self, query: &str) -> Result<Vec<ResultRow>> {
        let response = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, RESULTS_MEDIA_TYPE)
            .form(&[("query", query)])
            .send()
            .await
            .map_err(|e| SparqlError::QueryError(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SparqlError::QueryError(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(SparqlError::QueryError(format!(
                "endpoint returned {}: {}",
                status,
                excerpt(&body)
            )));
        }

        parse_results(&body)
    }
}

#[async_trait]
impl QueryExecutor for SparqlClient {
    async fn execute(&self, query: &str) -> Result<Vec<ResultRow>> {
        SparqlClient::execute(self, query).await
    }
}

/// Decode a SPARQL JSON results payload into rows of plain string values
fn parse_results(body: &str) -> Result<Vec<ResultRow>> {
    let payload: SparqlResults = serde_json::from_str(body)
        .map_err(|e| SparqlError::QueryError(format!("unparseable result payload: {}", e)))?;

    let rows = payload
        .results
        .bindings
        .into_iter()
        .map(|binding| {
            let mut row = ResultRow::new();
            for (var, term) in binding {
                row.bindings.insert(var, term.value);
            }
            row
        })
        .collect();

    Ok(rows)
}

/// First part of an error body, keeps log output readable on big HTML pages
fn excerpt(body: &str) -> String {
    body.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PAYLOAD: &str = r#"{
        "head": { "vars": ["value", "label"] },
        "results": { "bindings": [
            {
                "value": { "type": "uri", "value": "http://vocab.getty.edu/aat/300033618" },
                "label": { "type": "literal", "xml:lang": "en", "value": "painting" }
            },
            {
                "value": { "type": "literal", "value": "Paris" }
            }
        ] }
    }"#;

    #[test]
    fn test_parse_results_rows_and_bindings() {
        let rows = parse_results(SAMPLE_PAYLOAD).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(
            rows[0].value(),
            Some("http://vocab.getty.edu/aat/300033618")
        );
        assert_eq!(rows[0].label(), Some("painting"));

        assert_eq!(rows[1].value(), Some("Paris"));
        assert_eq!(rows[1].label(), None);
    }

    #[test]
    fn test_parse_results_empty_bindings() {
        let rows = parse_results(r#"{"head":{"vars":[]},"results":{"bindings":[]}}"#).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_parse_results_garbage_is_query_error() {
        let err = parse_results("<html>Service Unavailable</html>").unwrap_err();
        assert!(matches!(err, SparqlError::QueryError(_)));
    }

    #[test]
    fn test_result_row_accessors() {
        let row = ResultRow::new().bind("value", "urn:a").bind("width", "640");
        assert_eq!(row.get("width"), Some("640"));
        assert_eq!(row.value(), Some("urn:a"));
        assert_eq!(row.label(), None);
        assert_eq!(row.len(), 2);
        assert!(!row.is_empty());
    }

    #[test]
    fn test_excerpt_limits_length() {
        let long = "x".repeat(500);
        assert_eq!(excerpt(&long).len(), 200);
        assert_eq!(excerpt("short"), "short");
    }

    struct StubExecutor {
        fail: bool,
    }

    #[async_trait]
    impl QueryExecutor for StubExecutor {
        async fn execute(&self, _query: &str) -> Result<Vec<ResultRow>> {
            if self.fail {
                Err(SparqlError::QueryError("unreachable".to_string()))
            } else {
                Ok(vec![ResultRow::new().bind("s", "urn:a")])
            }
        }
    }

    #[tokio::test]
    async fn test_probe_reports_health() {
        let result = StubExecutor { fail: false }.probe().await;
        assert!(result.healthy);
        assert!(result.error.is_none());

        let result = StubExecutor { fail: true }.probe().await;
        assert!(!result.healthy);
        assert!(result.error.unwrap().contains("unreachable"));
    }
}
