//! API server for cicerone

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::service::ManifestService;

use super::routes::{self, AppState};

/// Configuration for the API server
pub struct ApiServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// API server
pub struct ApiServer {
    config: ApiServerConfig,
    service: Arc<ManifestService>,
}

impl ApiServer {
    /// Create a new API server around a manifest service
    pub fn new(config: ApiServerConfig, service: Arc<ManifestService>) -> Self {
        Self { config, service }
    }

    /// Start the API server
    pub async fn start(self) -> Result<()> {
        let app = routes::router(Arc::new(AppState {
            service: self.service,
        }));

        let addr = format!("{}:{}", self.config.host, self.config.port);
        info!("Starting API server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
