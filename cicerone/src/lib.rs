pub mod api;
pub mod config;
pub mod error;
pub mod manifest;
pub mod service;

pub use api::{ApiServer, ApiServerConfig};
pub use config::ServiceConfig;
pub use error::{Result, ServiceError};
pub use manifest::{Manifest, ManifestBuilder};
pub use service::{DocumentData, ManifestService};
