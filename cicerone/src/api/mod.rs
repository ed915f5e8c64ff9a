//! API module for the cicerone HTTP server

pub mod routes;
pub mod server;

pub use server::{ApiServer, ApiServerConfig};
