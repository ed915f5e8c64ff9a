use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cicerone::api::server::{ApiServer, ApiServerConfig};
use cicerone::{ManifestService, ServiceConfig};

#[derive(Parser)]
#[command(name = "cicerone")]
#[command(about = "IIIF Presentation manifest service over SPARQL endpoints", long_about = None)]
struct Cli {
    /// Service configuration file
    #[arg(short, long, default_value = "config.yml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the manifest server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// SPARQL endpoint URL (can also use SPARQL_ENDPOINT env var)
        #[arg(long, env = "SPARQL_ENDPOINT")]
        endpoint: String,
    },

    /// Print the effective field registry
    Fields,

    /// Manage the manifest cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Delete expired records
    Purge,

    /// Delete all records
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "cicerone=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            ref host,
            port,
            ref endpoint,
        } => {
            let config = ServiceConfig::load(&cli.config).await?;
            let service = ManifestService::new(endpoint, config).await?;

            let server = ApiServer::new(
                ApiServerConfig {
                    host: host.clone(),
                    port,
                },
                Arc::new(service),
            );
            println!("Starting manifest server on {}:{}", host, port);
            server.start().await?;
        }

        Commands::Fields => {
            use cicerone_sparql::FieldRegistry;

            let config = ServiceConfig::load(&cli.config).await?;
            let registry = FieldRegistry::from_file(&config.field_definitions_file).await?;

            println!("Fields ({}):", registry.fields().len());
            for field in registry.fields() {
                println!("  {} [{}] - {}", field.id, field.datatype, field.label);
            }
            println!("\nNamespaces:");
            for (prefix, uri) in registry.namespaces() {
                println!("  {}: <{}>", prefix, uri);
            }
        }

        Commands::Cache { ref action } => {
            use cicerone_sparql::{CacheConfig, DiskCache};

            let config = ServiceConfig::load(&cli.config).await?;
            let cache = DiskCache::new(CacheConfig::new(
                &config.cache.directory,
                &config.cache.expiration,
            )?)?;

            match action {
                CacheAction::Purge => {
                    let removed = cache.purge_expired().await?;
                    println!("Purged {} expired records", removed);
                }
                CacheAction::Clear => {
                    let removed = cache.clear().await?;
                    println!("Cleared {} records", removed);
                }
            }
        }
    }

    Ok(())
}
