use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod apis;
mod cloudflare;
mod config;
mod error;
mod health;
mod metrics;
mod reconcile;

use apis::ingress::IngressWatcher;
use cloudflare::client::CloudflareClient;
use config::Settings;
use reconcile::Pipeline;

/// GEOROUTE agent
///
/// Watches Ingress resources in this cluster and converges the shared
/// remote pool/load-balancer configuration for its geo identity.
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize rustls crypto provider (needed for Kubernetes TLS client)
    rustls::crypto::ring::default_provider()
        .install_default()
        .ok(); // Ignore error if already installed

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🌍 GEOROUTE: geo-distributed load balancer agent");

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };
    settings.log_summary();

    tokio::spawn(health::serve(settings.health_addr));

    let kube_client = kube::Client::try_default()
        .await
        .context("Failed to load Kubernetes configuration")?;
    info!("Loaded Kubernetes configuration");

    let api = CloudflareClient::new(&settings).context("Failed to build API client")?;
    let pipeline = Pipeline::new(api, &settings);
    let watcher = IngressWatcher::new(kube_client, settings.label_selector.clone());

    tokio::select! {
        result = watcher.run(&pipeline) => {
            if let Err(e) = result {
                error!("Watch loop terminated: {e}");
                std::process::exit(1);
            }
        }
        _ = signal::ctrl_c() => {
            info!("Received interrupt signal, shutting down...");
        }
    }

    Ok(())
}
