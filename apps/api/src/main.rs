mod classifier;
mod config;
mod errors;
mod issues;
mod mentions;
mod messaging;
mod models;
mod notifications;
mod processing;
mod progress;
mod projects;
mod routes;
mod state;
mod store;
mod team;
#[cfg(test)]
mod test_support;
mod timeline;
mod webhook;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::classifier::HttpClassifier;
use crate::config::Config;
use crate::messaging::HttpMessenger;
use crate::processing::processor::spawn_workers;
use crate::processing::queue::job_queue;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::memory::MemoryStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (panics on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Tracing targets use the crate name, underscores instead of hyphens.
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Bouwlog API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize storage
    let store = Arc::new(MemoryStore::new());
    info!("In-memory store initialized");

    // Initialize the photo classifier client
    let classifier = Arc::new(HttpClassifier::new(
        config.classifier_api_url.clone(),
        config.classifier_api_key.clone(),
    ));
    info!("Classifier client initialized");

    // Initialize the outbound messaging client
    let messenger = Arc::new(HttpMessenger::new(
        config.messaging_api_url.clone(),
        config.messaging_account_sid.clone(),
        config.messaging_auth_token.clone(),
        config.messaging_from_address.clone(),
    ));
    info!("Messaging client initialized");

    // Processing queue and worker pool
    let (jobs, jobs_rx) = job_queue(config.queue_capacity);

    let state = AppState {
        store,
        classifier,
        messenger,
        jobs,
        config: config.clone(),
    };

    spawn_workers(config.worker_count, jobs_rx, state.clone());
    info!("Started {} processing workers", config.worker_count);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
