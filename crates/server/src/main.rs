// crates/server/src/main.rs
//! Hostdeck daemon binary.
//!
//! Wires the pieces together: metric sampler (warmed before serving so the
//! first surface shows real CPU numbers), the display controller task, and
//! the Axum listener.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use hostdeck_server::config::ServerConfig;
use hostdeck_server::connections::ConnectionRegistry;
use hostdeck_server::controller;
use hostdeck_server::metrics::init_metrics;
use hostdeck_server::sampler::MetricSampler;
use hostdeck_server::{create_app, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; RUST_LOG overrides the default filter
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("hostdeck_server=info,hostdeck_core=info,tower_http=warn")
    });
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Initialize Prometheus metrics
    init_metrics();

    // Step 1: Resolve configuration from the environment
    let config = ServerConfig::from_env();

    // Step 2: Connection registry and metric sampler
    let connections = Arc::new(ConnectionRegistry::new(config.max_sessions));
    let sampler = Arc::new(MetricSampler::new(
        Arc::clone(&connections),
        config.disabled_modules.clone(),
    ));
    sampler.warm_up().await;

    // Step 3: Spawn the display controller task
    let (control_tx, control_rx) = mpsc::unbounded_channel();
    controller::spawn(
        Arc::clone(&connections),
        Arc::clone(&sampler),
        control_tx.clone(),
        control_rx,
    );

    // Step 4: Build the app and bind the listener
    let state = AppState::new(config.clone(), connections, control_tx, sampler);
    let app = create_app(state);
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Print banner
    eprintln!("\nhostdeck v{}\n", env!("CARGO_PKG_VERSION"));
    eprintln!("  surface  ws://{addr}/api/surface");
    eprintln!("  status   http://{addr}/api/status");
    eprintln!("  metrics  http://{addr}/metrics\n");

    tracing::info!(%addr, max_sessions = config.max_sessions, "hostdeck listening");
    axum::serve(listener, app).await?;

    Ok(())
}
