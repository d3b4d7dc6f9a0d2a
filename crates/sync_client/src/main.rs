//! Demo entry point: runs the sync layer against a live backend.
//!
//! Reads the endpoint, credential, and identity from the environment,
//! opens the connection, performs the initial loads, and logs every
//! state transition and fetch failure until Ctrl+C.

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;
use session::Session;
use std::env;
use sync_client::{SyncClient, SyncConfig};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting sync client");

    // Read configuration from environment
    let ws_endpoint =
        env::var("WS_ENDPOINT").unwrap_or_else(|_| "ws://localhost:5000/ws".to_string());
    let api_base_url =
        env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:5000".to_string());
    let token = env::var("AUTH_TOKEN").unwrap_or_default();
    let user_id = env::var("USER_ID").unwrap_or_else(|_| "1".to_string());
    let team_id = env::var("TEAM_ID").ok();
    let dedupe_by_task_id = env::var("DEDUPE_BY_TASK_ID")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let metrics_port: u16 = env::var("METRICS_PORT")
        .unwrap_or_else(|_| "9090".to_string())
        .parse()
        .expect("METRICS_PORT must be a number");

    info!("Configuration:");
    info!("  WS_ENDPOINT: {}", ws_endpoint);
    info!("  API_BASE_URL: {}", api_base_url);
    info!("  USER_ID: {}", user_id);
    info!("  TEAM_ID: {:?}", team_id);
    info!("  DEDUPE_BY_TASK_ID: {}", dedupe_by_task_id);

    // Start Prometheus metrics server
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], metrics_port))
        .install()
        .expect("Failed to start Prometheus exporter");
    info!("Prometheus metrics server started on port {}", metrics_port);

    // Seed the session the way the host application would at login
    let session = Session::in_memory();
    session.init(&token, &format!(r#"{{"id":"{}"}}"#, user_id));

    let config = SyncConfig {
        ws_endpoint,
        api_base_url,
        dedupe_by_task_id,
        ..Default::default()
    };
    let client = SyncClient::new(config, session);

    // Log state transitions
    let mut state_rx = client.connection().subscribe_state();
    tokio::spawn(async move {
        loop {
            info!("Connection state: {:?}", *state_rx.borrow());
            if state_rx.changed().await.is_err() {
                break;
            }
        }
    });

    // Log background fetch failures; auth rejections mean the host
    // should re-authenticate
    if let Some(mut fetch_errors) = client.fetch_errors() {
        tokio::spawn(async move {
            while let Some(e) = fetch_errors.recv().await {
                if e.is_auth() {
                    error!("Fetch rejected by auth; re-authentication required: {}", e);
                } else {
                    warn!("Background fetch failed: {}", e);
                }
            }
        });
    }

    if !client.start()? {
        anyhow::bail!("Cannot start without a user identity");
    }

    // Select the initial team and pull the baselines
    if let Some(team_id) = team_id {
        client.set_active_team(team_id);
    } else {
        match client.load_notifications().await {
            Ok(committed) => info!("Initial snapshot committed: {}", committed),
            Err(e) => warn!("Initial snapshot failed: {}", e),
        }
    }

    info!("Sync client running; press Ctrl+C to stop");
    signal::ctrl_c().await.ok();

    info!("Shutting down");
    client.logout();
    Ok(())
}
