//! gaugeboard gateway binary.
//!
//! - WebSocket endpoint: /ws (every session joins both sync topics)
//! - HTTP mutation/query endpoints mirroring the registry operations
//! - Text exposition at /metrics

use std::net::SocketAddr;

use tracing_subscriber::{fmt, EnvFilter};

use gaugeboard_gateway::{app_state, config, router};

const CONFIG_PATH: &str = "gaugeboard.yaml";

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cfg = match config::load_from_file(CONFIG_PATH) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(error = %e, path = CONFIG_PATH, "config not loaded, using defaults");
            config::GatewayConfig::default()
        }
    };

    let listen: SocketAddr = cfg
        .gateway
        .listen
        .parse()
        .expect("gateway.listen must be a valid SocketAddr");

    let state = app_state::AppState::new(cfg);
    let app = router::build_router(state);

    tracing::info!(%listen, "gaugeboard-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .expect("failed to bind");

    axum::serve(listener, app).await.expect("server failed");
}
