//! Axum router wiring (HTTP + WS upgrade).

use axum::routing::{get, post};
use axum::Router;

use crate::{api, app_state::AppState, obs, transport};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(transport::ws::ws_upgrade))
        .route("/metrics", get(obs::exposition::metrics))
        .route("/healthz", get(api::healthz))
        .route("/create_metric", post(api::create_metric))
        .route("/update_metric", post(api::update_metric))
        .route("/select_metric", post(api::select_metric))
        .route("/delete_metric", post(api::delete_metric))
        .route("/cleanup_metrics", post(api::cleanup_metrics))
        .route("/webhook", post(api::webhook))
        .route("/get_metrics_list", get(api::get_metrics_list))
        .route("/get_current_metrics", get(api::get_current_metrics))
        .route("/get_webhook_messages", get(api::get_webhook_messages))
        .with_state(state)
}
