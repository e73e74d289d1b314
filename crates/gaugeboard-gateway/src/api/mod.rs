//! HTTP boundary: mutation endpoints, queries, and notification ingestion.
//!
//! Handlers translate registry outcomes into `{"status": ...}` JSON bodies.
//! Parse failures are request-level errors and never reach the registry;
//! server-originated mutations publish with no origin so every session
//! receives them.

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{json, Value};

use gaugeboard_core::error::ClientCode;
use gaugeboard_core::feed::ContentKind;
use gaugeboard_core::protocol::SyncEvent;
use gaugeboard_core::registry::MetricId;

use crate::app_state::AppState;

// --------------------
// Request bodies
// --------------------

#[derive(Debug, Deserialize)]
pub struct CreateMetricReq {
    #[serde(default)]
    metric_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMetricReq {
    #[serde(default)]
    metric_id: Option<MetricId>,
    #[serde(default)]
    metric_name: Option<String>,
    /// Decimal text or JSON number; parsed at this boundary only.
    #[serde(default)]
    metric_value: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct SelectMetricReq {
    metric_id: MetricId,
}

#[derive(Debug, Deserialize)]
pub struct DeleteMetricReq {
    metric_id: MetricId,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    100
}

// --------------------
// Response helpers
// --------------------

fn error_response(status: StatusCode, code: ClientCode, msg: &str) -> Response {
    (
        status,
        Json(json!({
            "status": "error",
            "code": code.as_str(),
            "message": msg,
        })),
    )
        .into_response()
}

fn not_found(msg: &str) -> Response {
    error_response(StatusCode::NOT_FOUND, ClientCode::NotFound, msg)
}

fn bad_request(msg: &str) -> Response {
    error_response(StatusCode::BAD_REQUEST, ClientCode::BadRequest, msg)
}

/// Accept a metric value as a JSON number or as decimal text.
fn parse_value(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

// --------------------
// Mutations
// --------------------

pub async fn create_metric(
    State(app): State<AppState>,
    Json(req): Json<CreateMetricReq>,
) -> Response {
    let created = app.registry().create(req.metric_name.as_deref());
    app.hub().publish(&created.event, None);
    (
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "metric": created.view,
            "selected_id": created.view.metric_id,
        })),
    )
        .into_response()
}

pub async fn update_metric(
    State(app): State<AppState>,
    Json(req): Json<UpdateMetricReq>,
) -> Response {
    if req.metric_name.is_none() && req.metric_value.is_none() {
        return bad_request("nothing to update: provide metric_name and/or metric_value");
    }

    let value = match &req.metric_value {
        Some(raw) => match parse_value(raw) {
            Some(v) => Some(v),
            None => return bad_request("metric_value must be a decimal number"),
        },
        None => None,
    };

    let registry = app.registry();
    let Some(id) = registry.resolve_target(req.metric_id) else {
        return not_found("no metric selected");
    };

    let mut latest = None;
    if let Some(name) = req.metric_name.as_deref() {
        match registry.rename(id, name) {
            Some(applied) => latest = Some(applied),
            None => return not_found("metric disappeared"),
        }
    }
    if let Some(v) = value {
        match registry.set_value(id, v) {
            Some(applied) => latest = Some(applied),
            None => return not_found("metric disappeared"),
        }
    }

    let Some((view, event)) = latest else {
        return bad_request("nothing to update");
    };
    app.hub().publish(&event, None);
    (
        StatusCode::OK,
        Json(json!({ "status": "success", "metric": view })),
    )
        .into_response()
}

pub async fn select_metric(
    State(app): State<AppState>,
    Json(req): Json<SelectMetricReq>,
) -> Response {
    if app.registry().select(req.metric_id) {
        (
            StatusCode::OK,
            Json(json!({ "status": "success", "selected_id": req.metric_id })),
        )
            .into_response()
    } else {
        not_found(&format!("unknown metric id {}", req.metric_id))
    }
}

pub async fn delete_metric(
    State(app): State<AppState>,
    Json(req): Json<DeleteMetricReq>,
) -> Response {
    match app.registry().delete(req.metric_id) {
        Some(event) => {
            app.hub().publish(&event, None);
            (
                StatusCode::OK,
                Json(json!({
                    "status": "success",
                    "deleted_id": req.metric_id,
                    "selected_id": app.registry().selected(),
                })),
            )
                .into_response()
        }
        None => not_found(&format!("unknown metric id {}", req.metric_id)),
    }
}

pub async fn cleanup_metrics(State(app): State<AppState>) -> Response {
    let (deleted, event) = app.registry().clear_all();
    app.hub().publish(&event, None);
    (
        StatusCode::OK,
        Json(json!({ "status": "success", "deleted": deleted })),
    )
        .into_response()
}

// --------------------
// Notification ingestion
// --------------------

pub async fn webhook(State(app): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let raw = String::from_utf8_lossy(&body).into_owned();

    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false);

    // Structured bodies carry the payload under "message"; anything else is
    // taken verbatim.
    let (text, kind) = if is_json {
        let message = serde_json::from_str::<Value>(&raw)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from));
        match message {
            Some(msg) => (msg, ContentKind::Structured),
            None => (raw, ContentKind::Raw),
        }
    } else {
        (raw, ContentKind::Raw)
    };

    let entry = app.feed().append(text, kind);
    app.hub().publish(
        &SyncEvent::Notification {
            text: entry.text.clone(),
        },
        None,
    );
    (
        StatusCode::OK,
        Json(json!({ "status": "success", "received": entry })),
    )
        .into_response()
}

// --------------------
// Queries
// --------------------

pub async fn get_metrics_list(State(app): State<AppState>) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "metrics": app.registry().snapshot(),
            "selected_id": app.registry().selected(),
        })),
    )
        .into_response()
}

pub async fn get_current_metrics(State(app): State<AppState>) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "metric": app.registry().selected_view(),
        })),
    )
        .into_response()
}

pub async fn get_webhook_messages(
    State(app): State<AppState>,
    Query(q): Query<RecentQuery>,
) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "messages": app.feed().recent(q.limit),
        })),
    )
        .into_response()
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
