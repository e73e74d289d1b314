//! WebSocket handler.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS and register the session with the hub (both topics)
//! - Lifecycle: ping/pong + idle timeout
//! - Apply client-originated edits to the registry, then fan the result out
//!   with the sender excluded so it never sees its own echo
//!
//! Whatever path ends the session, the hub registration is removed before
//! the task finishes, so no stale delivery targets leak.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};

use gaugeboard_core::error::ClientCode;
use gaugeboard_core::protocol::{ClientMessage, Topic};

use crate::app_state::AppState;
use crate::realtime::SessionId;

fn error_json(code: ClientCode, msg: &str) -> String {
    json!({
        "type": "error",
        "code": code.as_str(),
        "msg": msg,
    })
    .to_string()
}

pub async fn ws_upgrade(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| async move {
        let session_id = app.hub().next_session_id();
        tracing::debug!(%session_id, "session connected");
        run_session(&app, &session_id, socket).await;
        app.hub().unsubscribe(&session_id);
        tracing::debug!(%session_id, "session disconnected");
    })
}

async fn run_session(app: &AppState, session_id: &SessionId, socket: WebSocket) {
    let gw = &app.cfg().gateway;

    let (out_tx, mut out_rx) = mpsc::channel::<Message>(gw.outbound_queue);
    app.hub()
        .subscribe(session_id.clone(), Topic::ALL, out_tx.clone());

    let (mut ws_tx, mut ws_rx) = socket.split();

    let ping_every = Duration::from_millis(gw.ping_interval_ms);
    let idle_timeout = Duration::from_millis(gw.idle_timeout_ms);

    let mut ping_tick = tokio::time::interval(ping_every);
    ping_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            // outbound writer
            maybe_out = out_rx.recv() => {
                match maybe_out {
                    Some(m) => {
                        if ws_tx.send(m).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(Ok(msg)) = incoming else { break; };
                last_activity = Instant::now();

                match msg {
                    Message::Text(s) => {
                        handle_client_text(app, session_id, &out_tx, &s).await;
                    }
                    Message::Binary(_) => {
                        let _ = out_tx
                            .send(Message::Text(error_json(
                                ClientCode::BadRequest,
                                "binary frames not supported",
                            )))
                            .await;
                    }
                    Message::Ping(payload) => {
                        let _ = out_tx.send(Message::Pong(payload)).await;
                    }
                    Message::Pong(_) => {}
                    Message::Close(_) => break,
                }
            }

            // ping
            _ = ping_tick.tick() => {
                let _ = out_tx.send(Message::Ping(Vec::new())).await;
            }

            // idle timeout
            _ = tokio::time::sleep(Duration::from_millis(250)) => {
                if last_activity.elapsed() >= idle_timeout {
                    let _ = out_tx
                        .send(Message::Text(error_json(ClientCode::BadRequest, "idle timeout")))
                        .await;
                    break;
                }
            }
        }
    }
}

/// Decode one inbound text frame and apply it.
///
/// Registry misses answer the sender alone with an error frame; nothing is
/// broadcast for a failed edit.
async fn handle_client_text(
    app: &AppState,
    session_id: &SessionId,
    out_tx: &mpsc::Sender<Message>,
    raw: &str,
) {
    let msg: ClientMessage = match serde_json::from_str(raw) {
        Ok(m) => m,
        Err(e) => {
            let _ = out_tx
                .send(Message::Text(error_json(
                    ClientCode::BadRequest,
                    &format!("invalid message: {e}"),
                )))
                .await;
            return;
        }
    };

    match msg {
        ClientMessage::MetricUpdate {
            metric_id,
            metric_name,
            metric_value,
        } => {
            if metric_name.is_none() && metric_value.is_none() {
                let _ = out_tx
                    .send(Message::Text(error_json(
                        ClientCode::BadRequest,
                        "metric_update carries no changes",
                    )))
                    .await;
                return;
            }

            let registry = app.registry();
            let mut latest = None;

            if let Some(name) = metric_name.as_deref() {
                match registry.rename(metric_id, name) {
                    Some(applied) => latest = Some(applied),
                    None => {
                        let _ = out_tx
                            .send(Message::Text(error_json(
                                ClientCode::NotFound,
                                &format!("unknown metric id {metric_id}"),
                            )))
                            .await;
                        return;
                    }
                }
            }

            if let Some(value) = metric_value {
                match registry.set_value(metric_id, value) {
                    Some(applied) => latest = Some(applied),
                    None => {
                        let _ = out_tx
                            .send(Message::Text(error_json(
                                ClientCode::NotFound,
                                &format!("unknown metric id {metric_id}"),
                            )))
                            .await;
                        return;
                    }
                }
            }

            // The last delta carries the metric's full post-edit state, so a
            // combined rename+value edit still fans out as one event.
            if let Some((_, event)) = latest {
                app.hub().publish(&event, Some(session_id));
            }
        }
    }
}
