//! Text exposition renderer.
//!
//! Every live registry metric becomes one gauge series named by its
//! canonical name, with the display name escaped into the HELP line.
//! Gateway self-metrics follow.

use std::fmt::Write;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use gaugeboard_core::protocol::Topic;

use crate::app_state::AppState;

const CONTENT_TYPE_TEXT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Escape a value for a HELP line.
fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

pub fn render(app: &AppState) -> String {
    let mut out = String::new();

    for m in app.registry().snapshot() {
        let _ = writeln!(
            out,
            "# HELP {} {}",
            m.canonical_name,
            escape_help(&m.display_name)
        );
        let _ = writeln!(out, "# TYPE {} gauge", m.canonical_name);
        let _ = writeln!(out, "{} {}", m.canonical_name, m.value);
    }

    let hub = app.hub();
    let _ = writeln!(out, "# TYPE gaugeboard_sessions_active gauge");
    let _ = writeln!(out, "gaugeboard_sessions_active {}", hub.session_count());

    let _ = writeln!(out, "# TYPE gaugeboard_events_published_total counter");
    for topic in Topic::ALL {
        let _ = writeln!(
            out,
            "gaugeboard_events_published_total{{topic=\"{}\"}} {}",
            topic.as_str(),
            hub.published_count(topic)
        );
    }

    let _ = writeln!(out, "# TYPE gaugeboard_egress_dropped_total counter");
    let _ = writeln!(out, "gaugeboard_egress_dropped_total {}", hub.dropped_count());

    let _ = writeln!(out, "# TYPE gaugeboard_notifications_total counter");
    let _ = writeln!(
        out,
        "gaugeboard_notifications_total {}",
        app.feed().total_received()
    );

    out
}

pub async fn metrics(State(app): State<AppState>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, CONTENT_TYPE_TEXT)],
        render(&app),
    )
        .into_response()
}
