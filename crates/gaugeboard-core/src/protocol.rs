//! Wire contracts between the gateway and connected clients.
//!
//! Everything that crosses a socket is one of a fixed set of tagged JSON
//! variants; there is no open-ended payload dictionary. Outbound events are
//! serialized once by the hub and fanned out verbatim.

use serde::{Deserialize, Serialize};

use crate::registry::MetricId;

/// Broadcast channel a session can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Incremental metric deltas and registry-changed signals.
    MetricSync,
    /// Externally delivered notification messages.
    NotificationFeed,
}

impl Topic {
    /// Every topic; sessions subscribe to all of them uniformly.
    pub const ALL: [Topic; 2] = [Topic::MetricSync, Topic::NotificationFeed];

    /// Stable topic tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::MetricSync => "metric-sync",
            Topic::NotificationFeed => "notification-feed",
        }
    }
}

/// Point-in-time copy of one metric's state.
///
/// The registry hands out these copies; no live `Metric` reference ever
/// leaves it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricView {
    pub metric_id: MetricId,
    pub display_name: String,
    pub canonical_name: String,
    pub value: f64,
}

/// Outbound fanout event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    /// Incremental delta for a single metric (topic `metric-sync`).
    MetricSync {
        metric_id: MetricId,
        display_name: String,
        canonical_name: String,
        value: f64,
    },
    /// The member set changed (create/delete/clear); subscribers re-fetch
    /// the full list instead of applying a delta.
    RegistryChanged,
    /// One external notification (topic `notification-feed`).
    Notification { text: String },
}

impl SyncEvent {
    /// The topic this event is delivered on. Routing is derived from the
    /// event kind so the two cannot disagree.
    pub fn topic(&self) -> Topic {
        match self {
            SyncEvent::MetricSync { .. } | SyncEvent::RegistryChanged => Topic::MetricSync,
            SyncEvent::Notification { .. } => Topic::NotificationFeed,
        }
    }

    /// Build the incremental delta for a metric's current state.
    pub fn delta(view: &MetricView) -> Self {
        SyncEvent::MetricSync {
            metric_id: view.metric_id,
            display_name: view.display_name.clone(),
            canonical_name: view.canonical_name.clone(),
            value: view.value,
        }
    }
}

/// Inbound client-originated message.
///
/// Unknown `type` tags fail deserialization and are answered with an error
/// frame by the transport, never a crash.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Edit of one metric from a connected client. The transport applies the
    /// edit to the registry and republishes the result with this session
    /// excluded.
    MetricUpdate {
        metric_id: MetricId,
        #[serde(default)]
        metric_name: Option<String>,
        #[serde(default)]
        metric_value: Option<f64>,
    },
}
