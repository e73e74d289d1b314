//! Publish/subscribe fanout engine.
//!
//! One subscriber entry per connected session, keyed by an opaque session
//! id. `publish` serializes the event once and `try_send`s the prepared
//! frame to every subscriber of the topic except the originating session.
//! A session whose outbound queue is full loses that frame (counted) rather
//! than stalling the publisher or other sessions. Per-session causal order
//! follows from the per-session queue and the sequential enqueue here.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;

use gaugeboard_core::protocol::{SyncEvent, Topic};

/// Opaque handle for one connected session.
pub type SessionId = String;

struct Subscriber {
    topics: HashSet<Topic>,
    tx: mpsc::Sender<Message>,
}

/// Session table plus fanout counters.
pub struct SyncHub {
    subscribers: DashMap<SessionId, Subscriber>,
    seq: AtomicU64,
    published_metric_sync: AtomicU64,
    published_notifications: AtomicU64,
    dropped: AtomicU64,
}

impl Default for SyncHub {
    fn default() -> Self {
        Self {
            subscribers: DashMap::new(),
            seq: AtomicU64::new(1),
            published_metric_sync: AtomicU64::new(0),
            published_notifications: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }
}

impl SyncHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh session id.
    pub fn next_session_id(&self) -> SessionId {
        let n = self.seq.fetch_add(1, Ordering::Relaxed);
        format!("sess-{n}")
    }

    /// Register a session for delivery. Re-subscribing with the same id
    /// overwrites the previous registration, it does not duplicate.
    pub fn subscribe(
        &self,
        session_id: SessionId,
        topics: impl IntoIterator<Item = Topic>,
        tx: mpsc::Sender<Message>,
    ) {
        self.subscribers.insert(
            session_id,
            Subscriber {
                topics: topics.into_iter().collect(),
                tx,
            },
        );
    }

    /// Remove a session from all topics together. No-op when unknown.
    pub fn unsubscribe(&self, session_id: &str) {
        self.subscribers.remove(session_id);
    }

    pub fn session_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Fan `event` out to every subscriber of its topic except `origin`.
    ///
    /// Delivery order across sessions is unspecified; within one session
    /// events arrive in publish order.
    pub fn publish(&self, event: &SyncEvent, origin: Option<&str>) {
        let topic = event.topic();
        let frame = match serde_json::to_string(event) {
            Ok(s) => s,
            Err(e) => {
                // Events are plain data; an encode failure is a defect.
                tracing::error!(error = %e, topic = topic.as_str(), "event encode failed");
                return;
            }
        };

        for entry in self.subscribers.iter() {
            if origin == Some(entry.key().as_str()) {
                continue;
            }
            let sub = entry.value();
            if !sub.topics.contains(&topic) {
                continue;
            }
            if sub.tx.try_send(Message::Text(frame.clone())).is_err() {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(session = %entry.key(), topic = topic.as_str(), "egress queue full, frame dropped");
            }
        }

        match topic {
            Topic::MetricSync => self.published_metric_sync.fetch_add(1, Ordering::Relaxed),
            Topic::NotificationFeed => self.published_notifications.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Lifetime count of publishes on `topic`.
    pub fn published_count(&self, topic: Topic) -> u64 {
        match topic {
            Topic::MetricSync => self.published_metric_sync.load(Ordering::Relaxed),
            Topic::NotificationFeed => self.published_notifications.load(Ordering::Relaxed),
        }
    }

    /// Lifetime count of frames dropped on full per-session queues.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
