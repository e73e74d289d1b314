//! Bounded notification history.
//!
//! Externally delivered messages are kept in a FIFO ring so late-connecting
//! clients can backfill; the live fanout happens separately through the hub.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::clock;

/// Maximum retained notifications; the oldest entry is evicted first.
pub const FEED_CAPACITY: usize = 100;

/// How an inbound notification body was encoded. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// JSON body; the payload was taken from its `message` key.
    Structured,
    /// The whole body was used verbatim.
    Raw,
}

/// One received notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEntry {
    pub text: String,
    pub received_at_ms: u64,
    pub kind: ContentKind,
}

struct FeedState {
    entries: VecDeque<NotificationEntry>,
    total: u64,
}

/// Append-only ring of recently received notifications.
pub struct MessageLog {
    state: Mutex<FeedState>,
}

impl Default for MessageLog {
    fn default() -> Self {
        Self {
            state: Mutex::new(FeedState {
                entries: VecDeque::with_capacity(FEED_CAPACITY),
                total: 0,
            }),
        }
    }
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a notification, evicting the oldest entry when the ring is
    /// full. The bound holds after every call.
    pub fn append(&self, text: impl Into<String>, kind: ContentKind) -> NotificationEntry {
        let entry = NotificationEntry {
            text: text.into(),
            received_at_ms: clock::now_ms(),
            kind,
        };
        let mut st = self.lock();
        if st.entries.len() == FEED_CAPACITY {
            st.entries.pop_front();
        }
        st.entries.push_back(entry.clone());
        st.total += 1;
        entry
    }

    /// The last `min(limit, len)` entries, oldest-first within the slice.
    pub fn recent(&self, limit: usize) -> Vec<NotificationEntry> {
        let st = self.lock();
        let take = limit.min(st.entries.len());
        st.entries
            .iter()
            .skip(st.entries.len() - take)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Lifetime count of appended notifications, including evicted ones.
    pub fn total_received(&self) -> u64 {
        self.lock().total
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn ring_never_exceeds_capacity() {
        let log = MessageLog::new();
        for i in 0..150 {
            log.append(format!("msg-{i}"), ContentKind::Raw);
            assert!(log.len() <= FEED_CAPACITY);
        }
        assert_eq!(log.len(), FEED_CAPACITY);
        assert_eq!(log.total_received(), 150);

        // exactly the last 100 remain, oldest-first
        let all = log.recent(FEED_CAPACITY);
        assert_eq!(all.first().unwrap().text, "msg-50");
        assert_eq!(all.last().unwrap().text, "msg-149");
    }

    #[test]
    fn recent_returns_tail_oldest_first() {
        let log = MessageLog::new();
        for i in 0..5 {
            log.append(format!("n{i}"), ContentKind::Structured);
        }
        let tail: Vec<String> = log.recent(3).into_iter().map(|e| e.text).collect();
        assert_eq!(tail, vec!["n2", "n3", "n4"]);
    }

    #[test]
    fn recent_with_oversized_limit_returns_everything() {
        let log = MessageLog::new();
        log.append("only", ContentKind::Raw);
        assert_eq!(log.recent(1000).len(), 1);
        assert_eq!(log.recent(0).len(), 0);
    }

    #[test]
    fn entries_keep_their_content_kind() {
        let log = MessageLog::new();
        log.append("a", ContentKind::Structured);
        log.append("b", ContentKind::Raw);
        let kinds: Vec<ContentKind> = log.recent(2).into_iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![ContentKind::Structured, ContentKind::Raw]);
    }
}
