//! Shared application state for the gaugeboard gateway.
//!
//! The registry, feed, and hub are constructed once at process start and
//! handed to the boundary layer behind this cloneable handle; the raw
//! containers are never exposed.

use std::sync::Arc;

use gaugeboard_core::feed::MessageLog;
use gaugeboard_core::registry::MetricRegistry;

use crate::config::GatewayConfig;
use crate::realtime::SyncHub;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    registry: MetricRegistry,
    feed: MessageLog,
    hub: SyncHub,
}

impl AppState {
    pub fn new(cfg: GatewayConfig) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                registry: MetricRegistry::new(),
                feed: MessageLog::new(),
                hub: SyncHub::new(),
            }),
        }
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> &MetricRegistry {
        &self.inner.registry
    }

    pub fn feed(&self) -> &MessageLog {
        &self.inner.feed
    }

    pub fn hub(&self) -> &SyncHub {
        &self.inner.hub
    }
}
