use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub uptime_seconds: u64,
    pub messages_processed: u64,
    pub messages_failed: u64,
    pub bridge_status: String,
    pub bridge_reconnects: u32,
}

/// Process-level counters shown on the liveness endpoint.
#[derive(Clone)]
pub struct HealthTracker {
    start_time: Instant,
    processed: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
    bridge_reconnects: Arc<AtomicU32>,
    bridge_status: Arc<Mutex<String>>,
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            processed: Arc::new(AtomicU64::new(0)),
            failed: Arc::new(AtomicU64::new(0)),
            bridge_reconnects: Arc::new(AtomicU32::new(0)),
            bridge_status: Arc::new(Mutex::new("disabled".to_string())),
        }
    }

    pub fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn mark_bridge_connecting(&self) {
        *self.bridge_status.lock() = "connecting".to_string();
    }

    pub fn mark_bridge_connected(&self) {
        *self.bridge_status.lock() = "connected".to_string();
    }

    pub fn mark_bridge_stopped(&self) {
        *self.bridge_status.lock() = "stopped".to_string();
    }

    pub fn increment_reconnects(&self) {
        self.bridge_reconnects.fetch_add(1, Ordering::Relaxed);
        *self.bridge_status.lock() = "reconnecting".to_string();
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            uptime_seconds: self.start_time.elapsed().as_secs(),
            messages_processed: self.processed.load(Ordering::Relaxed),
            messages_failed: self.failed.load(Ordering::Relaxed),
            bridge_status: self.bridge_status.lock().clone(),
            bridge_reconnects: self.bridge_reconnects.load(Ordering::Relaxed),
        }
    }
}
