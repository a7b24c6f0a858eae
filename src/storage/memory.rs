// src/storage/memory.rs
use std::sync::Arc;
use std::time::{Duration, Instant};
use parking_lot::RwLock;
use tokio::sync::Mutex;
use crate::models::server::ServerRecord;

pub const CACHE_EXPIRATION: Duration = Duration::from_secs(5 * 60);

/// The last server list that was fetched (or mocked), stamped with when.
#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    pub servers: Arc<Vec<ServerRecord>>,
    pub fetched_at: Instant,
    pub is_mock_data: bool,
}

impl CacheSnapshot {
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.fetched_at)
    }

    pub fn is_fresh(&self, now: Instant, max_age: Duration) -> bool {
        self.age(now) < max_age
    }
}

/// Outcome of the last refresh that failed.
#[derive(Debug, Clone)]
pub struct RefreshFailure {
    pub failed_at: Instant,
    pub message: String,
}

/// Single-slot cache for the server list. Snapshots are swapped whole, so
/// readers never see servers from one fetch with the timestamp of another.
pub struct ServerCache {
    slot: RwLock<Option<CacheSnapshot>>,
    last_failure: RwLock<Option<RefreshFailure>>,
    refresh_gate: Mutex<()>,
    max_age: Duration,
}

impl Default for ServerCache {
    fn default() -> Self {
        Self::new(CACHE_EXPIRATION)
    }
}

impl ServerCache {
    pub fn new(max_age: Duration) -> Self {
        Self {
            slot: RwLock::new(None),
            last_failure: RwLock::new(None),
            refresh_gate: Mutex::new(()),
            max_age,
        }
    }

    pub fn read(&self) -> Option<CacheSnapshot> {
        self.slot.read().clone()
    }

    /// The cached snapshot, if it is younger than the expiration at `now`.
    pub fn fresh_at(&self, now: Instant) -> Option<CacheSnapshot> {
        self.read().filter(|snapshot| snapshot.is_fresh(now, self.max_age))
    }

    pub fn write(&self, servers: Vec<ServerRecord>, is_mock_data: bool) -> CacheSnapshot {
        self.write_at(servers, is_mock_data, Instant::now())
    }

    pub fn write_at(&self, servers: Vec<ServerRecord>, is_mock_data: bool, fetched_at: Instant) -> CacheSnapshot {
        let snapshot = CacheSnapshot {
            servers: Arc::new(servers),
            fetched_at,
            is_mock_data,
        };
        *self.slot.write() = Some(snapshot.clone());
        *self.last_failure.write() = None;
        snapshot
    }

    pub fn record_failure(&self, message: String) {
        self.record_failure_at(message, Instant::now());
    }

    pub fn record_failure_at(&self, message: String, failed_at: Instant) {
        *self.last_failure.write() = Some(RefreshFailure { failed_at, message });
    }

    /// A refresh failure that finished at or after `since`, if one did.
    pub fn failure_since(&self, since: Instant) -> Option<RefreshFailure> {
        self.last_failure
            .read()
            .clone()
            .filter(|failure| failure.failed_at >= since)
    }

    /// Held for the duration of an upstream refresh so concurrent misses wait
    /// for the in-flight fetch instead of issuing their own.
    pub fn refresh_gate(&self) -> &Mutex<()> {
        &self.refresh_gate
    }
}
