//! Per-key request throttling behind an injectable counter store.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::sync::Cache;

use crate::config::RateLimitConfig;
use crate::error::{McpError, Result};

/// Counter storage for rate limiting.
///
/// Implementations decide how and when counts expire; the limiter only
/// reads, bumps and clears them.
pub trait RateLimitStore: Send + Sync {
    /// Requests recorded for `key` in the current window
    fn get(&self, key: &str) -> u32;
    /// Record one request for `key` and return the new count
    fn increment(&self, key: &str) -> u32;
    /// Forget everything recorded for `key`
    fn reset(&self, key: &str);
}

#[derive(Debug, Clone, Copy)]
struct WindowCounter {
    count: u32,
    window_start: Instant,
}

/// Fixed-window counters held in a bounded moka cache.
///
/// Entries also expire through the cache TTL so idle keys do not accumulate.
#[derive(Clone)]
pub struct MokaRateLimitStore {
    counters: Cache<String, WindowCounter>,
    window: Duration,
}

impl MokaRateLimitStore {
    pub fn new(config: &RateLimitConfig) -> Self {
        let window = Duration::from_secs(config.window_seconds);
        let counters = Cache::builder()
            .max_capacity(config.max_tracked_keys)
            .time_to_live(window)
            .build();

        Self { counters, window }
    }

    fn is_current(&self, counter: &WindowCounter) -> bool {
        counter.window_start.elapsed() < self.window
    }
}

impl RateLimitStore for MokaRateLimitStore {
    fn get(&self, key: &str) -> u32 {
        self.counters
            .get(key)
            .filter(|c| self.is_current(c))
            .map(|c| c.count)
            .unwrap_or(0)
    }

    fn increment(&self, key: &str) -> u32 {
        let entry = self
            .counters
            .entry(key.to_string())
            .and_upsert_with(|existing| match existing.map(|e| e.into_value()) {
                Some(counter) if self.is_current(&counter) => WindowCounter {
                    count: counter.count.saturating_add(1),
                    ..counter
                },
                _ => WindowCounter {
                    count: 1,
                    window_start: Instant::now(),
                },
            });

        entry.into_value().count
    }

    fn reset(&self, key: &str) {
        self.counters.invalidate(key);
    }
}

/// Rejects keys that exceed `max_requests` within the store's window.
pub struct RateLimiter<S: RateLimitStore> {
    store: S,
    max_requests: u32,
}

impl<S: RateLimitStore> RateLimiter<S> {
    pub fn new(store: S, max_requests: u32) -> Self {
        Self {
            store,
            max_requests,
        }
    }

    /// Record a request for `key`, failing once the limit is exceeded.
    pub fn check(&self, key: &str) -> Result<()> {
        let count = self.store.increment(key);
        if count > self.max_requests {
            tracing::warn!(key = %key, count, limit = self.max_requests, "Rate limit exceeded");
            return Err(McpError::RateLimited(key.to_string()));
        }
        Ok(())
    }

    pub fn remaining(&self, key: &str) -> u32 {
        self.max_requests.saturating_sub(self.store.get(key))
    }

    pub fn reset(&self, key: &str) {
        self.store.reset(key);
    }
}

/// Shared limiter backed by the moka store
pub type SharedRateLimiter = Arc<RateLimiter<MokaRateLimitStore>>;

pub fn create_rate_limiter(config: &RateLimitConfig) -> SharedRateLimiter {
    Arc::new(RateLimiter::new(
        MokaRateLimitStore::new(config),
        config.max_requests,
    ))
}
