//! Fixed-window admission control keyed by caller address.
//!
//! The window is coarse, not sliding: the first request after expiry
//! discards the old counter and starts a fresh window. Counters live only
//! in process memory and are lost on restart, which is acceptable for a
//! soft limit.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

/// Configuration for the fixed-window limiter.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests allowed per window.
    pub max_requests: u32,
    /// Window length.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

/// Per-caller counter state.
#[derive(Debug)]
struct ClientWindow {
    count: u32,
    started: Instant,
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Limited,
}

/// Fixed-window rate limiter shared across concurrent requests.
///
/// Kept behind the handler as an injectable component so it can be
/// replaced by a shared implementation without touching the handler.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    config: RateLimitConfig,
    clients: Arc<RwLock<HashMap<String, ClientWindow>>>,
}

impl FixedWindowLimiter {
    /// Create a limiter with default config (10 requests per 60 seconds).
    pub fn new() -> Self {
        Self::with_config(RateLimitConfig::default())
    }

    /// Create a limiter with custom config.
    pub fn with_config(config: RateLimitConfig) -> Self {
        Self {
            config,
            clients: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Count a request from `caller` against its current window.
    ///
    /// The increment happens under a single write-lock acquisition, so
    /// concurrent requests from the same caller are not torn.
    pub async fn check(&self, caller: &str) -> Decision {
        let now = Instant::now();
        let mut clients = self.clients.write().await;

        let window = clients
            .entry(caller.to_string())
            .or_insert_with(|| ClientWindow { count: 0, started: now });

        // Expired window: start fresh rather than sliding
        if now.duration_since(window.started) >= self.config.window {
            window.count = 0;
            window.started = now;
        }

        window.count += 1;
        if window.count > self.config.max_requests {
            debug!("Rate limiting {}: {} requests in window", caller, window.count);
            Decision::Limited
        } else {
            Decision::Allowed
        }
    }

    /// Drop counters whose window has expired.
    pub async fn prune_expired(&self) {
        let now = Instant::now();
        let mut clients = self.clients.write().await;
        clients.retain(|_, w| now.duration_since(w.started) < self.config.window);
    }

    /// Number of tracked callers.
    pub async fn tracked_callers(&self) -> usize {
        self.clients.read().await.len()
    }
}

impl Default for FixedWindowLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for FixedWindowLimiter {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            clients: self.clients.clone(),
        }
    }
}
