//! Fixed-window request counter keyed by client IP.
//!
//! Each `(client_ip, window_index)` pair owns one counter in the
//! [`KeyValueStore`]. A request reads the counter, and only when admitted
//! writes `count + 1` back with a TTL of one window, so stale windows expire
//! on their own.
//!
//! The read and the write are two separate store calls. Two concurrent
//! requests from the same client can both read the same count and both write
//! `count + 1`, admitting more than `limit` requests in that window. Denied
//! requests never write, so they neither refresh the TTL nor register.

use std::sync::Arc;
use std::time::SystemTime;

use tracing::debug;

use crate::error::Result;
use crate::rate_limit_config::RateLimitPolicy;
use crate::rate_limit_key::RateLimitKey;
use crate::store::KeyValueStore;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Outcome of a single evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: u64,
}

impl RateDecision {
    pub fn allowed(remaining: u64) -> Self {
        Self {
            allowed: true,
            remaining,
        }
    }

    pub fn denied() -> Self {
        Self {
            allowed: false,
            remaining: 0,
        }
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn KeyValueStore>,
    policy: RateLimitPolicy,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn KeyValueStore>, policy: RateLimitPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    pub fn key_for(&self, client_ip: &str, now: SystemTime) -> RateLimitKey {
        RateLimitKey::new(client_ip, self.policy.window_index(now))
    }

    /// Decide whether `client_ip` may make a request at `now`, recording the
    /// request when it is admitted.
    pub async fn evaluate(&self, client_ip: &str, now: SystemTime) -> Result<RateDecision> {
        let key = self.key_for(client_ip, now).to_string();

        let count = self
            .store
            .get(&key)
            .await?
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(0);

        if count >= self.policy.limit {
            debug!(key = %key, count, limit = self.policy.limit, "Rate limit reached");
            return Ok(RateDecision::denied());
        }

        let next = count + 1;
        self.store
            .put(&key, &next.to_string(), self.policy.window)
            .await?;

        debug!(key = %key, count = next, limit = self.policy.limit, "Request admitted");
        Ok(RateDecision::allowed(self.policy.limit - next))
    }
}
