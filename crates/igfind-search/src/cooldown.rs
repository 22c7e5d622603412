//! Process-wide rate-limit cooldown shared by every discovery worker.
//!
//! When any upstream answers "too many requests", the cooldown is tripped
//! and every worker waits it out before starting new outbound work. The
//! deadline only ever moves forward, so concurrent trips cannot shorten it.
//! A single trip never lasts longer than the configured maximum.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::error::SearchError;

#[derive(Debug, Clone)]
pub struct RateLimitCooldown {
    until: Arc<Mutex<Option<Instant>>>,
    default_duration: Duration,
    max_duration: Duration,
}

const DEFAULT_MAX_DURATION: Duration = Duration::from_secs(15 * 60);

impl RateLimitCooldown {
    /// `default_duration` is used when the upstream gave no `Retry-After`.
    #[must_use]
    pub fn new(default_duration: Duration) -> Self {
        Self {
            until: Arc::new(Mutex::new(None)),
            default_duration,
            max_duration: DEFAULT_MAX_DURATION.max(default_duration),
        }
    }

    /// Cap every trip at `max_duration` (never below the default duration).
    #[must_use]
    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = max_duration.max(self.default_duration);
        self
    }

    /// Extend the cooldown to at least `now + duration`, clamped to the
    /// maximum.
    pub fn trip(&self, duration: Duration) {
        let duration = duration.min(self.max_duration);
        let Some(candidate) = Instant::now().checked_add(duration) else {
            tracing::warn!(
                cooldown_secs = duration.as_secs(),
                "cooldown deadline out of range, ignoring"
            );
            return;
        };
        let mut until = self.until.lock().unwrap_or_else(PoisonError::into_inner);
        if until.is_none_or(|current| candidate > current) {
            *until = Some(candidate);
            tracing::warn!(
                cooldown_secs = duration.as_secs(),
                "rate limit signalled, pausing new work"
            );
        }
    }

    /// Trip the cooldown if `err` is a rate-limit signal. Returns whether it did.
    pub fn observe(&self, err: &SearchError) -> bool {
        if !err.is_rate_limited() {
            return false;
        }
        let duration = err
            .retry_after_secs()
            .filter(|secs| *secs > 0)
            .map_or(self.default_duration, Duration::from_secs);
        self.trip(duration);
        true
    }

    /// Time left before new work may start, or `None` if not cooling down.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        let until = *self.until.lock().unwrap_or_else(PoisonError::into_inner);
        until
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .filter(|left| !left.is_zero())
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.remaining().is_some()
    }

    /// Sleep until no cooldown is in effect. Re-checks after each sleep since
    /// another worker may have extended the deadline meanwhile.
    pub async fn wait_ready(&self) {
        while let Some(left) = self.remaining() {
            tracing::debug!(wait_ms = left.as_millis(), "waiting for rate-limit cooldown");
            tokio::time::sleep(left).await;
        }
    }
}

impl Default for RateLimitCooldown {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}
