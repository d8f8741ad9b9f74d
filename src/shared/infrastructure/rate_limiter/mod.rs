// Sliding-window rate limiter keyed by client.
//
// Each key keeps the instants of its accepted hits inside the window. A hit is accepted
// while fewer than `limit` hits remain inside `window`; rejected hits are not recorded.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub const DEFAULT_WINDOW: Duration = Duration::from_millis(60_000);
pub const DEFAULT_LIMIT: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32, reset_after: Duration },
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

pub struct SlidingWindowLimiter {
    window: Duration,
    limit: u32,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl Default for SlidingWindowLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_LIMIT)
    }
}

impl SlidingWindowLimiter {
    pub fn new(window: Duration, limit: u32) -> Self {
        Self {
            window,
            limit,
            hits: Mutex::new(HashMap::new()),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub async fn hit(&self, key: &str) -> RateDecision {
        self.hit_at(key, Instant::now()).await
    }

    pub async fn hit_at(&self, key: &str, now: Instant) -> RateDecision {
        let mut hits = self.hits.lock().await;
        let log = hits.entry(key.to_string()).or_default();
        while let Some(oldest) = log.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                log.pop_front();
            } else {
                break;
            }
        }

        let until_oldest_expires = |log: &VecDeque<Instant>| {
            log.front()
                .map(|oldest| (*oldest + self.window).saturating_duration_since(now))
                .unwrap_or(self.window)
        };

        if log.len() >= self.limit as usize {
            return RateDecision::Limited {
                retry_after: until_oldest_expires(log),
            };
        }
        log.push_back(now);
        RateDecision::Allowed {
            remaining: self.limit - log.len() as u32,
            reset_after: until_oldest_expires(log),
        }
    }

    /// Drops keys whose every hit has left the window.
    pub async fn prune(&self, now: Instant) {
        let window = self.window;
        self.hits.lock().await.retain(|_, log| {
            log.back()
                .is_some_and(|latest| now.saturating_duration_since(*latest) < window)
        });
    }

    pub async fn tracked_keys(&self) -> usize {
        self.hits.lock().await.len()
    }
}
