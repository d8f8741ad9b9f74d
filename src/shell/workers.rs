use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval};

use crate::shared::infrastructure::rate_limiter::SlidingWindowLimiter;

/// Periodically forgets clients that have been idle for a whole window.
pub fn spawn_rate_limit_sweeper(limiter: Arc<SlidingWindowLimiter>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(limiter.window());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            limiter.prune(Instant::now()).await;
            let keys = limiter.tracked_keys().await;
            tracing::trace!(keys, "rate limiter swept");
        }
    })
}
