use async_trait::async_trait;
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderName, HeaderValue};
use std::sync::Arc;
use std::time::Duration;

use crate::shared::core::errors::AppError;
use crate::shared::core::request_context::RequestContext;
use crate::shared::guards::operation::OperationSummary;
use crate::shared::guards::{Decision, Guard};
use crate::shared::infrastructure::rate_limiter::{RateDecision, SlidingWindowLimiter};

pub const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Counts every GraphQL operation against the caller's client key.
pub struct ThrottlerGuard {
    limiter: Arc<SlidingWindowLimiter>,
}

impl ThrottlerGuard {
    pub fn new(limiter: Arc<SlidingWindowLimiter>) -> Self {
        Self { limiter }
    }
}

fn whole_seconds(duration: Duration) -> HeaderValue {
    HeaderValue::from(duration.as_millis().div_ceil(1000) as u64)
}

#[async_trait]
impl Guard for ThrottlerGuard {
    fn name(&self) -> &'static str {
        "throttler"
    }

    async fn check(&self, context: &mut RequestContext, _operation: &OperationSummary) -> Decision {
        let decision = self.limiter.hit(context.client_key()).await;
        context.insert_response_header(RATE_LIMIT_LIMIT, HeaderValue::from(self.limiter.limit()));
        match decision {
            RateDecision::Allowed {
                remaining,
                reset_after,
            } => {
                context.insert_response_header(RATE_LIMIT_REMAINING, HeaderValue::from(remaining));
                context.insert_response_header(RATE_LIMIT_RESET, whole_seconds(reset_after));
                Decision::Allow
            }
            RateDecision::Limited { retry_after } => {
                tracing::warn!(client = context.client_key(), "rate limit exceeded");
                context.insert_response_header(RATE_LIMIT_REMAINING, HeaderValue::from(0u32));
                context.insert_response_header(RATE_LIMIT_RESET, whole_seconds(retry_after));
                context.insert_response_header(RETRY_AFTER, whole_seconds(retry_after));
                Decision::Deny {
                    reason: AppError::too_many_requests(),
                }
            }
        }
    }
}
