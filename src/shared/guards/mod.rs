// Global guard chain run before any resolver.
//
// Responsibilities
// - Run every guard in registration order against the request context and the operation.
// - Stop at the first denial; the denial's reason is the only error the client sees.
//
// Registration order is throttle, then authentication, then roles.

pub mod authentication;
pub mod operation;
pub mod policy;
pub mod roles;
pub mod throttler;

use async_trait::async_trait;
use std::sync::Arc;

use crate::shared::core::errors::AppError;
use crate::shared::core::request_context::RequestContext;
use crate::shared::guards::operation::OperationSummary;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny { reason: AppError },
}

#[async_trait]
pub trait Guard: Send + Sync {
    fn name(&self) -> &'static str;

    async fn check(&self, context: &mut RequestContext, operation: &OperationSummary) -> Decision;
}

#[derive(Clone, Default)]
pub struct GuardChain {
    guards: Vec<Arc<dyn Guard>>,
}

impl GuardChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, guard: impl Guard + 'static) -> Self {
        self.guards.push(Arc::new(guard));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.guards.iter().map(|guard| guard.name()).collect()
    }

    pub async fn run(
        &self,
        context: &mut RequestContext,
        operation: &OperationSummary,
    ) -> Result<(), AppError> {
        for guard in &self.guards {
            if let Decision::Deny { reason } = guard.check(context, operation).await {
                tracing::debug!(
                    guard = guard.name(),
                    client = context.client_key(),
                    fields = ?operation.fields,
                    %reason,
                    "operation denied"
                );
                return Err(reason);
            }
        }
        Ok(())
    }
}
