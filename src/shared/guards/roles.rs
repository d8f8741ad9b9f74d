use async_trait::async_trait;
use std::sync::Arc;

use crate::shared::core::errors::AppError;
use crate::shared::core::request_context::RequestContext;
use crate::shared::guards::operation::OperationSummary;
use crate::shared::guards::policy::OperationPolicies;
use crate::shared::guards::{Decision, Guard};

pub struct RolesGuard {
    policies: Arc<OperationPolicies>,
}

impl RolesGuard {
    pub fn new(policies: Arc<OperationPolicies>) -> Self {
        Self { policies }
    }
}

#[async_trait]
impl Guard for RolesGuard {
    fn name(&self) -> &'static str {
        "roles"
    }

    async fn check(&self, context: &mut RequestContext, operation: &OperationSummary) -> Decision {
        if !self.policies.has_role_requirements(operation) {
            return Decision::Allow;
        }
        let Some(user) = context.user() else {
            return Decision::Deny {
                reason: AppError::unauthenticated(),
            };
        };
        let denied = self.policies.denied_fields(operation, user);
        if denied.is_empty() {
            Decision::Allow
        } else {
            tracing::debug!(user = %user.id, role = %user.role, ?denied, "role check failed");
            Decision::Deny {
                reason: AppError::forbidden(),
            }
        }
    }
}
