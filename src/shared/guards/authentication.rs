use async_trait::async_trait;
use std::sync::Arc;

use crate::shared::core::errors::AppError;
use crate::shared::core::identity::AuthUser;
use crate::shared::core::request_context::RequestContext;
use crate::shared::guards::operation::OperationSummary;
use crate::shared::guards::policy::OperationPolicies;
use crate::shared::guards::{Decision, Guard};

/// Turns a bearer token into a caller identity.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<AuthUser, AppError>;
}

/// Resolves the caller from the request and rejects protected operations without one.
/// A valid token on a public operation still attaches the caller.
pub struct AuthenticationGuard {
    verifier: Arc<dyn TokenVerifier>,
    policies: Arc<OperationPolicies>,
}

impl AuthenticationGuard {
    pub fn new(verifier: Arc<dyn TokenVerifier>, policies: Arc<OperationPolicies>) -> Self {
        Self { verifier, policies }
    }
}

#[async_trait]
impl Guard for AuthenticationGuard {
    fn name(&self) -> &'static str {
        "authentication"
    }

    async fn check(&self, context: &mut RequestContext, operation: &OperationSummary) -> Decision {
        let verified = context.access_token().map(|token| self.verifier.verify(token));
        match verified {
            Some(Ok(user)) => {
                context.set_user(user);
                Decision::Allow
            }
            _ if !self.policies.requires_authentication(operation) => Decision::Allow,
            Some(Err(reason)) => Decision::Deny { reason },
            None => Decision::Deny {
                reason: AppError::unauthenticated(),
            },
        }
    }
}
