use std::collections::HashMap;

use crate::shared::core::identity::{AuthUser, Role};
use crate::shared::guards::operation::{OperationKind, OperationSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Roles(&'static [Role]),
}

/// One row of a module's access table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPolicy {
    pub kind: OperationKind,
    pub field: &'static str,
    pub access: Access,
}

impl FieldPolicy {
    pub const fn query(field: &'static str, access: Access) -> Self {
        Self {
            kind: OperationKind::Query,
            field,
            access,
        }
    }

    pub const fn mutation(field: &'static str, access: Access) -> Self {
        Self {
            kind: OperationKind::Mutation,
            field,
            access,
        }
    }
}

/// Access rules for every root field of the schema. Fields nobody declared need a caller.
#[derive(Debug, Clone, Default)]
pub struct OperationPolicies {
    rules: HashMap<(OperationKind, &'static str), Access>,
}

impl OperationPolicies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, policies: &[FieldPolicy]) -> Self {
        for policy in policies {
            self.rules.insert((policy.kind, policy.field), policy.access);
        }
        self
    }

    pub fn access(&self, kind: OperationKind, field: &str) -> Access {
        if field.starts_with("__") {
            return Access::Public;
        }
        self.rules
            .get(&(kind, field))
            .copied()
            .unwrap_or(Access::Authenticated)
    }

    pub fn requires_authentication(&self, operation: &OperationSummary) -> bool {
        operation
            .fields
            .iter()
            .any(|field| self.access(operation.kind, field) != Access::Public)
    }

    /// Fields whose role requirement `user` does not meet.
    pub fn denied_fields<'a>(
        &self,
        operation: &'a OperationSummary,
        user: &AuthUser,
    ) -> Vec<&'a str> {
        operation
            .fields
            .iter()
            .filter(|field| match self.access(operation.kind, field) {
                Access::Roles(roles) => !roles.contains(&user.role),
                _ => false,
            })
            .map(String::as_str)
            .collect()
    }

    pub fn has_role_requirements(&self, operation: &OperationSummary) -> bool {
        operation
            .fields
            .iter()
            .any(|field| matches!(self.access(operation.kind, field), Access::Roles(_)))
    }
}
