use async_graphql::ErrorExtensions;
use thiserror::Error;

pub const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";

/// Client-facing error taxonomy. Every failure that reaches the gateway boundary is one of
/// these, so the formatter never has to guess the shape of a cause.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{message}")]
    Validation { path: String, message: String },

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    TooManyRequests(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::BadRequest(_) | AppError::Validation { .. } => 400,
            AppError::Unauthenticated(_) => 401,
            AppError::Forbidden(_) => 403,
            AppError::NotFound(_) => 404,
            AppError::Conflict(_) => 409,
            AppError::TooManyRequests(_) => 429,
            AppError::Internal(_) => 500,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) | AppError::Validation { .. } => "BAD_USER_INPUT",
            AppError::Unauthenticated(_) => "UNAUTHENTICATED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::TooManyRequests(_) => "TOO_MANY_REQUESTS",
            AppError::Internal(_) => INTERNAL_SERVER_ERROR,
        }
    }

    pub fn unauthenticated() -> Self {
        AppError::Unauthenticated("Unauthorized".into())
    }

    pub fn forbidden() -> Self {
        AppError::Forbidden("Forbidden resource".into())
    }

    pub fn too_many_requests() -> Self {
        AppError::TooManyRequests("ThrottlerException: Too Many Requests".into())
    }
}

impl ErrorExtensions for AppError {
    fn extend(&self) -> async_graphql::Error {
        let code = self.code();
        async_graphql::Error::new_with_source(self.clone())
            .extend_with(|_, extensions| extensions.set("code", code))
    }
}
