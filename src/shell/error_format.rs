// Single formatting boundary for every error a client can receive.
//
// Guard denials, parse and validation failures and resolver errors all leave the gateway as
// `{ path, error, message, status, statusCode }`. A typed `AppError` source, when present,
// supplies the message and the status code; the `code` extension wins for `status`.

use async_graphql::{ErrorExtensions, PathSegment, Pos, ServerError, Value as GqlValue};
use serde::Serialize;
use serde_json::Value;

use crate::shared::core::errors::{AppError, INTERNAL_SERVER_ERROR};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,
    pub error: String,
    pub message: String,
    pub status: String,
    pub status_code: Option<u16>,
}

impl FormattedError {
    pub fn from_server_error(error: &ServerError) -> Self {
        let cause = error.source::<AppError>();
        let code = error
            .extensions
            .as_ref()
            .and_then(|extensions| extensions.get("code"))
            .and_then(|code| match code {
                GqlValue::String(code) => Some(code.clone()),
                _ => None,
            });

        let path = (!error.path.is_empty()).then(|| {
            error
                .path
                .iter()
                .map(|segment| match segment {
                    PathSegment::Field(name) => Value::String(name.clone()),
                    PathSegment::Index(index) => Value::from(*index),
                })
                .collect()
        });

        Self {
            path,
            error: error.message.clone(),
            message: cause
                .map(ToString::to_string)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| error.message.clone()),
            status: code
                .or_else(|| cause.map(|c| c.code().to_string()))
                .unwrap_or_else(|| INTERNAL_SERVER_ERROR.to_string()),
            status_code: cause.map(AppError::status_code),
        }
    }

    /// Errors raised before execution starts, such as guard denials.
    pub fn from_app_error(error: &AppError) -> Self {
        Self::from_server_error(&error.extend().into_server_error(Pos::default()))
    }
}

pub fn format_errors(errors: &[ServerError]) -> Vec<FormattedError> {
    errors.iter().map(FormattedError::from_server_error).collect()
}
