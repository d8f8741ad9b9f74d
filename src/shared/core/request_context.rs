use async_graphql::{Context, ErrorExtensions, Result as GqlResult};
use axum::extract::ConnectInfo;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use std::net::{IpAddr, SocketAddr};

use crate::shared::core::errors::AppError;
use crate::shared::core::identity::AuthUser;

/// Proxy headers consulted for the client address, highest priority first.
const CLIENT_IP_HEADERS: &[&str] = &["cf-connecting-ip", "x-real-ip", "x-forwarded-for"];

pub const ANONYMOUS_CLIENT: &str = "anonymous";
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Everything a guard or resolver may know about the HTTP exchange it serves.
///
/// Built once per request by the GraphQL handler, mutated by the guard chain (caller
/// identity, rate-limit headers) and then handed to the schema as request data.
#[derive(Debug, Clone)]
pub struct RequestContext {
    headers: HeaderMap,
    client_key: String,
    user: Option<AuthUser>,
    response_headers: HeaderMap,
}

impl RequestContext {
    pub fn new(headers: HeaderMap, client_key: impl Into<String>) -> Self {
        Self {
            headers,
            client_key: client_key.into(),
            user: None,
            response_headers: HeaderMap::new(),
        }
    }

    /// Keys the client by its socket peer. Proxy headers count only when that peer is
    /// one of `trusted_proxies`.
    pub fn from_parts(parts: &Parts, trusted_proxies: &[IpAddr]) -> Self {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip());
        let client = match peer {
            Some(peer) if trusted_proxies.contains(&peer) => {
                Some(client_ip(&parts.headers).unwrap_or(peer))
            }
            other => other,
        };
        let client_key = client
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| ANONYMOUS_CLIENT.to_string());
        Self::new(parts.headers.clone(), client_key)
    }

    /// The context the gateway attached to the executing request.
    pub fn of<'a>(ctx: &Context<'a>) -> GqlResult<&'a RequestContext> {
        ctx.data::<RequestContext>()
    }

    /// The authenticated caller of the executing request, as a GraphQL error when absent.
    pub fn caller<'a>(ctx: &Context<'a>) -> GqlResult<&'a AuthUser> {
        Self::of(ctx)?.require_user().map_err(|e| e.extend())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|raw| raw.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    /// Access token from `Authorization: Bearer`, falling back to the auth cookie.
    pub fn access_token(&self) -> Option<&str> {
        self.header(AUTHORIZATION.as_str())
            .and_then(|value| {
                value
                    .strip_prefix("Bearer ")
                    .or_else(|| value.strip_prefix("bearer "))
            })
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .or_else(|| self.cookie(ACCESS_TOKEN_COOKIE))
    }

    pub fn client_key(&self) -> &str {
        &self.client_key
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    pub fn require_user(&self) -> Result<&AuthUser, AppError> {
        self.user.as_ref().ok_or_else(AppError::unauthenticated)
    }

    pub fn set_user(&mut self, user: AuthUser) {
        self.user = Some(user);
    }

    pub fn insert_response_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.response_headers.insert(name, value);
    }

    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    pub fn take_response_headers(&mut self) -> HeaderMap {
        std::mem::take(&mut self.response_headers)
    }
}

fn client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    CLIENT_IP_HEADERS.iter().find_map(|header| {
        headers
            .get(*header)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(str::trim)
            .and_then(|ip| ip.parse::<IpAddr>().ok())
    })
}
