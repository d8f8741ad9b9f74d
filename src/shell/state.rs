use std::net::IpAddr;
use std::sync::Arc;

use crate::modules::activity_logs::service::ActivityLogService;
use crate::modules::auth::service::AuthService;
use crate::modules::users::service::UserService;
use crate::shared::guards::GuardChain;
use crate::shared::infrastructure::rate_limiter::SlidingWindowLimiter;
use crate::shell::graphql::AppSchema;

/// Services resolvers reach through the schema data.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub auth: Arc<AuthService>,
    pub activity_logs: Arc<ActivityLogService>,
}

/// What the HTTP layer needs per request.
#[derive(Clone)]
pub struct ServerState {
    pub schema: AppSchema,
    pub guards: GuardChain,
    pub limiter: Arc<SlidingWindowLimiter>,
    pub sdl: Arc<str>,
    pub trusted_proxies: Arc<[IpAddr]>,
}
