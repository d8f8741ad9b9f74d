use std::sync::Arc;

use crate::modules::activity_logs::model::ActivityLog;
use crate::modules::activity_logs::service::ActivityLogService;
use crate::modules::auth::jwt::JwtCodec;
use crate::modules::auth::service::AuthService;
use crate::modules::users::model::User;
use crate::modules::users::service::UserService;
use crate::shared::guards::GuardChain;
use crate::shared::guards::authentication::AuthenticationGuard;
use crate::shared::guards::roles::RolesGuard;
use crate::shared::guards::throttler::ThrottlerGuard;
use crate::shared::infrastructure::connection::Connection;
use crate::shared::infrastructure::connection::lifecycle::{
    LifecycleTracker, database_name_from_uri,
};
use crate::shared::infrastructure::connection::paginate::Paginate;
use crate::shared::infrastructure::connection::unique_validator::UniqueValidator;
use crate::shared::infrastructure::document_store::{DocumentStore, StoreError};
use crate::shared::infrastructure::document_store::in_memory::InMemoryDocumentStore;
use crate::shared::infrastructure::document_store::mongo::MongoDocumentStore;
use crate::shared::infrastructure::rate_limiter::SlidingWindowLimiter;
use crate::shell::config::AppConfig;
use crate::shell::graphql::{build_schema, policies, sorted_sdl};
use crate::shell::state::{AppState, ServerState};

/// URIs with this scheme run against the in-process store.
pub const MEMORY_SCHEME: &str = "memory://";

/// Opens the one shared connection with every plugin attached and every model indexed.
pub async fn connect(uri: &str) -> Result<Connection, StoreError> {
    let lifecycle = LifecycleTracker::new(database_name_from_uri(uri));
    let store: Arc<dyn DocumentStore> = if uri.starts_with(MEMORY_SCHEME) {
        Arc::new(InMemoryDocumentStore::new())
    } else {
        Arc::new(MongoDocumentStore::connect(uri, lifecycle.clone()).await?)
    };
    Connection::builder(store, lifecycle)
        .plugin(Paginate::default())
        .plugin(UniqueValidator::default())
        .plugin(ActivityLogService::apply)
        .with_model::<User>()
        .with_model::<ActivityLog>()
        .open()
        .await
}

pub fn server_state(config: &AppConfig, connection: &Connection) -> ServerState {
    let jwt = Arc::new(JwtCodec::new(&config.jwt_secret, config.jwt_ttl_minutes));
    let users = Arc::new(UserService::new(connection));
    let auth = Arc::new(AuthService::new(
        users.clone(),
        jwt.clone(),
        config.bootstrap_admin_email.clone(),
    ));
    let activity_logs = Arc::new(ActivityLogService::new(connection));

    let schema = build_schema(AppState {
        users,
        auth,
        activity_logs,
    });
    let policies = Arc::new(policies());
    let limiter = Arc::new(SlidingWindowLimiter::new(
        config.throttle_ttl,
        config.throttle_limit,
    ));
    let guards = GuardChain::new()
        .with(ThrottlerGuard::new(limiter.clone()))
        .with(AuthenticationGuard::new(jwt, policies.clone()))
        .with(RolesGuard::new(policies));
    tracing::debug!(guards = ?guards.names(), "guard chain ready");

    ServerState {
        sdl: sorted_sdl(&schema).into(),
        schema,
        guards,
        limiter,
        trusted_proxies: config.trusted_proxies.as_slice().into(),
    }
}
