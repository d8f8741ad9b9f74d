use async_graphql::{Context, ErrorExtensions, InputObject, Object, Result as GqlResult, SimpleObject};
use axum::http::header::SET_COOKIE;

use crate::modules::auth::service::{Credentials, Registration, Session};
use crate::modules::users::inbound::graphql::GqlUser;
use crate::shared::core::request_context::{ACCESS_TOKEN_COOKIE, RequestContext};
use crate::shared::guards::policy::{Access, FieldPolicy};
use crate::shell::state::AppState;

pub const POLICIES: &[FieldPolicy] = &[
    FieldPolicy::mutation("register", Access::Public),
    FieldPolicy::mutation("login", Access::Public),
    FieldPolicy::query("me", Access::Authenticated),
];

#[derive(SimpleObject)]
pub struct AuthPayload {
    pub access_token: String,
    pub user: GqlUser,
}

#[derive(InputObject)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(InputObject)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

fn access_cookie(token: &str, max_age_seconds: i64) -> String {
    format!("{ACCESS_TOKEN_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age_seconds}")
}

fn start_session(context: &Context<'_>, session: Session) -> AuthPayload {
    let state = context.data_unchecked::<AppState>();
    let max_age = state.auth.jwt().ttl().num_seconds();
    context.insert_http_header(SET_COOKIE, access_cookie(&session.access_token, max_age));
    AuthPayload {
        access_token: session.access_token,
        user: session.user.into(),
    }
}

#[derive(Default)]
pub struct AuthQuery;

#[Object]
impl AuthQuery {
    async fn me(&self, context: &Context<'_>) -> GqlResult<GqlUser> {
        let caller = RequestContext::caller(context)?;
        let state = context.data_unchecked::<AppState>();
        let user = state.auth.me(caller).await.map_err(|e| e.extend())?;
        Ok(user.into())
    }
}

#[derive(Default)]
pub struct AuthMutation;

#[Object]
impl AuthMutation {
    async fn register(&self, context: &Context<'_>, input: RegisterInput) -> GqlResult<AuthPayload> {
        let state = context.data_unchecked::<AppState>();
        let session = state
            .auth
            .register(Registration {
                name: input.name,
                email: input.email,
                password: input.password,
            })
            .await
            .map_err(|e| e.extend())?;
        Ok(start_session(context, session))
    }

    async fn login(&self, context: &Context<'_>, input: LoginInput) -> GqlResult<AuthPayload> {
        let state = context.data_unchecked::<AppState>();
        let session = state
            .auth
            .login(Credentials {
                email: input.email,
                password: input.password,
            })
            .await
            .map_err(|e| e.extend())?;
        Ok(start_session(context, session))
    }
}
