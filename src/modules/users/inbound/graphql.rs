use async_graphql::{Context, ErrorExtensions, ID, InputObject, Object, Result as GqlResult, SimpleObject};

use crate::modules::users::model::User;
use crate::modules::users::service::UserChanges;
use crate::shared::core::identity::Role;
use crate::shared::core::request_context::RequestContext;
use crate::shared::guards::policy::{Access, FieldPolicy};
use crate::shared::infrastructure::connection::paginate::PageRequest;
use crate::shell::graphql::PageOf;
use crate::shell::state::AppState;

const ADMIN_ONLY: &[Role] = &[Role::Admin];

pub const POLICIES: &[FieldPolicy] = &[
    FieldPolicy::query("users", Access::Roles(ADMIN_ONLY)),
    FieldPolicy::query("user", Access::Authenticated),
    FieldPolicy::mutation("updateUser", Access::Authenticated),
    FieldPolicy::mutation("deleteUser", Access::Roles(ADMIN_ONLY)),
];

#[derive(SimpleObject, Clone)]
#[graphql(name = "User")]
pub struct GqlUser {
    pub id: ID,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<User> for GqlUser {
    fn from(u: User) -> Self {
        Self {
            id: ID(u.id),
            name: u.name,
            email: u.email,
            role: u.role,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

pub type UserPage = PageOf<GqlUser>;

#[derive(InputObject)]
pub struct UpdateUserInput {
    pub name: Option<String>,
}

#[derive(Default)]
pub struct UsersQuery;

#[Object]
impl UsersQuery {
    async fn users(
        &self,
        context: &Context<'_>,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> GqlResult<UserPage> {
        let state = context.data_unchecked::<AppState>();
        let users = state
            .users
            .list(PageRequest::page(page, limit))
            .await
            .map_err(|e| e.extend())?;
        Ok(users.into())
    }

    async fn user(&self, context: &Context<'_>, id: ID) -> GqlResult<GqlUser> {
        let state = context.data_unchecked::<AppState>();
        let user = state.users.get(&id).await.map_err(|e| e.extend())?;
        Ok(user.into())
    }
}

#[derive(Default)]
pub struct UsersMutation;

#[Object]
impl UsersMutation {
    async fn update_user(
        &self,
        context: &Context<'_>,
        id: ID,
        input: UpdateUserInput,
    ) -> GqlResult<GqlUser> {
        let caller = RequestContext::caller(context)?;
        let state = context.data_unchecked::<AppState>();
        let changes = UserChanges { name: input.name };
        let user = state
            .users
            .update(caller, &id, changes)
            .await
            .map_err(|e| e.extend())?;
        Ok(user.into())
    }

    async fn delete_user(&self, context: &Context<'_>, id: ID) -> GqlResult<GqlUser> {
        let caller = RequestContext::caller(context)?;
        let state = context.data_unchecked::<AppState>();
        let user = state
            .users
            .delete(caller, &id)
            .await
            .map_err(|e| e.extend())?;
        Ok(user.into())
    }
}
