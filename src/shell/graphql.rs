use async_graphql::{
    EmptySubscription, MergedObject, OutputType, SDLExportOptions, Schema, SimpleObject,
};

use crate::modules::activity_logs::inbound::graphql::{
    ActivityLogsQuery, GqlActivityLog, POLICIES as ACTIVITY_LOG_POLICIES,
};
use crate::modules::auth::inbound::graphql::{AuthMutation, AuthQuery, POLICIES as AUTH_POLICIES};
use crate::modules::users::inbound::graphql::{
    GqlUser, POLICIES as USER_POLICIES, UsersMutation, UsersQuery,
};
use crate::shared::guards::policy::OperationPolicies;
use crate::shared::infrastructure::connection::paginate::Page;
use crate::shared::pipes::trim::TrimArguments;
use crate::shell::state::AppState;

#[derive(MergedObject, Default)]
#[graphql(name = "Query")]
pub struct QueryRoot(UsersQuery, AuthQuery, ActivityLogsQuery);

#[derive(MergedObject, Default)]
#[graphql(name = "Mutation")]
pub struct MutationRoot(UsersMutation, AuthMutation);

/// One page of a paginated listing, as every module exposes it.
#[derive(SimpleObject)]
#[graphql(
    concrete(name = "UserPage", params(GqlUser)),
    concrete(name = "ActivityLogPage", params(GqlActivityLog))
)]
pub struct PageOf<T: OutputType> {
    pub docs: Vec<T>,
    pub total_docs: u64,
    pub limit: u64,
    pub page: u64,
    pub total_pages: u64,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    pub prev_page: Option<u64>,
    pub next_page: Option<u64>,
    pub paging_counter: u64,
}

impl<T, U> From<Page<T>> for PageOf<U>
where
    U: OutputType + From<T>,
{
    fn from(page: Page<T>) -> Self {
        let page = page.map(U::from);
        Self {
            docs: page.docs,
            total_docs: page.total_docs,
            limit: page.limit,
            page: page.page,
            total_pages: page.total_pages,
            has_prev_page: page.has_prev_page,
            has_next_page: page.has_next_page,
            prev_page: page.prev_page,
            next_page: page.next_page,
            paging_counter: page.paging_counter,
        }
    }
}

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(state: AppState) -> AppSchema {
    Schema::build(QueryRoot::default(), MutationRoot::default(), EmptySubscription)
        .data(state)
        .extension(TrimArguments)
        .finish()
}

/// Access rules contributed by every module mounted on the schema.
pub fn policies() -> OperationPolicies {
    OperationPolicies::new()
        .with(USER_POLICIES)
        .with(AUTH_POLICIES)
        .with(ACTIVITY_LOG_POLICIES)
}

/// SDL with fields, arguments and enum items sorted so the published schema is stable.
pub fn sorted_sdl(schema: &AppSchema) -> String {
    schema.sdl_with_options(
        SDLExportOptions::new()
            .sorted_fields()
            .sorted_arguments()
            .sorted_enum_items(),
    )
}

pub const LANDING_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <title>GraphQL API</title>
  </head>
  <body>
    <h1>GraphQL API</h1>
    <p>Send <code>POST</code> requests with a JSON body <code>{"query": "..."}</code> to <code>/graphql</code>.</p>
    <p>The schema is published at <a href="/schema.graphql">/schema.graphql</a>.</p>
  </body>
</html>
"#;
