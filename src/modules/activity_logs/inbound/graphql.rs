use async_graphql::{Context, ErrorExtensions, ID, Object, Result as GqlResult, SimpleObject};

use crate::modules::activity_logs::model::ActivityLog;
use crate::shared::core::identity::Role;
use crate::shared::guards::policy::{Access, FieldPolicy};
use crate::shared::infrastructure::connection::ChangeAction;
use crate::shared::infrastructure::connection::paginate::PageRequest;
use crate::shell::graphql::PageOf;
use crate::shell::state::AppState;

pub const POLICIES: &[FieldPolicy] = &[FieldPolicy::query(
    "activityLogs",
    Access::Roles(&[Role::Admin]),
)];

#[derive(SimpleObject, Clone)]
#[graphql(name = "ActivityLog")]
pub struct GqlActivityLog {
    pub id: ID,
    pub collection: String,
    pub action: ChangeAction,
    pub document_id: String,
    pub actor: Option<String>,
    pub occurred_at: i64,
}

impl From<ActivityLog> for GqlActivityLog {
    fn from(log: ActivityLog) -> Self {
        Self {
            id: ID(log.id),
            collection: log.collection,
            action: log.action,
            document_id: log.document_id,
            actor: log.actor,
            occurred_at: log.occurred_at,
        }
    }
}

pub type ActivityLogPage = PageOf<GqlActivityLog>;

#[derive(Default)]
pub struct ActivityLogsQuery;

#[Object]
impl ActivityLogsQuery {
    async fn activity_logs(
        &self,
        context: &Context<'_>,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> GqlResult<ActivityLogPage> {
        let state = context.data_unchecked::<AppState>();
        let logs = state
            .activity_logs
            .list(PageRequest::page(page, limit))
            .await
            .map_err(|e| e.extend())?;
        Ok(logs.into())
    }
}
