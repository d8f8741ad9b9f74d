// Audit trail for every write made through the shared connection.
//
// `ActivityLogService::apply` is the connection plugin: it registers a write hook that
// records one `ActivityLog` per create, update or delete on any other collection.
// The hook writes straight to the store so that audit rows are never audited themselves.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::modules::activity_logs::model::{ACTIVITY_LOG_COLLECTION, ActivityLog};
use crate::shared::core::errors::AppError;
use crate::shared::infrastructure::connection::model::Model;
use crate::shared::infrastructure::connection::paginate::{Page, PageRequest};
use crate::shared::infrastructure::connection::{Change, Connection, ModelExtensions, ModelHook};
use crate::shared::infrastructure::document_store::{Document, DocumentStore, SortBy, StoreError};

pub struct ActivityLogService {
    logs: Model<ActivityLog>,
}

impl ActivityLogService {
    pub fn apply(extensions: &mut ModelExtensions) {
        extensions.add_hook(Arc::new(ActivityLogHook));
    }

    pub fn new(connection: &Connection) -> Self {
        Self {
            logs: connection.model::<ActivityLog>(),
        }
    }

    pub async fn list(&self, request: PageRequest) -> Result<Page<ActivityLog>, AppError> {
        let request = request.sorted(SortBy::desc("occurredAt"));
        Ok(self.logs.paginate(&Document::new(), &request).await?)
    }
}

struct ActivityLogHook;

#[async_trait]
impl ModelHook for ActivityLogHook {
    async fn after_write(
        &self,
        store: &dyn DocumentStore,
        change: &Change<'_>,
    ) -> Result<(), StoreError> {
        if change.collection == ACTIVITY_LOG_COLLECTION {
            return Ok(());
        }
        let entry = ActivityLog {
            id: Uuid::now_v7().to_string(),
            collection: change.collection.to_string(),
            action: change.action,
            document_id: change.document_id.to_string(),
            actor: change.actor.map(str::to_string),
            occurred_at: Utc::now().timestamp_millis(),
        };
        let Value::Object(document) =
            serde_json::to_value(&entry).map_err(|e| StoreError::Malformed(e.to_string()))?
        else {
            return Err(StoreError::Malformed("activity log is not an object".into()));
        };
        store.insert_one(ACTIVITY_LOG_COLLECTION, document).await?;
        tracing::debug!(
            collection = change.collection,
            action = ?change.action,
            document_id = change.document_id,
            "activity recorded"
        );
        Ok(())
    }
}
