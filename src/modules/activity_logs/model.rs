use serde::{Deserialize, Serialize};

use crate::shared::infrastructure::connection::ChangeAction;
use crate::shared::infrastructure::connection::model::{Entity, ModelSchema};

pub const ACTIVITY_LOG_COLLECTION: &str = "activitylogs";

/// One audited write on some other collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    #[serde(rename = "_id")]
    pub id: String,
    pub collection: String,
    pub action: ChangeAction,
    pub document_id: String,
    pub actor: Option<String>,
    pub occurred_at: i64,
}

impl Entity for ActivityLog {
    const SCHEMA: ModelSchema = ModelSchema {
        collection: ACTIVITY_LOG_COLLECTION,
        unique_paths: &[],
    };

    fn id(&self) -> &str {
        &self.id
    }
}
