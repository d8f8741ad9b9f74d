use serde::{Deserialize, Serialize};

use crate::shared::core::identity::{AuthUser, Role};
use crate::shared::infrastructure::connection::model::{Entity, ModelSchema};

pub const USER_COLLECTION: &str = "users";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Entity for User {
    const SCHEMA: ModelSchema = ModelSchema {
        collection: USER_COLLECTION,
        unique_paths: &["email"],
    };

    fn id(&self) -> &str {
        &self.id
    }
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}
