use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::modules::users::model::User;
use crate::shared::core::errors::AppError;
use crate::shared::core::identity::{AuthUser, Role};
use crate::shared::infrastructure::connection::Connection;
use crate::shared::infrastructure::connection::model::Model;
use crate::shared::infrastructure::connection::paginate::{Page, PageRequest};
use crate::shared::infrastructure::document_store::{Document, SortBy, filter_eq};

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

pub fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("name should not be empty".into()));
    }
    Ok(())
}

pub struct UserService {
    users: Model<User>,
}

impl UserService {
    pub fn new(connection: &Connection) -> Self {
        Self {
            users: connection.model::<User>(),
        }
    }

    pub async fn list(&self, request: PageRequest) -> Result<Page<User>, AppError> {
        let request = request.sorted(SortBy::asc("createdAt"));
        Ok(self.users.paginate(&Document::new(), &request).await?)
    }

    pub async fn get(&self, id: &str) -> Result<User, AppError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let filter = filter_eq("email", Value::String(normalize_email(email)));
        Ok(self.users.find_one(&filter).await?)
    }

    pub async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        validate_name(&new_user.name)?;
        let now = Utc::now().timestamp_millis();
        let user = User {
            id: Uuid::now_v7().to_string(),
            name: new_user.name,
            email: normalize_email(&new_user.email),
            role: new_user.role,
            password_hash: new_user.password_hash,
            created_at: now,
            updated_at: now,
        };
        self.users.create(&user, Some(user.id.as_str())).await?;
        tracing::info!(user_id = %user.id, role = %user.role, "user created");
        Ok(user)
    }

    pub async fn update(
        &self,
        caller: &AuthUser,
        id: &str,
        changes: UserChanges,
    ) -> Result<User, AppError> {
        if !caller.can_access(id) {
            return Err(AppError::forbidden());
        }
        let mut user = self.get(id).await?;
        if let Some(name) = changes.name {
            validate_name(&name)?;
            user.name = name;
        }
        user.updated_at = Utc::now().timestamp_millis();
        if !self.users.save(&user, Some(caller.id.as_str())).await? {
            return Err(AppError::NotFound(format!("User {id} not found")));
        }
        Ok(user)
    }

    pub async fn delete(&self, caller: &AuthUser, id: &str) -> Result<User, AppError> {
        let user = self.get(id).await?;
        if !self.users.delete(id, Some(caller.id.as_str())).await? {
            return Err(AppError::NotFound(format!("User {id} not found")));
        }
        tracing::info!(user_id = %id, by = %caller.id, "user deleted");
        Ok(user)
    }
}
