use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use thiserror::Error;

use crate::shared::core::errors::AppError;
use crate::shared::infrastructure::connection::paginate::{Page, PageRequest};
use crate::shared::infrastructure::connection::unique_validator::UniqueValidator;
use crate::shared::infrastructure::connection::{Change, ChangeAction, Connection};
use crate::shared::infrastructure::document_store::{
    Document, FindOptions, ID_FIELD, StoreError, filter_eq,
};

/// Static description of a collection: its name and the paths that must stay unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSchema {
    pub collection: &'static str,
    pub unique_paths: &'static [&'static str],
}

/// A persisted type. The id must serialize as `_id`.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    const SCHEMA: ModelSchema;

    fn id(&self) -> &str;
}

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("{message}")]
    Validation { path: String, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("{0} plugin is not attached to the connection")]
    PluginMissing(&'static str),
}

impl From<ModelError> for AppError {
    fn from(error: ModelError) -> Self {
        match error {
            ModelError::Validation { path, message } => AppError::Validation { path, message },
            other => {
                tracing::error!(error = %other, "model operation failed");
                AppError::Internal("Internal server error".into())
            }
        }
    }
}

/// Typed access to one collection, carrying the connection's plugins.
pub struct Model<T> {
    connection: Connection,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Model<T> {
    pub(crate) fn new(connection: Connection) -> Self {
        Self {
            connection,
            _entity: PhantomData,
        }
    }

    pub fn collection(&self) -> &'static str {
        T::SCHEMA.collection
    }

    pub async fn create(&self, entity: &T, actor: Option<&str>) -> Result<(), ModelError> {
        let document = to_document(entity)?;
        self.validate(&document).await?;
        self.connection
            .store()
            .insert_one(self.collection(), document.clone())
            .await
            .map_err(|error| self.duplicate_as_validation(error, &document))?;
        self.after_write(ChangeAction::Create, entity.id(), actor).await;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<T>, ModelError> {
        self.find_one(&filter_eq(ID_FIELD, id)).await
    }

    pub async fn find_one(&self, filter: &Document) -> Result<Option<T>, ModelError> {
        let options = FindOptions {
            limit: Some(1),
            ..FindOptions::default()
        };
        let found = self.find(filter, &options).await?;
        Ok(found.into_iter().next())
    }

    pub async fn find(&self, filter: &Document, options: &FindOptions) -> Result<Vec<T>, ModelError> {
        self.connection
            .store()
            .find(self.collection(), filter, options)
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    pub async fn count(&self, filter: &Document) -> Result<u64, ModelError> {
        Ok(self.connection.store().count(self.collection(), filter).await?)
    }

    /// Replaces the stored fields of `entity`. Returns false when no document has its id.
    pub async fn save(&self, entity: &T, actor: Option<&str>) -> Result<bool, ModelError> {
        let mut document = to_document(entity)?;
        self.validate(&document).await?;
        document.remove(ID_FIELD);
        let matched = self
            .connection
            .store()
            .update_one(self.collection(), &filter_eq(ID_FIELD, entity.id()), document.clone())
            .await
            .map_err(|error| self.duplicate_as_validation(error, &document))?;
        if matched == 0 {
            return Ok(false);
        }
        self.after_write(ChangeAction::Update, entity.id(), actor).await;
        Ok(true)
    }

    pub async fn delete(&self, id: &str, actor: Option<&str>) -> Result<bool, ModelError> {
        let deleted = self
            .connection
            .store()
            .delete_one(self.collection(), &filter_eq(ID_FIELD, id))
            .await?;
        if deleted == 0 {
            return Ok(false);
        }
        self.after_write(ChangeAction::Delete, id, actor).await;
        Ok(true)
    }

    pub async fn paginate(
        &self,
        filter: &Document,
        request: &PageRequest,
    ) -> Result<Page<T>, ModelError> {
        let paginate = self
            .connection
            .extensions()
            .pagination()
            .ok_or(ModelError::PluginMissing("pagination"))?;
        let window = paginate.window(request);
        let total_docs = self.count(filter).await?;
        let options = FindOptions {
            skip: window.skip,
            limit: Some(window.limit),
            sort: request.sort.clone(),
        };
        let docs = self.find(filter, &options).await?;
        Ok(Page::new(docs, total_docs, window))
    }

    async fn validate(&self, document: &Document) -> Result<(), ModelError> {
        let Some(validator) = self.connection.extensions().unique_validator() else {
            return Ok(());
        };
        validator
            .validate(
                self.connection.store(),
                self.collection(),
                T::SCHEMA.unique_paths,
                document,
            )
            .await
    }

    /// The unique index catches writes that raced past `validate`; they surface the same way.
    fn duplicate_as_validation(&self, error: StoreError, document: &Document) -> ModelError {
        let StoreError::DuplicateKey { path } = error else {
            return error.into();
        };
        let value = document.get(&path).cloned().unwrap_or(Value::Null);
        let message = match self.connection.extensions().unique_validator() {
            Some(validator) => validator.message_for(&path, &value),
            None => UniqueValidator::default().message_for(&path, &value),
        };
        ModelError::Validation { path, message }
    }

    async fn after_write(&self, action: ChangeAction, document_id: &str, actor: Option<&str>) {
        let change = Change {
            collection: self.collection(),
            action,
            document_id,
            actor,
        };
        for hook in self.connection.extensions().hooks() {
            if let Err(error) = hook.after_write(self.connection.store(), &change).await {
                tracing::warn!(
                    collection = change.collection,
                    document_id,
                    ?action,
                    %error,
                    "write hook failed"
                );
            }
        }
    }
}

fn to_document<T: Serialize>(entity: &T) -> Result<Document, ModelError> {
    match serde_json::to_value(entity) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(other) => Err(ModelError::Serialization(format!(
            "expected an object, got {other}"
        ))),
        Err(e) => Err(ModelError::Serialization(e.to_string())),
    }
}

fn from_document<T: DeserializeOwned>(document: Document) -> Result<T, ModelError> {
    serde_json::from_value(Value::Object(document))
        .map_err(|e| ModelError::Serialization(e.to_string()))
}
