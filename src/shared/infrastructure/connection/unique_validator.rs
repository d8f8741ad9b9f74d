use serde_json::{Value, json};

use crate::shared::infrastructure::connection::model::ModelError;
use crate::shared::infrastructure::connection::{ConnectionPlugin, ModelExtensions};
use crate::shared::infrastructure::document_store::{
    Document, DocumentStore, ID_FIELD, filter_eq,
};

pub const DEFAULT_UNIQUE_MESSAGE: &str = "Error, expected {PATH} to be unique.";

/// Rejects writes whose unique paths collide with another document in the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueValidator {
    message: String,
}

impl Default for UniqueValidator {
    fn default() -> Self {
        Self::new(DEFAULT_UNIQUE_MESSAGE)
    }
}

impl ConnectionPlugin for UniqueValidator {
    fn attach(self, extensions: &mut ModelExtensions) {
        extensions.set_unique_validator(self);
    }
}

impl UniqueValidator {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message_for(&self, path: &str, value: &Value) -> String {
        let value = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        self.message
            .replace("{PATH}", path)
            .replace("{VALUE}", &value)
    }

    pub async fn validate(
        &self,
        store: &dyn DocumentStore,
        collection: &str,
        unique_paths: &[&str],
        document: &Document,
    ) -> Result<(), ModelError> {
        for path in unique_paths {
            let Some(value) = document.get(*path).filter(|v| !v.is_null()) else {
                continue;
            };
            let mut filter = filter_eq(path, value.clone());
            if let Some(id) = document.get(ID_FIELD) {
                filter.insert(ID_FIELD.to_string(), json!({ "$ne": id }));
            }
            if store.count(collection, &filter).await? > 0 {
                return Err(ModelError::Validation {
                    path: path.to_string(),
                    message: self.message_for(path, value),
                });
            }
        }
        Ok(())
    }
}
