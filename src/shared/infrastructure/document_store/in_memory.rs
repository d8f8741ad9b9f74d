// In memory implementation of the DocumentStore port.
//
// Purpose
// - Support model, service and end to end tests without a database.
// - Back `memory://` URIs for local development.
//
// Unique indexes are checked under the collection write lock, so concurrent writers
// observe the same guarantee a MongoDB unique index gives.

use crate::shared::infrastructure::document_store::{
    Document, DocumentStore, FindOptions, StoreError, compare_values, matches,
};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Collection {
    documents: Vec<Document>,
    unique_paths: Vec<String>,
}

impl Collection {
    /// First unique path on which `candidate` collides with a document other than `skip`.
    fn clash(&self, candidate: &Document, skip: Option<usize>) -> Option<&str> {
        self.unique_paths.iter().map(String::as_str).find(|path| {
            let Some(value) = candidate.get(*path).filter(|v| !v.is_null()) else {
                return false;
            };
            self.documents
                .iter()
                .enumerate()
                .any(|(index, other)| Some(index) != skip && other.get(*path) == Some(value))
        })
    }
}

fn duplicate(path: &str) -> StoreError {
    StoreError::DuplicateKey {
        path: path.to_string(),
    }
}

#[derive(Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
    is_offline: bool,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_offline(&mut self) {
        self.is_offline = !self.is_offline;
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.is_offline {
            return Err(StoreError::Backend("Document store offline".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create_unique_index(&self, collection: &str, path: &str) -> Result<(), StoreError> {
        self.ensure_online()?;
        let mut guard = self.collections.write().await;
        let target = guard.entry(collection.to_string()).or_default();
        if target.unique_paths.iter().any(|p| p == path) {
            return Ok(());
        }
        let mut seen = Vec::new();
        for value in target
            .documents
            .iter()
            .filter_map(|d| d.get(path))
            .filter(|v| !v.is_null())
        {
            if seen.contains(&value) {
                return Err(duplicate(path));
            }
            seen.push(value);
        }
        target.unique_paths.push(path.to_string());
        Ok(())
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<(), StoreError> {
        self.ensure_online()?;
        let mut guard = self.collections.write().await;
        let target = guard.entry(collection.to_string()).or_default();
        if let Some(path) = target.clash(&document, None) {
            return Err(duplicate(path));
        }
        target.documents.push(document);
        Ok(())
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Document,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        self.ensure_online()?;
        let guard = self.collections.read().await;
        let mut items: Vec<Document> = guard
            .get(collection)
            .map(|target| {
                target
                    .documents
                    .iter()
                    .filter(|document| matches(document, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(sort) = &options.sort {
            items.sort_by(|a, b| {
                let ordering = compare_values(
                    a.get(&sort.field).unwrap_or(&Value::Null),
                    b.get(&sort.field).unwrap_or(&Value::Null),
                );
                if sort.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        let limit = options.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(items
            .into_iter()
            .skip(options.skip as usize)
            .take(limit)
            .collect())
    }

    async fn count(&self, collection: &str, filter: &Document) -> Result<u64, StoreError> {
        self.ensure_online()?;
        let guard = self.collections.read().await;
        Ok(guard
            .get(collection)
            .map(|target| target.documents.iter().filter(|d| matches(d, filter)).count())
            .unwrap_or(0) as u64)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Document,
        changes: Document,
    ) -> Result<u64, StoreError> {
        self.ensure_online()?;
        let mut guard = self.collections.write().await;
        let Some(target) = guard.get_mut(collection) else {
            return Ok(0);
        };
        let Some(index) = target.documents.iter().position(|d| matches(d, filter)) else {
            return Ok(0);
        };
        let mut updated = target.documents[index].clone();
        updated.extend(changes);
        if let Some(path) = target.clash(&updated, Some(index)) {
            return Err(duplicate(path));
        }
        target.documents[index] = updated;
        Ok(1)
    }

    async fn delete_one(&self, collection: &str, filter: &Document) -> Result<u64, StoreError> {
        self.ensure_online()?;
        let mut guard = self.collections.write().await;
        let Some(target) = guard.get_mut(collection) else {
            return Ok(0);
        };
        match target.documents.iter().position(|d| matches(d, filter)) {
            Some(index) => {
                target.documents.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.ensure_online()
    }

    async fn close(&self) {}
}
