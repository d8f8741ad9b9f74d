// Port for the document database behind the shared connection.
//
// Purpose
// - Keep models, plugins and services independent of the MongoDB driver.
//
// Boundaries
// - Documents are JSON objects. Filters are equality matches on top-level fields,
//   optionally `{"$ne": value}`. Nothing richer is needed by the modules.
//
// Testing guidance
// - Use the in memory adapter; toggle it offline to exercise backend failures.

pub mod in_memory;
pub mod mongo;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use thiserror::Error;

pub type Document = Map<String, Value>;

pub const ID_FIELD: &str = "_id";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("duplicate key on {path}")]
    DuplicateKey { path: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortBy {
    pub field: String,
    pub descending: bool,
}

impl SortBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub skip: u64,
    pub limit: Option<u64>,
    pub sort: Option<SortBy>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Idempotent. Writes that would repeat a non-null value on `path` fail with
    /// `StoreError::DuplicateKey`.
    async fn create_unique_index(&self, collection: &str, path: &str) -> Result<(), StoreError>;

    async fn insert_one(&self, collection: &str, document: Document) -> Result<(), StoreError>;

    async fn find(
        &self,
        collection: &str,
        filter: &Document,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    async fn count(&self, collection: &str, filter: &Document) -> Result<u64, StoreError>;

    /// Sets `changes` on the first matching document; returns the matched count.
    async fn update_one(
        &self,
        collection: &str,
        filter: &Document,
        changes: Document,
    ) -> Result<u64, StoreError>;

    async fn delete_one(&self, collection: &str, filter: &Document) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    async fn close(&self);
}

/// Equality filter on a single field.
pub fn filter_eq(field: &str, value: impl Into<Value>) -> Document {
    let mut filter = Document::new();
    filter.insert(field.to_string(), value.into());
    filter
}

pub fn matches(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(field, expected)| {
        let actual = document.get(field).unwrap_or(&Value::Null);
        match expected {
            Value::Object(operator) if operator.len() == 1 && operator.contains_key("$ne") => {
                Some(actual) != operator.get("$ne")
            }
            _ => actual == expected,
        }
    })
}

/// Total order used for in-process sorting: null < bool < number < string < other.
pub fn compare_values(left: &Value, right: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => rank(left).cmp(&rank(right)),
    }
}

#[cfg(test)]
mod document_store_tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[rstest]
    fn it_should_match_on_equality() {
        let document = doc(json!({"email": "a@b.c", "name": "A"}));
        assert!(matches(&document, &filter_eq("email", "a@b.c")));
        assert!(!matches(&document, &filter_eq("email", "x@b.c")));
    }

    #[rstest]
    fn it_should_treat_missing_fields_as_null() {
        let document = doc(json!({"name": "A"}));
        assert!(matches(&document, &filter_eq("email", Value::Null)));
    }

    #[rstest]
    fn it_should_support_not_equal() {
        let document = doc(json!({"_id": "1", "email": "a@b.c"}));
        let mut filter = filter_eq("email", "a@b.c");
        filter.insert("_id".into(), json!({"$ne": "1"}));
        assert!(!matches(&document, &filter));
        filter.insert("_id".into(), json!({"$ne": "2"}));
        assert!(matches(&document, &filter));
    }

    #[rstest]
    #[case(json!(1), json!(2), Ordering::Less)]
    #[case(json!("b"), json!("a"), Ordering::Greater)]
    #[case(Value::Null, json!(0), Ordering::Less)]
    #[case(json!(1.5), json!(1.5), Ordering::Equal)]
    fn it_should_order_values(#[case] left: Value, #[case] right: Value, #[case] expected: Ordering) {
        assert_eq!(compare_values(&left, &right), expected);
    }
}
