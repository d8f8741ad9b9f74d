// The single shared database connection and the extensions every model on it inherits.
//
// Responsibilities
// - Open the connection once, before the server accepts traffic.
// - Attach plugins (pagination, uniqueness validation, write hooks) exactly once.
//   `ConnectionBuilder` is consumed by `open`, so nothing can be attached after I/O starts.
// - Create the unique indexes of every registered model before serving.
// - Observe the driver lifecycle through `LifecycleTracker`.

pub mod lifecycle;
pub mod model;
pub mod paginate;
pub mod unique_validator;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::shared::infrastructure::connection::lifecycle::{
    ConnectionState, DriverSignal, LifecycleTracker,
};
use crate::shared::infrastructure::connection::model::{Entity, Model, ModelSchema};
use crate::shared::infrastructure::connection::paginate::Paginate;
use crate::shared::infrastructure::connection::unique_validator::UniqueValidator;
use crate::shared::infrastructure::document_store::{DocumentStore, StoreError};

#[derive(async_graphql::Enum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy)]
pub struct Change<'a> {
    pub collection: &'a str,
    pub action: ChangeAction,
    pub document_id: &'a str,
    pub actor: Option<&'a str>,
}

/// Runs after every successful write on any model of the connection.
#[async_trait]
pub trait ModelHook: Send + Sync {
    async fn after_write(
        &self,
        store: &dyn DocumentStore,
        change: &Change<'_>,
    ) -> Result<(), StoreError>;
}

#[derive(Default, Clone)]
pub struct ModelExtensions {
    pagination: Option<Paginate>,
    unique_validator: Option<UniqueValidator>,
    hooks: Vec<Arc<dyn ModelHook>>,
}

impl ModelExtensions {
    pub fn set_pagination(&mut self, paginate: Paginate) {
        self.pagination = Some(paginate);
    }

    pub fn set_unique_validator(&mut self, validator: UniqueValidator) {
        self.unique_validator = Some(validator);
    }

    pub fn add_hook(&mut self, hook: Arc<dyn ModelHook>) {
        self.hooks.push(hook);
    }

    pub fn pagination(&self) -> Option<&Paginate> {
        self.pagination.as_ref()
    }

    pub fn unique_validator(&self) -> Option<&UniqueValidator> {
        self.unique_validator.as_ref()
    }

    pub fn hooks(&self) -> &[Arc<dyn ModelHook>] {
        &self.hooks
    }
}

pub trait ConnectionPlugin {
    fn attach(self, extensions: &mut ModelExtensions);
}

impl<F> ConnectionPlugin for F
where
    F: FnOnce(&mut ModelExtensions),
{
    fn attach(self, extensions: &mut ModelExtensions) {
        self(extensions)
    }
}

#[derive(Clone)]
pub struct Connection {
    store: Arc<dyn DocumentStore>,
    lifecycle: LifecycleTracker,
    extensions: Arc<ModelExtensions>,
}

impl Connection {
    pub fn builder(store: Arc<dyn DocumentStore>, lifecycle: LifecycleTracker) -> ConnectionBuilder {
        ConnectionBuilder {
            store,
            lifecycle,
            extensions: ModelExtensions::default(),
            schemas: Vec::new(),
        }
    }

    pub fn model<T: Entity>(&self) -> Model<T> {
        Model::new(self.clone())
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub fn extensions(&self) -> &ModelExtensions {
        &self.extensions
    }

    pub fn database_name(&self) -> &str {
        self.lifecycle.database_name()
    }

    pub fn state(&self) -> ConnectionState {
        self.lifecycle.state()
    }

    pub async fn close(&self) {
        self.lifecycle.signal(DriverSignal::ShutdownStarted);
        self.store.close().await;
        // No-op when the driver already reported the closed topology.
        self.lifecycle.signal(DriverSignal::TopologyClosed);
    }
}

pub struct ConnectionBuilder {
    store: Arc<dyn DocumentStore>,
    lifecycle: LifecycleTracker,
    extensions: ModelExtensions,
    schemas: Vec<ModelSchema>,
}

impl ConnectionBuilder {
    pub fn plugin(mut self, plugin: impl ConnectionPlugin) -> Self {
        plugin.attach(&mut self.extensions);
        self
    }

    /// Registers a model whose unique paths get a backing index on `open`.
    pub fn with_model<T: Entity>(mut self) -> Self {
        self.schemas.push(T::SCHEMA);
        self
    }

    pub async fn open(self) -> Result<Connection, StoreError> {
        if let Err(error) = self.store.ping().await {
            tracing::error!(
                target: lifecycle::LIFECYCLE_TARGET,
                database = self.lifecycle.database_name(),
                %error,
                "MongoDB connection failed"
            );
            return Err(error);
        }
        self.lifecycle.signal(DriverSignal::TopologyAvailable);
        for schema in &self.schemas {
            for path in schema.unique_paths {
                if let Err(error) = self.store.create_unique_index(schema.collection, path).await {
                    tracing::error!(
                        collection = schema.collection,
                        path,
                        %error,
                        "unique index creation failed"
                    );
                    return Err(error);
                }
            }
        }
        tracing::debug!(
            models = self.schemas.len(),
            pagination = self.extensions.pagination.is_some(),
            unique_validator = self.extensions.unique_validator.is_some(),
            hooks = self.extensions.hooks.len(),
            "connection plugins attached"
        );
        Ok(Connection {
            store: self.store,
            lifecycle: self.lifecycle,
            extensions: Arc::new(self.extensions),
        })
    }
}
