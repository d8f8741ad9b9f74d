use async_trait::async_trait;
use mongodb::bson::{self, Bson, Document as BsonDocument, doc};
use mongodb::error::{Error as DriverError, ErrorKind, WriteFailure};
use mongodb::event::EventHandler;
use mongodb::event::sdam::{SdamEvent, TopologyDescription};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel, ServerType};
use std::fmt::Display;

use crate::shared::infrastructure::connection::lifecycle::{DriverSignal, LifecycleTracker};
use crate::shared::infrastructure::document_store::{
    Document, DocumentStore, FindOptions, StoreError,
};

pub struct MongoDocumentStore {
    client: Client,
    database: Database,
}

impl MongoDocumentStore {
    /// Builds the client and wires driver topology events into `lifecycle`.
    /// The driver connects lazily; the connection builder pings before serving.
    pub async fn connect(uri: &str, lifecycle: LifecycleTracker) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(uri).await.map_err(backend)?;

        let observer = lifecycle.clone();
        options.sdam_event_handler = Some(EventHandler::callback(move |event: SdamEvent| {
            if let Some(signal) = driver_signal(&event) {
                observer.signal(signal);
            }
        }));

        let database_name = options
            .default_database
            .clone()
            .unwrap_or_else(|| lifecycle.database_name().to_string());
        let client = Client::with_options(options).map_err(backend)?;
        let database = client.database(&database_name);

        Ok(Self { client, database })
    }

    fn collection(&self, name: &str) -> Collection<BsonDocument> {
        self.database.collection::<BsonDocument>(name)
    }
}

fn driver_signal(event: &SdamEvent) -> Option<DriverSignal> {
    match event {
        SdamEvent::ServerTopologyAvailable(_) => Some(DriverSignal::TopologyAvailable),
        SdamEvent::ServerTopologyUnavailable(_) => Some(DriverSignal::TopologyUnavailable),
        SdamEvent::TopologyClosed(_) => Some(DriverSignal::TopologyClosed),
        _ => None,
    }
}

fn backend(error: impl Display) -> StoreError {
    StoreError::Backend(error.to_string())
}

fn to_bson(document: &Document) -> Result<BsonDocument, StoreError> {
    bson::to_document(document).map_err(|e| StoreError::Malformed(e.to_string()))
}

fn from_bson(document: BsonDocument) -> Result<Document, StoreError> {
    bson::from_document(document).map_err(|e| StoreError::Malformed(e.to_string()))
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    async fn create_unique_index(&self, collection: &str, path: &str) -> Result<(), StoreError> {
        let options = IndexOptions::builder()
            .name(unique_index_name(path))
            .unique(true)
            .sparse(true)
            .build();
        let index = IndexModel::builder()
            .keys(doc! { path: 1 })
            .options(options)
            .build();
        self.collection(collection)
            .create_index(index)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<(), StoreError> {
        self.collection(collection)
            .insert_one(to_bson(&document)?)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Document,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let target = self.collection(collection);
        let mut action = target.find(to_bson(filter)?).skip(options.skip);
        if let Some(limit) = options.limit {
            action = action.limit(limit as i64);
        }
        if let Some(sort) = &options.sort {
            let mut order = BsonDocument::new();
            order.insert(
                sort.field.clone(),
                Bson::Int32(if sort.descending { -1 } else { 1 }),
            );
            action = action.sort(order);
        }

        let mut cursor = action.await.map_err(backend)?;
        let mut documents = Vec::new();
        while cursor.advance().await.map_err(backend)? {
            let current = cursor.deserialize_current().map_err(backend)?;
            documents.push(from_bson(current)?);
        }
        Ok(documents)
    }

    async fn count(&self, collection: &str, filter: &Document) -> Result<u64, StoreError> {
        self.collection(collection)
            .count_documents(to_bson(filter)?)
            .await
            .map_err(backend)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Document,
        changes: Document,
    ) -> Result<u64, StoreError> {
        let result = self
            .collection(collection)
            .update_one(to_bson(filter)?, doc! { "$set": to_bson(&changes)? })
            .await
            .map_err(store_error)?;
        Ok(result.matched_count)
    }

    async fn delete_one(&self, collection: &str, filter: &Document) -> Result<u64, StoreError> {
        let result = self
            .collection(collection)
            .delete_one(to_bson(filter)?)
            .await
            .map_err(backend)?;
        Ok(result.deleted_count)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
    }
}
