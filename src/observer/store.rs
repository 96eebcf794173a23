//! Datastore seam for the observer
//!
//! The observer only needs two round trips: insert one document and ping.
//! `MongoStore` is the production implementation; tests substitute
//! [`MemoryStore`](super::MemoryStore).

use super::event::Event;
use crate::error::StoreError;
use async_trait::async_trait;
use bson::{doc, Document};
use mongodb::{Client, Collection, Database};

#[async_trait]
pub trait EventStore: Send + Sync + 'static {
    /// Write a single event document
    async fn insert_one(&self, event: &Event) -> Result<(), StoreError>;

    /// One liveness round trip against the datastore
    async fn ping(&self) -> Result<(), StoreError>;
}

/// MongoDB collection handle
///
/// Cloning is cheap; the driver's `Client` owns the connection pool and is
/// safe to share across tasks.
#[derive(Clone, Debug)]
pub struct MongoStore {
    client: Client,
    database: Database,
    collection: Collection<Document>,
}

impl MongoStore {
    /// Build a client for `uri` and resolve the database and collection
    ///
    /// The driver parses the URI here but defers opening sockets until the
    /// first operation, so an unreachable server is only detected later.
    pub async fn connect(
        uri: &str,
        database_name: &str,
        collection_name: &str,
    ) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self::from_client(client, database_name, collection_name))
    }

    /// Wrap an existing driver client
    pub fn from_client(client: Client, database_name: &str, collection_name: &str) -> Self {
        let database = client.database(database_name);
        let collection = database.collection::<Document>(collection_name);

        Self {
            client,
            database,
            collection,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn collection(&self) -> &Collection<Document> {
        &self.collection
    }
}

#[async_trait]
impl EventStore for MongoStore {
    async fn insert_one(&self, event: &Event) -> Result<(), StoreError> {
        let document = event.to_document()?;
        self.collection.insert_one(document).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }
}
