//! MongoDB driver adapter.
//!
//! Documents cross into the driver as raw BSON bytes, so the driver's own
//! `bson` version does not have to match this crate's.

use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::Client;
use mongodb::options::FindOptions;

use super::driver::{Connection, Connector};
use crate::errors::DbError;
use crate::query::CompiledQuery;

type DriverDocument = mongodb::bson::Document;

fn to_driver(doc: &bson::Document) -> Result<DriverDocument, DbError> {
    let mut buf = Vec::new();
    doc.to_writer(&mut buf).map_err(|e| DbError::Query(e.to_string()))?;
    DriverDocument::from_reader(buf.as_slice()).map_err(|e| DbError::Query(e.to_string()))
}

fn from_driver(doc: &DriverDocument) -> Result<bson::Document, DbError> {
    let mut buf = Vec::new();
    doc.to_writer(&mut buf).map_err(|e| DbError::Query(e.to_string()))?;
    bson::Document::from_reader(buf.as_slice()).map_err(|e| DbError::Query(e.to_string()))
}

/// Connects with the official driver and verifies reachability with a `ping`.
#[derive(Debug, Clone, Default)]
pub struct MongoConnector;

#[async_trait]
impl Connector for MongoConnector {
    async fn connect(&self, url: &str, database: &str) -> Result<Arc<dyn Connection>, DbError> {
        let client = Client::with_uri_str(url).await.map_err(|e| DbError::connect(database, e))?;
        // the driver connects lazily; force a round trip so failures surface here
        client
            .database(database)
            .run_command(mongodb::bson::doc! { "ping": 1 })
            .await
            .map_err(|e| DbError::connect(database, e))?;
        Ok(Arc::new(MongoConnection { client, database: database.to_string() }))
    }
}

pub struct MongoConnection {
    client: Client,
    database: String,
}

impl std::fmt::Debug for MongoConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoConnection").field("database", &self.database).finish()
    }
}

impl MongoConnection {
    fn collection(&self, name: &str) -> mongodb::Collection<DriverDocument> {
        self.client.database(&self.database).collection(name)
    }
}

#[async_trait]
impl Connection for MongoConnection {
    async fn find(
        &self,
        collection: &str,
        query: &CompiledQuery,
    ) -> Result<Vec<bson::Document>, DbError> {
        let mut opts = FindOptions::default();
        opts.projection = query.options.projection.as_ref().map(to_driver).transpose()?;
        opts.limit = query.options.limit;
        opts.skip = query.options.skip;
        opts.sort = query.options.sort_document().as_ref().map(to_driver).transpose()?;

        let cursor = self
            .collection(collection)
            .find(to_driver(&query.filter)?)
            .with_options(opts)
            .await
            .map_err(|e| DbError::Query(e.to_string()))?;
        let docs: Vec<DriverDocument> =
            cursor.try_collect().await.map_err(|e| DbError::Query(e.to_string()))?;
        docs.iter().map(from_driver).collect()
    }

    async fn count(&self, collection: &str, filter: &bson::Document) -> Result<u64, DbError> {
        self.collection(collection)
            .count_documents(to_driver(filter)?)
            .await
            .map_err(|e| DbError::Query(e.to_string()))
    }

    async fn close(&self) -> Result<(), DbError> {
        self.client.clone().shutdown().await;
        Ok(())
    }
}
