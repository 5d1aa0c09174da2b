use std::sync::Arc;

use async_trait::async_trait;
use bson::Document;

use crate::errors::DbError;
use crate::query::CompiledQuery;

/// An established connection to one logical database.
///
/// Collections are resolved lazily by name; a collection that does not exist
/// must behave as an empty one.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Run the compiled query against `collection` and return every matching document.
    async fn find(&self, collection: &str, query: &CompiledQuery) -> Result<Vec<Document>, DbError>;

    /// Number of documents in `collection` matching `filter`, ignoring paging.
    async fn count(&self, collection: &str, filter: &Document) -> Result<u64, DbError>;

    async fn close(&self) -> Result<(), DbError>;
}

/// Capability to open a connection from a URL.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str, database: &str) -> Result<Arc<dyn Connection>, DbError>;
}
