pub mod config;
pub mod connection;
pub mod errors;
pub mod logger;
pub mod processor;
pub mod query;

pub use bson::oid::ObjectId;

use crate::config::{DataSourceConfig, ServerTopology};
use crate::connection::{BaseAddress, Connector, Registry};
use crate::errors::DbError;
use crate::processor::{Processor, Response};
use crate::query::Request;
use std::sync::Arc;

/// Host-facing data source: translates generic requests into native queries
/// and runs them over lazily established, per-database connections.
#[derive(Debug)]
pub struct DataSource {
    topology: ServerTopology,
    registry: Arc<Registry>,
    processor: Processor,
}

impl DataSource {
    /// Validates the configuration and pre-builds the connection address.
    /// No network activity happens here.
    ///
    /// # Errors
    /// Returns `DbError::Config` if the topology is incomplete.
    pub fn new(config: DataSourceConfig, connector: Arc<dyn Connector>) -> Result<Self, DbError> {
        let topology = ServerTopology::try_from(config)?;
        let address = BaseAddress::from_topology(&topology);
        let registry = Arc::new(Registry::new(connector, address));
        let processor = Processor::new(Arc::clone(&registry));
        Ok(Self { topology, registry, processor })
    }

    /// Same as [`DataSource::new`], using the official MongoDB driver.
    ///
    /// # Errors
    /// Returns `DbError::Config` if the topology is incomplete.
    #[cfg(feature = "mongodb")]
    pub fn with_mongodb(config: DataSourceConfig) -> Result<Self, DbError> {
        Self::new(config, Arc::new(connection::MongoConnector))
    }

    #[must_use]
    pub fn topology(&self) -> &ServerTopology {
        &self.topology
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Called once by the host before first use. Currently has nothing to set up.
    pub fn prepare(&self) {}

    /// Run a request and return its page of documents.
    ///
    /// # Errors
    /// Connection and query errors are returned unmodified.
    pub async fn process(&self, request: &Request) -> Result<Response, DbError> {
        self.processor.handle(request).await
    }

    /// Like [`DataSource::process`], also filling `total_count`.
    ///
    /// # Errors
    /// Connection and query errors are returned unmodified.
    pub async fn process_with_count(&self, request: &Request) -> Result<Response, DbError> {
        self.processor.handle_with_count(request).await
    }

    /// # Errors
    /// Connection and query errors are returned unmodified.
    pub async fn count(&self, request: &Request) -> Result<u64, DbError> {
        self.processor.count(request).await
    }

    /// Host teardown: close every connection and report aggregated failures.
    ///
    /// # Errors
    /// Returns `DbError::Close` if any connection failed to close.
    pub async fn close(&self) -> Result<(), DbError> {
        self.registry.close_all().await
    }
}
