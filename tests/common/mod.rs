// Shared in-memory connector for integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bson::{Bson, Document};
use parking_lot::Mutex;

use docbridge::connection::{Connection, Connector};
use docbridge::errors::DbError;
use docbridge::query::CompiledQuery;

type Collections = HashMap<String, Vec<Document>>;

#[derive(Default)]
pub struct MemoryConnector {
    pub connects: AtomicUsize,
    pub urls: Mutex<Vec<String>>,
    pub data: Mutex<HashMap<String, Collections>>,
    pub unreachable: Mutex<HashSet<String>>,
    pub failing_close: Mutex<HashSet<String>>,
    pub closes: Arc<AtomicUsize>,
    pub connect_delay: Option<Duration>,
    pub queries: Arc<Mutex<Vec<CompiledQuery>>>,
}

impl MemoryConnector {
    pub fn with_delay(delay: Duration) -> Self {
        Self { connect_delay: Some(delay), ..Self::default() }
    }

    pub fn insert(&self, database: &str, collection: &str, docs: Vec<Document>) {
        self.data
            .lock()
            .entry(database.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default()
            .extend(docs);
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, url: &str, database: &str) -> Result<Arc<dyn Connection>, DbError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().push(url.to_string());
        if let Some(d) = self.connect_delay {
            tokio::time::sleep(d).await;
        }
        if self.unreachable.lock().contains(database) {
            return Err(DbError::connect(database, "connection refused"));
        }
        let collections = self.data.lock().get(database).cloned().unwrap_or_default();
        Ok(Arc::new(MemoryConnection {
            database: database.to_string(),
            collections,
            fail_close: self.failing_close.lock().contains(database),
            closes: Arc::clone(&self.closes),
            queries: Arc::clone(&self.queries),
        }))
    }
}

pub struct MemoryConnection {
    database: String,
    collections: Collections,
    fail_close: bool,
    closes: Arc<AtomicUsize>,
    queries: Arc<Mutex<Vec<CompiledQuery>>>,
}

// Top-level plain equality only; enough for envelope tests.
fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(k, v)| match v {
        Bson::Document(_) => true,
        other => doc.get(k) == Some(other),
    })
}

impl MemoryConnection {
    fn matching(&self, collection: &str, filter: &Document) -> Vec<Document> {
        self.collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| matches(d, filter)).cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn find(&self, collection: &str, query: &CompiledQuery) -> Result<Vec<Document>, DbError> {
        self.queries.lock().push(query.clone());
        let docs = self.matching(collection, &query.filter);
        let skip = usize::try_from(query.options.skip.unwrap_or(0)).unwrap_or(usize::MAX);
        let limit = query.options.limit.map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        Ok(docs.into_iter().skip(skip).take(limit).collect())
    }

    async fn count(&self, collection: &str, filter: &Document) -> Result<u64, DbError> {
        Ok(self.matching(collection, filter).len() as u64)
    }

    async fn close(&self) -> Result<(), DbError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(DbError::Query(format!("socket of {} already gone", self.database)));
        }
        Ok(())
    }
}

pub fn address(config: serde_json::Value) -> docbridge::connection::BaseAddress {
    let cfg = docbridge::config::DataSourceConfig::from_json_value(config).unwrap();
    let topology = docbridge::config::ServerTopology::try_from(cfg).unwrap();
    docbridge::connection::BaseAddress::from_topology(&topology)
}

pub fn local_address() -> docbridge::connection::BaseAddress {
    address(serde_json::json!({"server": {"host": "localhost", "port": 27027}}))
}
