use std::sync::Arc;

use bson::Document;
use serde::Serialize;

use crate::connection::Registry;
use crate::errors::DbError;
use crate::query::{self, CompiledQuery, Request};

const TARGET: &str = "docbridge::query";

/// Outbound response envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Total matches ignoring paging; `None` when counting was not requested.
    pub total_count: Option<u64>,
    pub data: Vec<Document>,
}

/// Composes the compiler with the registry: compile, acquire, execute.
#[derive(Debug, Clone)]
pub struct Processor {
    registry: Arc<Registry>,
}

impl Processor {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Fetch the requested page. `total_count` is left empty.
    ///
    /// # Errors
    /// Connection and query errors are returned unmodified.
    pub async fn handle(&self, request: &Request) -> Result<Response, DbError> {
        let compiled = query::compile(request);
        let data = self.execute(request, &compiled).await?;
        Ok(Response { total_count: None, data })
    }

    /// Fetch the requested page and the total match count.
    ///
    /// # Errors
    /// Connection and query errors are returned unmodified.
    pub async fn handle_with_count(&self, request: &Request) -> Result<Response, DbError> {
        let compiled = query::compile(request);
        let data = self.execute(request, &compiled).await?;
        let total = self.count_compiled(request, &compiled).await?;
        Ok(Response { total_count: Some(total), data })
    }

    /// Count documents matching the request's filter and search, ignoring paging.
    ///
    /// # Errors
    /// Connection and query errors are returned unmodified.
    pub async fn count(&self, request: &Request) -> Result<u64, DbError> {
        self.count_compiled(request, &query::compile(request)).await
    }

    async fn execute(
        &self,
        request: &Request,
        compiled: &CompiledQuery,
    ) -> Result<Vec<Document>, DbError> {
        let conn = self.registry.acquire(&request.database).await?;
        log::trace!(
            target: TARGET,
            "executing query on {}.{}: filter={} options={:?}",
            request.database,
            request.collection,
            compiled.filter,
            compiled.options
        );
        conn.find(&request.collection, compiled).await
    }

    async fn count_compiled(
        &self,
        request: &Request,
        compiled: &CompiledQuery,
    ) -> Result<u64, DbError> {
        let conn = self.registry.acquire(&request.database).await?;
        log::trace!(
            target: TARGET,
            "executing count on {}.{}: filter={}",
            request.database,
            request.collection,
            compiled.filter
        );
        conn.count(&request.collection, &compiled.filter).await
    }
}
