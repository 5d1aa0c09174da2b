use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared, join_all};
use parking_lot::Mutex;

use super::driver::{Connection, Connector};
use super::url::BaseAddress;
use crate::errors::{CloseFailure, DbError};

const TARGET: &str = "docbridge::connection";

type ConnectOutcome = Result<Arc<dyn Connection>, DbError>;
type ConnectFuture = Shared<BoxFuture<'static, ConnectOutcome>>;

enum Slot {
    /// One shared connect attempt; `attempt` tells a stale waiter apart from a newer attempt.
    Connecting { attempt: u64, fut: ConnectFuture },
    Established(Arc<dyn Connection>),
}

/// Lazily established connections keyed by logical database name.
///
/// Concurrent first acquisitions of the same name share a single connect
/// attempt and its outcome. A failed attempt leaves no trace, so the next
/// acquisition connects afresh. Different names never wait on each other.
pub struct Registry {
    connector: Arc<dyn Connector>,
    address: BaseAddress,
    slots: Mutex<HashMap<String, Slot>>,
    attempts: AtomicU64,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("address", &self.address.redacted_url_for(""))
            .field("databases", &self.connected_databases())
            .finish()
    }
}

impl Registry {
    pub fn new(connector: Arc<dyn Connector>, address: BaseAddress) -> Self {
        Self { connector, address, slots: Mutex::new(HashMap::new()), attempts: AtomicU64::new(0) }
    }

    #[must_use]
    pub fn address(&self) -> &BaseAddress {
        &self.address
    }

    /// Return the cached connection for `database`, connecting on first use.
    ///
    /// # Errors
    /// Returns `DbError::Connect` if the connect attempt this call joined failed.
    pub async fn acquire(&self, database: &str) -> Result<Arc<dyn Connection>, DbError> {
        log::trace!(target: TARGET, "fetching connection for \"{database}\"");
        let (attempt, fut) = {
            let mut slots = self.slots.lock();
            match slots.get(database) {
                Some(Slot::Established(conn)) => return Ok(Arc::clone(conn)),
                Some(Slot::Connecting { attempt, fut }) => (*attempt, fut.clone()),
                None => {
                    let attempt = self.attempts.fetch_add(1, Ordering::Relaxed);
                    let fut = self.connect_future(database);
                    slots.insert(
                        database.to_string(),
                        Slot::Connecting { attempt, fut: fut.clone() },
                    );
                    (attempt, fut)
                }
            }
        };
        let outcome = fut.await;
        self.settle(database, attempt, &outcome);
        outcome
    }

    fn connect_future(&self, database: &str) -> ConnectFuture {
        let connector = Arc::clone(&self.connector);
        let url = self.address.url_for(database);
        let shown = self.address.redacted_url_for(database);
        let database = database.to_string();
        async move {
            log::info!(target: TARGET, "connecting to database {database} on {shown}");
            connector.connect(&url, &database).await.map_err(|e| match e {
                DbError::Connect { .. } => e,
                other => DbError::connect(&database, other),
            })
        }
        .boxed()
        .shared()
    }

    // Only the attempt that is still current may move the slot forward.
    fn settle(&self, database: &str, attempt: u64, outcome: &ConnectOutcome) {
        let mut slots = self.slots.lock();
        let current = matches!(
            slots.get(database),
            Some(Slot::Connecting { attempt: a, .. }) if *a == attempt
        );
        if !current {
            return;
        }
        match outcome {
            Ok(conn) => {
                slots.insert(database.to_string(), Slot::Established(Arc::clone(conn)));
            }
            Err(e) => {
                log::trace!(target: TARGET, "connect for \"{database}\" failed: {e}");
                slots.remove(database);
            }
        }
    }

    /// Names of databases with an established connection, sorted.
    #[must_use]
    pub fn connected_databases(&self) -> Vec<String> {
        let slots = self.slots.lock();
        let mut names: Vec<String> = slots
            .iter()
            .filter(|(_, s)| matches!(s, Slot::Established(_)))
            .map(|(k, _)| k.clone())
            .collect();
        names.sort();
        names
    }

    /// Wait for in-flight connects, then close every established connection.
    ///
    /// Every connection is closed even when some fail; the failures are
    /// reported together.
    ///
    /// A caller whose connect attempt was drained here still receives `Ok`
    /// with that handle, which is then closed along with the rest. Attempts
    /// started after the drain are left untouched.
    ///
    /// # Errors
    /// Returns `DbError::Close` listing each database whose connection failed to close.
    pub async fn close_all(&self) -> Result<(), DbError> {
        loop {
            let pending: Vec<(String, u64, ConnectFuture)> = {
                let slots = self.slots.lock();
                slots
                    .iter()
                    .filter_map(|(k, s)| match s {
                        Slot::Connecting { attempt, fut } => Some((k.clone(), *attempt, fut.clone())),
                        Slot::Established(_) => None,
                    })
                    .collect()
            };
            if pending.is_empty() {
                break;
            }
            let outcomes = join_all(pending.iter().map(|(_, _, fut)| fut.clone())).await;
            for ((database, attempt, _), outcome) in pending.iter().zip(outcomes) {
                self.settle(database, *attempt, &outcome);
            }
        }

        let mut established: Vec<(String, Arc<dyn Connection>)> = {
            let mut slots = self.slots.lock();
            let mut out = Vec::new();
            for (name, slot) in std::mem::take(&mut *slots) {
                match slot {
                    Slot::Established(conn) => out.push((name, conn)),
                    // started after the drain; left for its own caller
                    connecting @ Slot::Connecting { .. } => {
                        slots.insert(name, connecting);
                    }
                }
            }
            out
        };
        established.sort_by(|a, b| a.0.cmp(&b.0));

        let attempted = established.len();
        let results = join_all(established.iter().map(|(database, conn)| async move {
            log::trace!(target: TARGET, "closing connection \"{database}\"");
            (database.clone(), conn.close().await)
        }))
        .await;
        let failures: Vec<CloseFailure> = results
            .into_iter()
            .filter_map(|(database, r)| {
                r.err().map(|e| CloseFailure { database, message: e.to_string() })
            })
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            log::warn!(target: TARGET, "{} of {attempted} connections failed to close", failures.len());
            Err(DbError::Close { attempted, failures })
        }
    }
}
