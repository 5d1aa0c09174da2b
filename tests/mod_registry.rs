mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{MemoryConnector, local_address};
use docbridge::connection::Registry;
use docbridge::errors::DbError;

#[tokio::test]
async fn sequential_acquire_reuses_one_connection() {
    let connector = Arc::new(MemoryConnector::default());
    let registry = Registry::new(connector.clone(), local_address());
    let a = registry.acquire("db1").await.unwrap();
    let b = registry.acquire("db1").await.unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(connector.connect_count(), 1);
    assert_eq!(connector.urls.lock().as_slice(), ["mongodb://localhost:27027/db1"]);
    assert_eq!(registry.connected_databases(), vec!["db1".to_string()]);
}

#[tokio::test]
async fn concurrent_first_acquire_is_single_flight() {
    let connector = Arc::new(MemoryConnector::with_delay(Duration::from_millis(50)));
    let registry = Arc::new(Registry::new(connector.clone(), local_address()));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.acquire("db1").await })
        })
        .collect();
    let mut conns = Vec::new();
    for h in handles {
        conns.push(h.await.unwrap().unwrap());
    }
    assert_eq!(connector.connect_count(), 1);
    assert!(conns.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

#[tokio::test]
async fn concurrent_failure_is_shared_and_not_cached() {
    let connector = Arc::new(MemoryConnector::with_delay(Duration::from_millis(30)));
    connector.unreachable.lock().insert("dbX".to_string());
    let registry = Arc::new(Registry::new(connector.clone(), local_address()));
    let (a, b, c) =
        tokio::join!(registry.acquire("dbX"), registry.acquire("dbX"), registry.acquire("dbX"));
    for r in [a, b, c] {
        assert!(matches!(r, Err(DbError::Connect { ref database, .. }) if database == "dbX"));
    }
    assert_eq!(connector.connect_count(), 1);

    // the failure is not remembered: the next call dials again
    assert!(registry.acquire("dbX").await.is_err());
    assert_eq!(connector.connect_count(), 2);
    assert!(registry.connected_databases().is_empty());
}

#[tokio::test]
async fn retry_after_failure_can_succeed() {
    let connector = Arc::new(MemoryConnector::default());
    connector.unreachable.lock().insert("flaky".to_string());
    let registry = Registry::new(connector.clone(), local_address());
    assert!(registry.acquire("flaky").await.is_err());
    connector.unreachable.lock().clear();
    assert!(registry.acquire("flaky").await.is_ok());
    assert_eq!(connector.connect_count(), 2);
}

#[tokio::test]
async fn different_databases_connect_in_parallel() {
    let connector = Arc::new(MemoryConnector::with_delay(Duration::from_millis(200)));
    let registry = Registry::new(connector.clone(), local_address());
    let both = async { tokio::join!(registry.acquire("a"), registry.acquire("b")) };
    let (a, b) = tokio::time::timeout(Duration::from_millis(350), both)
        .await
        .expect("acquisitions for different names must not serialize");
    assert!(a.is_ok() && b.is_ok());
    assert_eq!(connector.connect_count(), 2);
}

#[tokio::test]
async fn close_all_reports_every_failure_and_closes_the_rest() {
    let connector = Arc::new(MemoryConnector::default());
    connector.failing_close.lock().insert("b".to_string());
    let registry = Registry::new(connector.clone(), local_address());
    for db in ["a", "b", "c"] {
        registry.acquire(db).await.unwrap();
    }
    let err = registry.close_all().await.unwrap_err();
    match err {
        DbError::Close { attempted, failures } => {
            assert_eq!(attempted, 3);
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].database, "b");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(connector.closes.load(Ordering::SeqCst), 3);
    assert!(registry.connected_databases().is_empty());

    // closed entries are gone; a later request reconnects
    registry.acquire("a").await.unwrap();
    assert_eq!(connector.connect_count(), 4);
}

#[tokio::test]
async fn close_all_waits_for_in_flight_connects() {
    let connector = Arc::new(MemoryConnector::with_delay(Duration::from_millis(100)));
    let registry = Arc::new(Registry::new(connector.clone(), local_address()));
    let pending = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move { registry.acquire("late").await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    registry.close_all().await.unwrap();
    assert_eq!(connector.closes.load(Ordering::SeqCst), 1);
    assert!(pending.await.unwrap().is_ok());
    assert!(registry.connected_databases().is_empty());
}

#[tokio::test]
async fn close_all_on_empty_registry_is_ok() {
    let registry = Registry::new(Arc::new(MemoryConnector::default()), local_address());
    assert!(registry.close_all().await.is_ok());
}
