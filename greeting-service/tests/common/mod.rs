//! Common test utilities for greeting-service integration tests.
//!
//! In-memory stand-ins for both stores, scripted connectors for the bootstrap
//! phase, and helpers that drive the router without opening a socket.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use greeting_service::bootstrap::{bootstrap, StoreHandles};
use greeting_service::services::{
    CacheConnector, GreetingStore, RelationalConnector, StoreError, VisitCounter,
};
use greeting_service::startup::{build_router, AppState};
use http_body_util::BodyExt;
use service_core::retry::{RetryPolicy, Sleeper};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tower::ServiceExt;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,greeting_service=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Ordered record of connection attempts across both connectors.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<&'static str>>,
}

impl EventLog {
    pub fn push(&self, event: &'static str) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }
}

/// Sleeper that records requested pauses and returns immediately.
#[derive(Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

/// In-memory greetings table. `None` means the table does not exist.
#[derive(Default)]
pub struct FakeGreetingStore {
    table: Mutex<Option<Vec<Option<String>>>>,
    pub ping_failures: AtomicU32,
    pub fail_fetch: AtomicBool,
    pub fail_create: AtomicBool,
    pub fail_insert: AtomicBool,
    pub fetch_calls: AtomicUsize,
    pub closed: AtomicBool,
}

impl FakeGreetingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn rows(&self) -> Option<Vec<Option<String>>> {
        self.table.lock().unwrap().clone()
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Replace the table with exactly these rows.
    pub fn seed(&self, rows: Vec<Option<String>>) {
        *self.table.lock().unwrap() = Some(rows);
    }
}

#[async_trait]
impl GreetingStore for FakeGreetingStore {
    async fn ping(&self) -> Result<(), StoreError> {
        let remaining = self.ping_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.ping_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::relational("ping", "io"));
        }
        Ok(())
    }

    async fn fetch_greeting(&self) -> Result<Option<String>, StoreError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(StoreError::relational("fetch_greeting", "io"));
        }
        Ok(self
            .table
            .lock()
            .unwrap()
            .as_ref()
            .and_then(|rows| rows.first().cloned().flatten()))
    }

    async fn drop_table(&self) -> Result<(), StoreError> {
        *self.table.lock().unwrap() = None;
        Ok(())
    }

    async fn create_table(&self) -> Result<(), StoreError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(StoreError::relational("create_table", "database 42501"));
        }
        *self.table.lock().unwrap() = Some(Vec::new());
        Ok(())
    }

    async fn insert_greeting(&self, message: &str) -> Result<(), StoreError> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(StoreError::relational("insert_greeting", "io"));
        }
        match self.table.lock().unwrap().as_mut() {
            Some(rows) => {
                rows.push(Some(message.to_string()));
                Ok(())
            }
            None => Err(StoreError::relational("insert_greeting", "database 42P01")),
        }
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// In-memory counter with an atomic increment, like `INCR`.
#[derive(Default)]
pub struct FakeVisitCounter {
    value: AtomicI64,
    pub fail_ping: AtomicBool,
    pub fail_increment: AtomicBool,
    pub fail_reset: AtomicBool,
    pub increments: AtomicUsize,
    pub closed: AtomicBool,
}

impl FakeVisitCounter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn value(&self) -> i64 {
        self.value.load(Ordering::SeqCst)
    }

    pub fn set(&self, value: i64) {
        self.value.store(value, Ordering::SeqCst);
    }
}

#[async_trait]
impl VisitCounter for FakeVisitCounter {
    async fn ping(&self) -> Result<(), StoreError> {
        if self.fail_ping.load(Ordering::SeqCst) {
            return Err(StoreError::cache("ping", "connection refused"));
        }
        Ok(())
    }

    async fn increment(&self) -> Result<i64, StoreError> {
        if self.fail_increment.load(Ordering::SeqCst) {
            return Err(StoreError::cache("increment", "connection refused"));
        }
        self.increments.fetch_add(1, Ordering::SeqCst);
        Ok(self.value.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn reset(&self) -> Result<(), StoreError> {
        if self.fail_reset.load(Ordering::SeqCst) {
            return Err(StoreError::cache("reset", "connection refused"));
        }
        self.value.store(0, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Relational connector whose first `connect_failures` attempts fail to open.
pub struct ScriptedRelationalConnector {
    pub store: Arc<FakeGreetingStore>,
    pub connect_failures: u32,
    pub attempts: AtomicU32,
    pub log: Arc<EventLog>,
}

impl ScriptedRelationalConnector {
    pub fn new(store: Arc<FakeGreetingStore>, connect_failures: u32, log: Arc<EventLog>) -> Self {
        Self {
            store,
            connect_failures,
            attempts: AtomicU32::new(0),
            log,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelationalConnector for ScriptedRelationalConnector {
    async fn connect(&self) -> Result<Arc<dyn GreetingStore>, StoreError> {
        self.log.push("relational");
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.connect_failures {
            return Err(StoreError::relational("connect", "io"));
        }
        Ok(self.store.clone())
    }
}

/// Cache connector that either always fails to open or always succeeds.
pub struct ScriptedCacheConnector {
    pub store: Arc<FakeVisitCounter>,
    pub fail_connect: bool,
    pub attempts: AtomicU32,
    pub log: Arc<EventLog>,
}

impl ScriptedCacheConnector {
    pub fn new(store: Arc<FakeVisitCounter>, fail_connect: bool, log: Arc<EventLog>) -> Self {
        Self {
            store,
            fail_connect,
            attempts: AtomicU32::new(0),
            log,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheConnector for ScriptedCacheConnector {
    async fn connect(&self) -> Result<Arc<dyn VisitCounter>, StoreError> {
        self.log.push("cache");
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect {
            return Err(StoreError::cache("connect", "connection refused"));
        }
        Ok(self.store.clone())
    }
}

pub fn test_policy() -> RetryPolicy {
    RetryPolicy::fixed(5, Duration::from_secs(2))
}

/// Bootstrapped fakes plus a router over them.
pub struct TestApp {
    pub greetings: Arc<FakeGreetingStore>,
    pub visits: Arc<FakeVisitCounter>,
    pub stores: StoreHandles,
    pub router: Router,
}

impl TestApp {
    /// Run the real bootstrap over healthy fakes and build the router.
    pub async fn spawn() -> Self {
        init_tracing();

        let greetings = FakeGreetingStore::new();
        let visits = FakeVisitCounter::new();
        let log = Arc::new(EventLog::default());
        let relational = ScriptedRelationalConnector::new(greetings.clone(), 0, log.clone());
        let cache = ScriptedCacheConnector::new(visits.clone(), false, log);

        let stores = bootstrap(
            &relational,
            &cache,
            &test_policy(),
            &RecordingSleeper::default(),
        )
        .await
        .expect("bootstrap over healthy fakes should succeed");

        let router = build_router(AppState {
            service_name: "greeting-service-test".to_string(),
            stores: stores.clone(),
        });

        Self {
            greetings,
            visits,
            stores,
            router,
        }
    }

    /// Issue a GET and return the status and body text.
    pub async fn get(&self, path: &str) -> (StatusCode, String) {
        get(self.router.clone(), path).await
    }
}

/// Drive one GET through `router` and return the status and body text.
pub async fn get(router: Router, path: &str) -> (StatusCode, String) {
    let response = router
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .expect("router is infallible");

    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();

    (status, String::from_utf8_lossy(&bytes).into_owned())
}

/// Pull the visit count out of a rendered greeting page.
pub fn visit_count(body: &str) -> i64 {
    let start = body.find("<strong>").expect("count missing") + "<strong>".len();
    let end = body[start..].find("</strong>").expect("count unterminated") + start;
    body[start..end].parse().expect("count is not a number")
}
