//! Test helpers.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;

use crate::{
    config::{Config, StoreSettings},
    db::{InventoryStore, LeaseCounter, LeaseToken},
    error::StoreError,
    models::{InventoryRecord, NewInventoryRecord},
    AppState,
};

/// In-memory stand-in for the Postgres gateway. Takes a lease per operation the
/// same way the real gateway does. Can be switched offline (fails before a lease is
/// taken) or made to fail statements (fails while holding one).
#[derive(Debug)]
pub(crate) struct MemoryStore {
    records: Mutex<Vec<InventoryRecord>>,
    next_id: AtomicI64,
    reachable: AtomicBool,
    failing_queries: AtomicBool,
    pub(crate) leases: LeaseCounter,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(0),
            reachable: AtomicBool::new(true),
            failing_queries: AtomicBool::new(false),
            leases: LeaseCounter::new(),
        }
    }

    pub(crate) fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub(crate) fn set_failing_queries(&self, failing: bool) {
        self.failing_queries.store(failing, Ordering::SeqCst);
    }

    fn check_query(&self) -> Result<(), StoreError> {
        if self.failing_queries.load(Ordering::SeqCst) {
            return Err(StoreError::Query(sqlx::Error::Protocol(
                "statement rejected".to_string(),
            )));
        }
        Ok(())
    }

    fn connect(&self) -> Result<LeaseToken, StoreError> {
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(StoreError::Timeout(Duration::from_secs(5)));
        }
        Ok(self.leases.lease())
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn list_all(&self) -> Result<Vec<InventoryRecord>, StoreError> {
        let _lease = self.connect()?;
        self.check_query()?;
        let mut records = self.records.lock().unwrap().clone();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }

    async fn insert(&self, record: &NewInventoryRecord) -> Result<i64, StoreError> {
        let _lease = self.connect()?;
        self.check_query()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.records
            .lock()
            .unwrap()
            .push(record.clone().into_record(id));
        Ok(id)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.connect().map(drop)
    }
}

pub(crate) fn test_config(static_dir: impl Into<PathBuf>) -> Config {
    Config {
        store: StoreSettings {
            host: "localhost".to_string(),
            database: "inventory".to_string(),
            username: "test".to_string(),
            password: String::new(),
            port: 5432,
            connect_timeout: Duration::from_secs(5),
        },
        secret_key: "test-secret".to_string(),
        region: "eu-west-1".to_string(),
        model_id: Some("amazon.nova-lite-v1:0".to_string()),
        host: "127.0.0.1".to_string(),
        port: 0,
        static_dir: static_dir.into(),
    }
}

pub(crate) fn state_with<S: InventoryStore + 'static>(store: Arc<S>) -> AppState {
    state_with_static(store, std::env::temp_dir())
}

pub(crate) fn state_with_static<S: InventoryStore + 'static>(
    store: Arc<S>,
    static_dir: impl Into<PathBuf>,
) -> AppState {
    AppState {
        store: store as Arc<dyn InventoryStore>,
        config: Arc::new(test_config(static_dir)),
    }
}

pub(crate) async fn read_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
