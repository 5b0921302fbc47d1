pub mod lease;

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;
use tracing::{debug, warn};

use crate::config::StoreSettings;
use crate::error::StoreError;
use crate::models::{InventoryRecord, InventoryRow, NewInventoryRecord};

pub use lease::{LeaseCounter, LeaseToken};

// Casts keep decoding stable whether the table was created with SERIAL/NUMERIC
// or BIGSERIAL/DOUBLE PRECISION, and whether sales_history is JSONB or TEXT.
const SELECT_ALL: &str = r#"
    SELECT id::bigint          AS id,
           name,
           category,
           current_quantity,
           min_required_quantity,
           price::float8       AS price,
           sales_history::text AS sales_history
    FROM inventory
    ORDER BY name ASC
"#;

const INSERT: &str = r#"
    INSERT INTO inventory
        (name, category, current_quantity, min_required_quantity, price, sales_history)
    VALUES ($1, $2, $3, $4, $5, $6::jsonb)
    RETURNING id::bigint
"#;

/// Data access used by the HTTP handlers. Each call is self-contained: it opens
/// its own connection and has released it by the time it returns.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Every record, ordered by name ascending.
    async fn list_all(&self) -> Result<Vec<InventoryRecord>, StoreError>;

    /// Inserts one record and returns its newly assigned id.
    async fn insert(&self, record: &NewInventoryRecord) -> Result<i64, StoreError>;

    /// Opens and immediately releases a connection.
    async fn ping(&self) -> Result<(), StoreError>;
}

// ── Postgres gateway ──────────────────────────────────────────────────────────

/// Connect-execute-disconnect gateway over PostgreSQL. No pool: every operation
/// gets a fresh connection bounded by the configured connect timeout.
#[derive(Clone)]
pub struct PgInventoryStore {
    options: PgConnectOptions,
    host: String,
    database: String,
    connect_timeout: Duration,
    leases: LeaseCounter,
}

impl fmt::Debug for PgInventoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgInventoryStore")
            .field("host", &self.host)
            .field("database", &self.database)
            .field("connect_timeout", &self.connect_timeout)
            .field("open_connections", &self.leases.open())
            .finish()
    }
}

impl PgInventoryStore {
    pub fn new(settings: &StoreSettings) -> Self {
        let options = PgConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .database(&settings.database)
            .username(&settings.username)
            .password(&settings.password)
            .application_name(env!("CARGO_PKG_NAME"));

        Self {
            options,
            host: settings.host.clone(),
            database: settings.database.clone(),
            connect_timeout: settings.connect_timeout,
            leases: LeaseCounter::new(),
        }
    }

    pub fn leases(&self) -> &LeaseCounter {
        &self.leases
    }

    /// Opens a connection, failing with [`StoreError::Timeout`] rather than
    /// waiting past the connect timeout.
    pub async fn acquire(&self) -> Result<StoreConnection, StoreError> {
        let start = Instant::now();
        let connect = PgConnection::connect_with(&self.options);

        let conn = match tokio::time::timeout(self.connect_timeout, connect).await {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => {
                warn!(host = %self.host, database = %self.database, error = %e, "Store connection failed");
                return Err(StoreError::Connection(e));
            }
            Err(_) => {
                warn!(
                    host = %self.host,
                    timeout_ms = self.connect_timeout.as_millis() as u64,
                    "Store connection timed out"
                );
                return Err(StoreError::Timeout(self.connect_timeout));
            }
        };

        let lease = self.leases.lease();
        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            open = self.leases.open(),
            "Store connection opened"
        );

        Ok(StoreConnection { conn, lease })
    }
}

#[async_trait]
impl InventoryStore for PgInventoryStore {
    async fn list_all(&self) -> Result<Vec<InventoryRecord>, StoreError> {
        let mut conn = self.acquire().await?;
        let result = conn.list_all().await;
        conn.release().await;
        result
    }

    async fn insert(&self, record: &NewInventoryRecord) -> Result<i64, StoreError> {
        let mut conn = self.acquire().await?;
        let result = conn.insert(record).await;
        conn.release().await;
        result
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.acquire().await?.release().await;
        Ok(())
    }
}

// ── Scoped connection ─────────────────────────────────────────────────────────

/// A live store connection. [`StoreConnection::release`] closes it cleanly; if it
/// is dropped instead (early return, cancelled request) the socket is still
/// closed and the lease returned.
#[derive(Debug)]
pub struct StoreConnection {
    conn: PgConnection,
    lease: LeaseToken,
}

impl StoreConnection {
    pub async fn list_all(&mut self) -> Result<Vec<InventoryRecord>, StoreError> {
        let rows = sqlx::query_as::<_, InventoryRow>(SELECT_ALL)
            .fetch_all(&mut self.conn)
            .await?;

        rows.into_iter().map(InventoryRecord::try_from).collect()
    }

    /// Single-statement insert inside its own transaction: committed on success,
    /// rolled back on any failure.
    pub async fn insert(&mut self, record: &NewInventoryRecord) -> Result<i64, StoreError> {
        let sales_history = record.sales_history_json()?;

        let mut tx = self.conn.begin().await?;
        let inserted = sqlx::query_scalar::<_, i64>(INSERT)
            .bind(&record.name)
            .bind(&record.category)
            .bind(record.current_quantity)
            .bind(record.min_required_quantity)
            .bind(record.price)
            .bind(&sales_history)
            .fetch_one(&mut *tx)
            .await;

        match inserted {
            Ok(id) => {
                tx.commit().await?;
                Ok(id)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "Rollback after failed insert also failed");
                }
                Err(StoreError::Query(e))
            }
        }
    }

    pub async fn release(self) {
        let Self { conn, lease } = self;
        if let Err(e) = conn.close().await {
            debug!(error = %e, "Store connection closed uncleanly");
        }
        drop(lease);
    }
}
