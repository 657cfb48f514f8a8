//! AllowListStore - remote keyed store client
//!
//! The allow-list lives in a Redis keyed set under a namespace prefix, each
//! key's value equal to the code itself. Mutations come from the admin
//! surface; the cache only reads.
//!
//! Remote connectivity is treated as fragile: every operation verifies
//! liveness first and attempts exactly one reconnect before failing.

use crate::error::{Error, Result};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::Mutex;

/// Registered codes expire after a year; allow-list persistence across store
/// restarts is out of scope anyway.
const CODE_TTL_SECS: u64 = 60 * 60 * 24 * 365;

/// AllowListStore instance
pub struct AllowListStore {
    client: redis::Client,
    conn: Mutex<Option<MultiplexedConnection>>,
    key_prefix: String,
    connect_timeout: Duration,
}

impl AllowListStore {
    /// Create a store client for `url` under the given namespace prefix.
    ///
    /// No connection is made here; the first operation (or startup refresh)
    /// establishes it.
    pub fn new(url: &str, key_prefix: impl Into<String>, connect_timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            conn: Mutex::new(None),
            key_prefix: key_prefix.into(),
            connect_timeout,
        })
    }

    fn key(&self, code: &str) -> String {
        format!("{}:{}", self.key_prefix, code)
    }

    fn pattern(&self) -> String {
        format!("{}:*", self.key_prefix)
    }

    /// Hand out a live connection, verifying with PING and attempting one
    /// reconnect if the check fails.
    async fn connection(&self) -> Result<MultiplexedConnection> {
        let mut guard = self.conn.lock().await;

        if let Some(conn) = guard.as_mut() {
            if redis::cmd("PING").query_async::<String>(conn).await.is_ok() {
                return Ok(conn.clone());
            }
            tracing::warn!("Store connection lost, reconnecting");
        }

        let fresh = tokio::time::timeout(
            self.connect_timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| {
            Error::Store(format!(
                "store connect timed out after {:?}",
                self.connect_timeout
            ))
        })??;

        tracing::info!("Store connected");
        *guard = Some(fresh.clone());
        Ok(fresh)
    }

    /// Liveness probe for the health endpoint.
    pub async fn ping(&self) -> bool {
        self.connection().await.is_ok()
    }

    /// Fetch the complete allow-list: enumerate the namespace, then resolve
    /// every key in one batched round trip.
    pub async fn fetch_all(&self) -> Result<HashSet<String>> {
        let mut conn = self.connection().await?;

        let keys: Vec<String> = conn.keys(self.pattern()).await?;
        if keys.is_empty() {
            return Ok(HashSet::new());
        }

        let values: Vec<Option<String>> = conn.mget(&keys).await?;
        Ok(values.into_iter().flatten().collect())
    }

    /// Register a code. Returns false when it was already present.
    pub async fn register(&self, code: &str) -> Result<bool> {
        let mut conn = self.connection().await?;

        let created: Option<String> = redis::cmd("SET")
            .arg(self.key(code))
            .arg(code)
            .arg("NX")
            .arg("EX")
            .arg(CODE_TTL_SECS)
            .query_async(&mut conn)
            .await?;

        Ok(created.is_some())
    }

    /// Remove a code. Returns false when it was not present.
    pub async fn remove(&self, code: &str) -> Result<bool> {
        let mut conn = self.connection().await?;

        let existed: bool = conn.exists(self.key(code)).await?;
        if !existed {
            return Ok(false);
        }

        let _: i64 = conn.del(self.key(code)).await?;
        Ok(true)
    }

    /// Single-key existence check.
    pub async fn exists(&self, code: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        Ok(conn.exists(self.key(code)).await?)
    }

    /// Total codes currently registered.
    pub async fn count(&self) -> Result<usize> {
        let mut conn = self.connection().await?;
        let keys: Vec<String> = conn.keys(self.pattern()).await?;
        Ok(keys.len())
    }
}
