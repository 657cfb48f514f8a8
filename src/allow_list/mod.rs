//! AllowListCache - local snapshot over the remote keyed store
//!
//! ## Responsibilities
//!
//! - Serve `contains` from an immutable local snapshot, no remote call
//! - Rebuild the snapshot from the store on an independent timer
//! - Survive the store being unreachable: a failed refresh keeps the
//!   previous snapshot in force
//!
//! Policy note: this is the time-windowed snapshot design. `contains` never
//! queries the store directly; consistency after an admin write is bounded
//! by the refresh interval.

mod store;

pub use store::AllowListStore;

use crate::error::Result;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::{interval, MissedTickBehavior};

/// Immutable point-in-time copy of the allow-list.
pub struct AllowListSnapshot {
    codes: HashSet<String>,
    refreshed_at: DateTime<Utc>,
}

impl AllowListSnapshot {
    fn new(codes: HashSet<String>) -> Self {
        Self {
            codes,
            refreshed_at: Utc::now(),
        }
    }

    fn empty() -> Self {
        Self::new(HashSet::new())
    }
}

/// AllowListCache instance
pub struct AllowListCache {
    store: Arc<AllowListStore>,
    /// Replaced wholesale on refresh, never mutated in place: readers see
    /// either the old or the new snapshot, never a partial one.
    snapshot: RwLock<Arc<AllowListSnapshot>>,
}

impl AllowListCache {
    /// Create a cache over `store`, starting from an empty snapshot.
    pub fn new(store: Arc<AllowListStore>) -> Self {
        Self {
            store,
            snapshot: RwLock::new(Arc::new(AllowListSnapshot::empty())),
        }
    }

    /// Whether `code` is in the current snapshot. Hot path: no remote call.
    pub async fn contains(&self, code: &str) -> bool {
        self.snapshot.read().await.codes.contains(code)
    }

    /// Codes in the current snapshot.
    pub async fn count(&self) -> usize {
        self.snapshot.read().await.codes.len()
    }

    /// When the current snapshot was captured.
    pub async fn refreshed_at(&self) -> DateTime<Utc> {
        self.snapshot.read().await.refreshed_at
    }

    /// Rebuild the snapshot from the store and swap it in atomically.
    ///
    /// The replacement set is built entirely before the write lock is taken,
    /// so concurrent `contains` reads observe the pre-refresh snapshot until
    /// the swap completes. On any store failure the existing snapshot stays
    /// untouched and the error is returned for the caller to log.
    pub async fn refresh(&self) -> Result<usize> {
        let codes = self.store.fetch_all().await?;
        let count = codes.len();

        let next = Arc::new(AllowListSnapshot::new(codes));
        *self.snapshot.write().await = next;

        tracing::info!(code_count = count, "Allow-list snapshot refreshed");
        Ok(count)
    }

    /// Periodic refresh, decoupled from the scan loop's `contains` calls.
    ///
    /// Sleeps the full period between runs; failures are logged and the
    /// previous snapshot stays in force until the next attempt.
    pub async fn run_refresh_loop(self: Arc<Self>, period: Duration) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the initial load already
        // happened at startup.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(e) = self.refresh().await {
                tracing::error!(
                    error = %e,
                    "Allow-list refresh failed, keeping previous snapshot"
                );
            }
        }
    }

    /// Handle to the underlying store.
    pub fn store(&self) -> &Arc<AllowListStore> {
        &self.store
    }

    #[cfg(test)]
    pub(crate) async fn install_snapshot<I, S>(&self, codes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: HashSet<String> = codes.into_iter().map(Into::into).collect();
        *self.snapshot.write().await = Arc::new(AllowListSnapshot::new(set));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_store() -> Arc<AllowListStore> {
        // Port 9 (discard) refuses immediately; every remote operation fails.
        Arc::new(
            AllowListStore::new("redis://127.0.0.1:9/1", "qrcodes", Duration::from_millis(500))
                .expect("valid url"),
        )
    }

    #[tokio::test]
    async fn starts_empty() {
        let cache = AllowListCache::new(unreachable_store());
        assert_eq!(cache.count().await, 0);
        assert!(!cache.contains("A1").await);
    }

    #[tokio::test]
    async fn contains_follows_snapshot() {
        let cache = AllowListCache::new(unreachable_store());
        cache.install_snapshot(["A1", "B2"]).await;

        assert!(cache.contains("A1").await);
        assert!(cache.contains("B2").await);
        assert!(!cache.contains("Z9").await);
        assert_eq!(cache.count().await, 2);
    }

    #[tokio::test]
    async fn failed_refresh_preserves_snapshot() {
        let cache = AllowListCache::new(unreachable_store());
        cache.install_snapshot(["A1"]).await;
        let before = cache.refreshed_at().await;

        assert!(cache.refresh().await.is_err());

        assert!(cache.contains("A1").await);
        assert_eq!(cache.count().await, 1);
        assert_eq!(cache.refreshed_at().await, before);
    }
}
