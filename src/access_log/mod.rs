//! AccessLog - recent admissions (ring buffer)
//!
//! ## Responsibilities
//!
//! - Keep a bounded in-memory record of admitted access events
//! - Assign monotonically increasing event ids
//! - Serve the admin surface's recent-events query
//!
//! Observability only: the controller's admission path does not depend on
//! anything stored here.

use crate::notifier::{AccessEvent, Direction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::RwLock;

/// One admitted access, as stored in the ring buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRecord {
    pub event_id: u64,
    pub code: String,
    pub direction: Direction,
    pub observed_at: DateTime<Utc>,
}

/// Ring buffer for access records
struct AccessRingBuffer {
    records: VecDeque<AccessRecord>,
    capacity: usize,
    next_id: u64,
}

impl AccessRingBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
            next_id: 1,
        }
    }

    fn push(&mut self, event: &AccessEvent) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        if self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(AccessRecord {
            event_id: id,
            code: event.code.clone(),
            direction: event.direction,
            observed_at: event.observed_at,
        });
        id
    }

    fn latest(&self, count: usize) -> Vec<AccessRecord> {
        self.records.iter().rev().take(count).cloned().collect()
    }
}

/// AccessLog instance
pub struct AccessLog {
    buffer: RwLock<AccessRingBuffer>,
}

impl AccessLog {
    /// Create a log holding at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: RwLock::new(AccessRingBuffer::new(capacity)),
        }
    }

    /// Record an admitted event, returning its id.
    pub async fn record(&self, event: &AccessEvent) -> u64 {
        let mut buffer = self.buffer.write().await;
        let id = buffer.push(event);
        tracing::debug!(event_id = id, code = %event.code, "Access recorded");
        id
    }

    /// Latest records, newest first.
    pub async fn latest(&self, count: usize) -> Vec<AccessRecord> {
        let buffer = self.buffer.read().await;
        buffer.latest(count)
    }

    /// Number of records currently held.
    pub async fn count(&self) -> usize {
        let buffer = self.buffer.read().await;
        buffer.records.len()
    }
}

impl Default for AccessLog {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ids_increase_monotonically() {
        let log = AccessLog::new(10);
        let first = log
            .record(&AccessEvent::now("A1", Direction::Entry))
            .await;
        let second = log
            .record(&AccessEvent::now("B2", Direction::Entry))
            .await;

        assert_eq!(second, first + 1);
        assert_eq!(log.count().await, 2);
    }

    #[tokio::test]
    async fn capacity_evicts_oldest() {
        let log = AccessLog::new(2);
        for code in ["A1", "B2", "C3"] {
            log.record(&AccessEvent::now(code, Direction::Exit)).await;
        }

        let latest = log.latest(10).await;
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].code, "C3");
        assert_eq!(latest[1].code, "B2");
    }
}
