//! Merged, ordered storage for notification records.
//!
//! Two sources feed the store: pushed events from the live socket and
//! polled records from the snapshot fetch. Pushed records always order
//! ahead of polled records so "just happened" events surface first
//! without comparing timestamps across heterogeneous sources (a pushed
//! event can arrive before the poller sees the corresponding row).
//! Within each provenance class, insertion order is preserved.

use crate::record::{NotificationRecord, Provenance};
use metrics::counter;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Configuration for the reconciliation store.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Suppress polled duplicates of tasks already seen via push. Off by
    /// default: the same task may then legitimately appear once per
    /// source.
    pub dedupe_by_task_id: bool,
}

/// Merged view over pushed and polled notification records.
///
/// Cloning yields another handle to the same store.
#[derive(Clone)]
pub struct ReconciliationStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    config: StoreConfig,
    pushed: RwLock<Vec<NotificationRecord>>,
    polled: RwLock<Vec<NotificationRecord>>,
    total_pushed: AtomicU64,
    total_snapshots: AtomicU64,
}

impl ReconciliationStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                config,
                pushed: RwLock::new(Vec::new()),
                polled: RwLock::new(Vec::new()),
                total_pushed: AtomicU64::new(0),
                total_snapshots: AtomicU64::new(0),
            }),
        }
    }

    /// Append a pushed record.
    pub fn apply_push(&self, mut record: NotificationRecord) {
        record.provenance = Provenance::Pushed;
        self.inner.pushed.write().unwrap().push(record);
        self.inner.total_pushed.fetch_add(1, Ordering::Relaxed);
        counter!("notifications_pushed_total").increment(1);
    }

    /// Replace the polled class with a fresh snapshot.
    ///
    /// A snapshot is authoritative for its provenance class, so this is
    /// a full replace, not a merge. Pushed records are untouched.
    pub fn load_snapshot(&self, records: Vec<NotificationRecord>) {
        let records: Vec<NotificationRecord> = records
            .into_iter()
            .map(|mut record| {
                record.provenance = Provenance::Polled;
                record
            })
            .collect();
        counter!("notifications_polled_total").increment(records.len() as u64);
        *self.inner.polled.write().unwrap() = records;
        self.inner.total_snapshots.fetch_add(1, Ordering::Relaxed);
    }

    /// The ordered feed: every pushed record ahead of every polled
    /// record, stable within each class.
    pub fn view(&self) -> Vec<NotificationRecord> {
        let pushed = self.inner.pushed.read().unwrap();
        let polled = self.inner.polled.read().unwrap();

        let mut out = Vec::with_capacity(pushed.len() + polled.len());
        out.extend(pushed.iter().cloned());
        if self.inner.config.dedupe_by_task_id {
            let seen: HashSet<i64> = pushed.iter().map(|r| r.task_id).collect();
            out.extend(polled.iter().filter(|r| !seen.contains(&r.task_id)).cloned());
        } else {
            out.extend(polled.iter().cloned());
        }
        out
    }

    pub fn len(&self) -> usize {
        self.view().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.pushed.read().unwrap().is_empty()
            && self.inner.polled.read().unwrap().is_empty()
    }

    /// Discard everything. Only called on logout or an explicit
    /// client-initiated clear, never on reconnect.
    pub fn clear(&self) {
        self.inner.pushed.write().unwrap().clear();
        self.inner.polled.write().unwrap().clear();
    }

    /// Store statistics.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            pushed_len: self.inner.pushed.read().unwrap().len(),
            polled_len: self.inner.polled.read().unwrap().len(),
            total_pushed: self.inner.total_pushed.load(Ordering::Relaxed),
            total_snapshots: self.inner.total_snapshots.load(Ordering::Relaxed),
        }
    }
}

impl Default for ReconciliationStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

/// Store statistics.
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub pushed_len: usize,
    pub polled_len: usize,
    pub total_pushed: u64,
    pub total_snapshots: u64,
}
