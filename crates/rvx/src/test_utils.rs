//! 🧪 Test doubles for the store side of the pipeline.
//!
//! - [`GaugedStore`]: an in-memory store that remembers batch sizes and the
//!   most writes it ever saw running at once. Optionally naps inside each write
//!   so overlaps actually happen.
//! - [`FailingStore`]: fails the Nth batch write. Every other write succeeds.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::backends::{InMemoryStore, Store};
use crate::common::{Record, StoredRecord};

/// 🔢 A record whose id is `id` and whose other fields are boring on purpose.
pub(crate) fn record(id: i64) -> Record {
    Record {
        id,
        firstname: format!("first{id}"),
        lastname: format!("last{id}"),
        email: format!("{id}@example.com"),
        email2: format!("{id}@backup.example.com"),
        profession: "tester".into(),
    }
}

/// 📄 A CSV data line that parses cleanly into `record(id)` (modulo names).
pub(crate) fn csv_line(id: usize) -> String {
    format!("{id},first{id},last{id},{id}@example.com,{id}@backup.example.com,tester")
}

pub(crate) const HEADER: &str = "id,firstname,lastname,email,email2,profession";

#[derive(Debug, Default)]
pub(crate) struct GaugedStore {
    inner: InMemoryStore,
    delay: Duration,
    current: AtomicUsize,
    high_water: AtomicUsize,
    pub(crate) batch_sizes: Mutex<Vec<usize>>,
}

impl GaugedStore {
    pub(crate) fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub(crate) fn high_water(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }

    pub(crate) async fn stored(&self) -> Vec<StoredRecord> {
        self.inner.records.lock().await.clone()
    }
}

#[async_trait]
impl Store for GaugedStore {
    async fn insert_many(&self, records: Vec<Record>) -> Result<Vec<u64>> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);
        self.batch_sizes.lock().await.push(records.len());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let ids = self.inner.insert_many(records).await;

        self.current.fetch_sub(1, Ordering::SeqCst);
        ids
    }

    async fn recent(&self, limit: usize) -> Result<Vec<StoredRecord>> {
        self.inner.recent(limit).await
    }
}

#[derive(Debug)]
pub(crate) struct FailingStore {
    inner: InMemoryStore,
    fail_on_call: usize,
    calls: AtomicUsize,
}

impl FailingStore {
    /// 💀 `fail_on_call` is 1-based: `FailingStore::new(1)` fails the very first write.
    pub(crate) fn new(fail_on_call: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryStore::new(),
            fail_on_call,
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) async fn stored_count(&self) -> usize {
        self.inner.records.lock().await.len()
    }
}

#[async_trait]
impl Store for FailingStore {
    async fn insert_many(&self, records: Vec<Record>) -> Result<Vec<u64>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on_call {
            bail!("💀 the store fell over on write #{call}, as rehearsed");
        }
        self.inner.insert_many(records).await
    }

    async fn recent(&self, limit: usize) -> Result<Vec<StoredRecord>> {
        self.inner.recent(limit).await
    }
}
