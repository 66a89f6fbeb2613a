//! 🚦 The Write Scheduler — the bouncer at the store's front door.
//!
//! At most `max_parallel_writes` batch writes are inside at any moment. Everyone
//! else waits in line at [`WriteScheduler::submit`], and that wait is the whole
//! backpressure story: the line reader can't get further ahead than
//! `max_parallel_writes × batch_size` records.
//!
//! 🧮 Counting rule: write tasks never touch a shared counter. They return how
//! many records the store persisted, and the scheduler adds those numbers up
//! when it collects the tasks (on the way into `submit`, and in `drain`).
//! One owner, one counter, zero races.
//!
//! 💀 Failure rule: the first failed write ends the run. Whatever else is in
//! flight is detached: it finishes or fails on its own, and nobody waits.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::debug;

use crate::backends::Store;
use crate::common::Record;

type WriteOutcome = Result<Result<usize>, JoinError>;

pub(crate) struct WriteScheduler<S: Store + 'static> {
    store: Arc<S>,
    permits: Arc<Semaphore>,
    in_flight: JoinSet<Result<usize>>,
    /// 🧮 persisted counts from writes collected since the last drain
    settled: usize,
}

impl<S: Store + 'static> std::fmt::Debug for WriteScheduler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteScheduler")
            .field("available_permits", &self.permits.available_permits())
            .field("in_flight", &self.in_flight.len())
            .field("settled", &self.settled)
            .finish()
    }
}

impl<S: Store + 'static> WriteScheduler<S> {
    /// 🏗️ A cap of 0 would deadlock the first submit forever. It becomes 1.
    pub(crate) fn new(store: Arc<S>, max_parallel_writes: usize) -> Self {
        Self {
            store,
            permits: Arc::new(Semaphore::new(max_parallel_writes.max(1))),
            in_flight: JoinSet::new(),
            settled: 0,
        }
    }

    /// 📊 Writes submitted but not yet collected.
    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// 🚚 Start writing `batch` in the background.
    ///
    /// Suspends while `max_parallel_writes` writes are already running. Once a
    /// slot frees up, finished writes are collected first, so a failure that
    /// happened while we waited surfaces here instead of at the final drain.
    pub(crate) async fn submit(&mut self, batch: Vec<Record>) -> Result<()> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .context("💀 The write scheduler's semaphore was closed. Nobody closes it. And yet.")?;

        self.reap_finished()?;

        let batch_len = batch.len();
        let store = self.store.clone();
        self.in_flight.spawn(async move {
            // -- 🔒 the permit rides along and is released when this write is done, pass or fail
            let _permit = permit;
            let ids = store
                .insert_many(batch)
                .await
                .context(format!("💀 The store rejected a batch of {batch_len} records"))?;
            Ok(ids.len())
        });

        debug!(
            "🚚 dispatched a batch of {} records ({} writes in flight)",
            batch_len,
            self.in_flight()
        );
        Ok(())
    }

    /// 🏁 Wait for every outstanding write and return the total persisted
    /// since the previous drain. Zero outstanding writes → `Ok(0)`.
    pub(crate) async fn drain(&mut self) -> Result<usize> {
        while let Some(outcome) = self.in_flight.join_next().await {
            self.settle(outcome)?;
        }
        Ok(std::mem::take(&mut self.settled))
    }

    // 🧹 Collect writes that already finished, without waiting for the rest.
    fn reap_finished(&mut self) -> Result<()> {
        while let Some(outcome) = self.in_flight.try_join_next() {
            self.settle(outcome)?;
        }
        Ok(())
    }

    fn settle(&mut self, outcome: WriteOutcome) -> Result<()> {
        let persisted = outcome
            .context("💀 A batch write task panicked or was cancelled before reporting back")
            .and_then(|write| write);

        match persisted {
            Ok(count) => {
                self.settled += count;
                Ok(())
            }
            Err(err) => {
                // -- 💀 abandon ship, but let the other lifeboats finish rowing
                self.in_flight.detach_all();
                Err(err)
            }
        }
    }
}

impl<S: Store + 'static> Drop for WriteScheduler<S> {
    // 🔓 A dropped JoinSet aborts its tasks. Writes already handed to the store
    // should get to finish, so they are detached instead.
    fn drop(&mut self) {
        self.in_flight.detach_all();
    }
}
