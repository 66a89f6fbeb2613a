//! 🎬 The Ingestion Pipeline — lines in, counts out.
//!
//! ```text
//!   Source ──line──▶ parse_line ──Record──▶ BatchAccumulator ──full batch──▶ WriteScheduler ──▶ Store
//!                        │
//!                        └──Rejection──▶ skipped_lines += 1
//! ```
//!
//! One producer (this loop) reads a line, parses it, appends it. When the batch
//! fills up it goes to the scheduler, which may make us wait for a free write
//! slot. At end of stream the tail batch goes out and everything is drained.
//!
//! 📐 Counting:
//! - `total_lines` is every line after the header, rejected ones included.
//! - `skipped_lines` is every line the parser rejected.
//! - `inserted_count` is whatever the store reported, summed at drain time.
//!
//! 💀 A source fault or a write fault ends the run with an error and no report.
//! Batches that already landed stay landed. There is no rollback across batches.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, trace};

use crate::app_config::RuntimeConfig;
use crate::backends::{Source, Store};
use crate::batcher::BatchAccumulator;
use crate::common::IngestReport;
use crate::parser::parse_line;
use crate::scheduler::WriteScheduler;

/// 🚜 Owns the knobs and the store handle. Each [`run`](IngestPipeline::run)
/// builds its own accumulator and scheduler, so runs never share batches.
#[derive(Debug)]
pub(crate) struct IngestPipeline<S: Store + 'static> {
    store: Arc<S>,
    batch_size: usize,
    max_parallel_writes: usize,
}

impl<S: Store + 'static> IngestPipeline<S> {
    pub(crate) fn new(store: Arc<S>, runtime: &RuntimeConfig) -> Self {
        Self {
            store,
            batch_size: runtime.batch_size,
            max_parallel_writes: runtime.max_parallel_writes,
        }
    }

    /// 🚀 Run one ingestion over `source`. The first line is the header and is
    /// never parsed.
    pub(crate) async fn run<Src: Source>(&self, source: &mut Src) -> Result<IngestReport> {
        info!(
            "🚜 ingestion starting: batch_size={}, max_parallel_writes={}",
            self.batch_size, self.max_parallel_writes
        );

        let mut accumulator = BatchAccumulator::new(self.batch_size);
        let mut scheduler = WriteScheduler::new(self.store.clone(), self.max_parallel_writes);
        let mut line_count = 0usize;
        let mut skipped_lines = 0usize;
        let mut inserted_count = 0usize;
        let mut batches_sent = 0usize;

        while let Some(line) = source
            .next_line()
            .await
            .context("💀 The line source gave out mid-ingestion")?
        {
            line_count += 1;
            if line_count == 1 {
                trace!("🎩 header tipped and discarded: {line}");
                continue;
            }

            let record = match parse_line(&line) {
                Ok(record) => record,
                Err(rejection) => {
                    skipped_lines += 1;
                    trace!("🙅 line {line_count} skipped: {rejection}");
                    continue;
                }
            };

            accumulator.append(record);
            if accumulator.is_full() {
                batches_sent += 1;
                scheduler
                    .submit(accumulator.drain())
                    .await
                    .context(format!("💀 Dispatching batch #{batches_sent} failed"))?;
            }
        }

        if !accumulator.is_empty() {
            batches_sent += 1;
            debug!(
                "🧺 end of stream, shipping the tail batch of {} records",
                accumulator.len()
            );
            scheduler
                .submit(accumulator.drain())
                .await
                .context(format!("💀 Dispatching the final batch #{batches_sent} failed"))?;
        }

        inserted_count += scheduler
            .drain()
            .await
            .context("💀 Waiting for the outstanding batch writes failed")?;

        let report = IngestReport {
            inserted_count,
            total_lines: line_count.saturating_sub(1),
            skipped_lines,
        };
        info!(
            "✅ ingestion done: inserted={}, total_lines={}, skipped={}, batches={}",
            report.inserted_count, report.total_lines, report.skipped_lines, batches_sent
        );
        Ok(report)
    }
}
