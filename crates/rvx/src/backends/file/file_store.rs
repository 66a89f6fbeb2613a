use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::{
    fs::{File, OpenOptions},
    io::{self, AsyncWriteExt},
    sync::Mutex,
};
use tracing::{debug, trace};

use crate::backends::Store;
use crate::common::{Record, StoredRecord};

// -- 🚰 FileStoreConfig — lives next to the FileStore that uses it.
// -- One backend = one config = one file. No scavenger hunts at 2am.
#[derive(Debug, Deserialize, Clone)]
pub struct FileStoreConfig {
    pub file_name: PathBuf,
}

/// 🗄️ FileStore — an append-only NDJSON file, one [`StoredRecord`] per line.
///
/// Several batch writes share one store, so the writer and the sequence counter
/// sit behind a single mutex: a batch's lines land contiguously and ids never
/// collide. Every insert flushes before returning, so "persisted" means the
/// bytes left our buffer.
///
/// ⚠️ Opening appends. It never truncates. Sequence ids pick up after the last
/// line already in the file.
#[derive(Debug)]
pub(crate) struct FileStore {
    config: FileStoreConfig,
    state: Mutex<FileStoreState>,
}

#[derive(Debug)]
struct FileStoreState {
    writer: io::BufWriter<File>,
    last_seq: u64,
}

impl FileStore {
    /// 🚀 Open (or create) the store file and figure out where the ids left off.
    pub(crate) async fn new(config: FileStoreConfig) -> Result<Self> {
        let last_seq = match tokio::fs::try_exists(&config.file_name).await {
            Ok(true) => last_seq_in(&config.file_name).await?,
            _ => 0,
        };

        let file_handle = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.file_name)
            .await
            .context(format!(
                "💀 The store file '{}' could not be conjured into existence. \
                We stared at the path. The path stared back. \
                One of us was wrong about whether the parent directory existed. It was us.",
                config.file_name.display()
            ))?;

        debug!(
            "🗄️ file store '{}' open for appending, last sequence id {}",
            config.file_name.display(),
            last_seq
        );

        Ok(Self {
            config,
            state: Mutex::new(FileStoreState {
                writer: io::BufWriter::new(file_handle),
                last_seq,
            }),
        })
    }
}

// 🔎 The last non-blank line tells us the last id handed out. An empty file says 0.
async fn last_seq_in(path: &std::path::Path) -> Result<u64> {
    let contents = tokio::fs::read_to_string(path).await.context(format!(
        "💀 Could not read back the existing store file '{}'",
        path.display()
    ))?;
    match contents.lines().rev().find(|line| !line.trim().is_empty()) {
        Some(line) => {
            let stored: StoredRecord = serde_json::from_str(line).context(format!(
                "💀 The last line of '{}' is not a stored record. Someone has been editing by hand.",
                path.display()
            ))?;
            Ok(stored.seq)
        }
        None => Ok(0),
    }
}

#[async_trait]
impl Store for FileStore {
    /// 📡 Serialize, append, flush. One lock for the whole batch.
    async fn insert_many(&self, records: Vec<Record>) -> Result<Vec<u64>> {
        let mut state = self.state.lock().await;
        let mut ids = Vec::with_capacity(records.len());

        for record in records {
            let stored = StoredRecord {
                seq: state.last_seq + 1,
                record,
            };
            let mut line = serde_json::to_string(&stored)
                .context("💀 A record refused to become JSON. Records are strings and an i64. How.")?;
            line.push('\n');
            state
                .writer
                .write_all(line.as_bytes())
                .await
                .context(format!(
                    "💀 Appending to '{}' failed. The disk may be full. The disk is usually full.",
                    self.config.file_name.display()
                ))?;
            state.last_seq = stored.seq;
            ids.push(stored.seq);
        }

        state.writer.flush().await.context(format!(
            "💀 Flushing '{}' failed — the buffer held its data to the very end, \
            the storage unit was locked.",
            self.config.file_name.display()
        ))?;

        trace!(
            "📬 {} records walked into the file store — written down, flushed",
            ids.len()
        );
        Ok(ids)
    }

    /// 🕰️ Read the file back and take the tail, newest first.
    ///
    /// Holds the lock while reading so a half-written batch is never observed.
    async fn recent(&self, limit: usize) -> Result<Vec<StoredRecord>> {
        let _state = self.state.lock().await;
        let contents = tokio::fs::read_to_string(&self.config.file_name)
            .await
            .context(format!(
                "💀 Could not read '{}' to list recent records",
                self.config.file_name.display()
            ))?;

        contents
            .lines()
            .rev()
            .filter(|line| !line.trim().is_empty())
            .take(limit)
            .map(|line| {
                serde_json::from_str(line).context("💀 A line in the store file is not a stored record")
            })
            .collect()
    }
}
