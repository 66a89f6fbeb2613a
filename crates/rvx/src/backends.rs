//! 🔌 Backends — where the real I/O happens.
//!
//! 🚰 Sources pour lines in, Stores swallow records whole.
//! And in between, the pipeline parses, batches, and schedules. We just do I/O.
//!
//! 🎭 This module is the casting agency. Need lines from a file on disk? From a
//! `Vec<String>` in a test? Need records kept in RAM, or appended to an NDJSON
//! file? We've got a backend for that. We've got two of each, which is
//! technically "backends for days" if the days are Tuesday and Wednesday.
//!
//! 🦆 The duck is here because every file must have one. This is law.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::common::{Record, StoredRecord};

pub(crate) mod file;
pub(crate) mod in_mem;

pub use file::FileStoreConfig;
pub(crate) use file::{FileSource, FileSourceConfig, FileStore};
#[cfg(test)]
pub(crate) use in_mem::InMemorySource;
pub(crate) use in_mem::InMemoryStore;

// ===== Source Trait =====

/// 🚰 A lazy, finite, forward-only producer of text lines.
///
/// # Contract
/// - `next_line` yields lines in order, without their `\n` / `\r\n` terminator.
/// - `Ok(None)` means end of stream. Calling again after that keeps returning `Ok(None)`.
/// - `Err(...)` is fatal to whoever is reading. No partial credit.
///
/// No backend enum on this side: the pipeline is generic over its source, and
/// the only production source is the file one.
#[async_trait]
pub(crate) trait Source: std::fmt::Debug + Send {
    /// 📄 Fetch the next line, or `None` when the well runs dry.
    async fn next_line(&mut self) -> Result<Option<String>>;
}

// ===== Store Trait and Backend Enum =====

/// 🗄️ The persistence collaborator.
///
/// Shared behind an `Arc` by several concurrent batch writes at once, hence
/// `&self` everywhere and `Send + Sync`. Implementations bring their own locks.
///
/// # Contract
/// - `insert_many` persists the whole batch (or fails) and returns one sequence
///   id per persisted record. The pipeline only ever looks at the length.
/// - `recent` returns at most `limit` stored records, newest first.
#[async_trait]
pub(crate) trait Store: std::fmt::Debug + Send + Sync {
    /// 📥 Persist a batch. Returns the ids the store assigned.
    async fn insert_many(&self, records: Vec<Record>) -> Result<Vec<u64>>;
    /// 🕰️ The latest arrivals, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<StoredRecord>>;
}

/// 🔧 Which store to build. TOML looks like `[store_config.File]` with a
/// `file_name`, or `store_config = "InMemory"`. Leave it out and you get RAM.
#[derive(Debug, Deserialize, Clone, Default)]
pub enum StoreConfig {
    #[default]
    InMemory,
    File(FileStoreConfig),
}

/// 🎭 The many faces of a Store. Enum dispatch, so the pipeline and the
/// server stay generic without a `dyn` in sight.
#[derive(Debug)]
pub(crate) enum StoreBackend {
    InMemory(InMemoryStore),
    File(FileStore),
}

impl StoreBackend {
    /// 🏗️ Build the configured store. The file store opens (or creates) its
    /// file here, so a bad path fails at startup and not 10,000 rows deep.
    pub(crate) async fn from_config(config: &StoreConfig) -> Result<Self> {
        Ok(match config {
            StoreConfig::InMemory => StoreBackend::InMemory(InMemoryStore::new()),
            StoreConfig::File(file_config) => {
                StoreBackend::File(FileStore::new(file_config.clone()).await?)
            }
        })
    }
}

#[async_trait]
impl Store for StoreBackend {
    async fn insert_many(&self, records: Vec<Record>) -> Result<Vec<u64>> {
        match self {
            StoreBackend::InMemory(store) => store.insert_many(records).await,
            StoreBackend::File(store) => store.insert_many(records).await,
        }
    }

    async fn recent(&self, limit: usize) -> Result<Vec<StoredRecord>> {
        match self {
            StoreBackend::InMemory(store) => store.recent(limit).await,
            StoreBackend::File(store) => store.recent(limit).await,
        }
    }
}
