//! 🔧 App Configuration — the sacred TOML-to-struct pipeline.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the fridge.
//! In the junk drawer. Nothing." — every developer at 3am 🦆
//!
//! 🏗️ Powered by Figment, because manually parsing env vars is a form of
//! self-harm that even the borrow checker wouldn't approve of.

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub use crate::backends::{FileStoreConfig, StoreConfig};

/// 📦 The AppConfig: one struct to rule them all.
///
/// Every section has a default, so an empty config is a valid config: an
/// in-memory store, batches of 10,000, three writes at a time, listening on
/// localhost:3000.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// 🗄️ Where records end up.
    #[serde(default)]
    pub store_config: StoreConfig,
    #[serde(default, alias = "pipeline")]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// 🚜 The pipeline's knobs.
#[derive(Debug, Deserialize, Clone)]
pub struct RuntimeConfig {
    /// 📦 Records per batch write. One batch = one `insert_many` call.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// 🚦 Batch writes allowed in flight at once.
    #[serde(default = "default_max_parallel_writes", alias = "max_parallel_inserts")]
    pub max_parallel_writes: usize,
}

// 📦 10,000 records per batch — a nice round number that will age like milk
// the moment someone uploads rows with a 50KB profession field.
fn default_batch_size() -> usize {
    10_000
}

// 🚦 three at a time. enough to overlap, not enough to drown the store.
fn default_max_parallel_writes() -> usize {
    3
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_parallel_writes: default_max_parallel_writes(),
        }
    }
}

/// 🌐 The HTTP front door.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// 🕰️ How many records `GET /list` returns.
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
    /// 📏 Largest upload body accepted, in bytes. axum's 2MB default is a
    /// polite suggestion for JSON, not for CSV exports.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// 📁 Where uploads are spooled while they're ingested. Unset means the
    /// system temp dir. Each upload's file is deleted when its request ends.
    #[serde(default)]
    pub upload_dir: Option<PathBuf>,
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_list_limit() -> usize {
    10
}

// 📏 1 GiB. If your CSV is bigger than this, it's not a CSV, it's a lifestyle.
fn default_max_upload_bytes() -> usize {
    1024 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            list_limit: default_list_limit(),
            max_upload_bytes: default_max_upload_bytes(),
            upload_dir: None,
        }
    }
}

/// 🚀 Load the config — from a file, from env vars, or from the sheer power of hoping.
///
/// 🔧 Environment variables (`RVX_*`, nested sections split on `__`, e.g.
/// `RVX_RUNTIME__BATCH_SIZE=500`) are the base layer; an optional TOML file is
/// merged on top and wins on conflicts.
///
/// 📐 DESIGN NOTE:
///   - `config_file_name` is None  → env vars only (and defaults).
///   - `config_file_name` is Some  → env vars + TOML file, merged.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    let config = Figment::new().merge(Env::prefixed("RVX_").split("__"));

    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    // 💬 Build a context message that will actually TELL you what went wrong.
    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables (RVX_*). \
             The file exists in our hearts, but apparently not in valid TOML.",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (RVX_*). \
                 No file was provided — this one's all on the environment. Classic."
            .to_string(),
    };

    config.extract().context(context_msg)
}
