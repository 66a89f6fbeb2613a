//! 🚜 rvx — streams CSV rows into a record store, in batches, without drowning it.
//!
//! Two ways in:
//! - [`ingest_file`] runs one ingestion over a CSV on disk and returns the counts.
//! - [`serve`] puts the same pipeline behind `POST /upload` and `GET /list`.
//!
//! 🦆 The duck is here for moral support only.

pub mod app_config;
mod backends;
mod batcher;
mod common;
pub mod parser;
mod pipeline;
mod progress;
mod scheduler;
mod server;
#[cfg(test)]
mod test_utils;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::app_config::{AppConfig, StoreConfig};
use crate::backends::{FileSource, FileSourceConfig, StoreBackend};
use crate::pipeline::IngestPipeline;

pub use common::{IngestReport, Record, StoredRecord};

/// 🚀 Ingest one CSV file into the configured store, with a progress bar.
///
/// The first line is the header and is skipped. Malformed lines are counted
/// in [`IngestReport::skipped_lines`] and otherwise ignored. Any source or
/// store fault fails the whole call; batches already written stay written.
pub async fn ingest_file(app_config: &AppConfig, file_name: &Path) -> Result<IngestReport> {
    if matches!(app_config.store_config, StoreConfig::InMemory) {
        info!("🧠 using the in-memory store: records vanish when this process exits");
    }

    let store = Arc::new(StoreBackend::from_config(&app_config.store_config).await?);
    let mut source = FileSource::new(FileSourceConfig {
        file_name: file_name.to_path_buf(),
        show_progress: true,
    })
    .await?;

    IngestPipeline::new(store, &app_config.runtime)
        .run(&mut source)
        .await
        .context(format!(
            "💀 Ingestion of '{}' did not make it to the end",
            file_name.display()
        ))
}

/// 🌐 Serve `POST /upload` and `GET /list` until Ctrl-C.
pub async fn serve(app_config: AppConfig) -> Result<()> {
    let store = Arc::new(StoreBackend::from_config(&app_config.store_config).await?);
    let state = server::AppState::new(store, app_config.runtime.clone(), &app_config.server);

    let listener = tokio::net::TcpListener::bind(&app_config.server.bind_addr)
        .await
        .context(format!(
            "💀 Could not bind to '{}'. Something else is sitting in our chair.",
            app_config.server.bind_addr
        ))?;
    info!("🌐 listening on {}", app_config.server.bind_addr);

    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("💀 The HTTP server stopped unexpectedly")?;

    info!("👋 server shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("⚠️ could not listen for Ctrl-C, shutting down now: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::{FileStoreConfig, RuntimeConfig};
    use std::io::Write;

    #[tokio::test]
    async fn the_one_where_a_csv_on_disk_lands_in_an_ndjson_store() {
        let dir = tempfile::tempdir().expect("💀 no temp dir for us");
        let csv_path = dir.path().join("people.csv");
        let mut csv = std::fs::File::create(&csv_path).expect("💀 could not create the csv");
        writeln!(csv, "id,firstname,lastname,email,email2,profession").unwrap();
        writeln!(csv, "1,Ada,Lovelace,ada@example.com,ada2@example.com,mathematician").unwrap();
        writeln!(csv, "2,broken,line").unwrap();
        write!(csv, "3,Grace,Hopper,grace@example.com,grace2@example.com,admiral").unwrap();
        drop(csv);

        let store_path = dir.path().join("records.ndjson");
        let app_config = AppConfig {
            store_config: StoreConfig::File(FileStoreConfig {
                file_name: store_path.clone(),
            }),
            runtime: RuntimeConfig {
                batch_size: 1,
                max_parallel_writes: 3,
            },
            ..AppConfig::default()
        };

        let report = ingest_file(&app_config, &csv_path).await.unwrap();
        assert_eq!(
            report,
            IngestReport {
                inserted_count: 2,
                total_lines: 3,
                skipped_lines: 1,
            }
        );

        let stored = std::fs::read_to_string(&store_path).unwrap();
        let stored: Vec<StoredRecord> = stored
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(stored.len(), 2);
        let mut ids: Vec<i64> = stored.iter().map(|s| s.record.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn the_one_where_a_latin1_export_still_gets_every_row_in() {
        let dir = tempfile::tempdir().expect("💀 no temp dir for us");
        let csv_path = dir.path().join("excel_export.csv");
        std::fs::write(
            &csv_path,
            b"id,firstname,lastname,email,email2,profession\r\n\
              1,Jos\xe9,Perez,jose@example.com,jose2@example.com,chef\r\n\
              2,Ana,Diaz,ana@example.com,ana2@example.com,pilot\r\n",
        )
        .expect("💀 could not write the csv");

        let store_path = dir.path().join("records.ndjson");
        let app_config = AppConfig {
            store_config: StoreConfig::File(FileStoreConfig {
                file_name: store_path.clone(),
            }),
            ..AppConfig::default()
        };

        let report = ingest_file(&app_config, &csv_path).await.unwrap();
        assert_eq!(
            report,
            IngestReport {
                inserted_count: 2,
                total_lines: 2,
                skipped_lines: 0,
            }
        );

        let stored = std::fs::read_to_string(&store_path).unwrap();
        let first: StoredRecord = serde_json::from_str(stored.lines().next().unwrap()).unwrap();
        assert_eq!(first.record.firstname, "Jos\u{FFFD}");
    }

    #[tokio::test]
    async fn the_one_where_a_missing_csv_is_an_error_not_a_zero() {
        let dir = tempfile::tempdir().expect("💀 no temp dir for us");
        let err = ingest_file(&AppConfig::default(), &dir.path().join("nope.csv"))
            .await
            .expect_err("💀 a missing file cannot be ingested");
        assert!(format!("{err:#}").contains("would not budge"));
    }
}
