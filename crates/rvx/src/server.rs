//! 🌐 The HTTP front desk — takes your CSV, hands you a receipt.
//!
//! - `POST /upload` — multipart, field `file`. Streams the upload into a temp
//!   file, runs the pipeline over it, answers with the counts.
//! - `GET /list` — the most recent records, newest first.
//!
//! Everything interesting happens in the pipeline. This module is plumbing, and
//! proud of it.
//!
//! 🗑️ Temp file rules: the file source is dropped (file closed) before the temp
//! file is deleted. Deletion happens on every exit path. A failed deletion after a
//! successful ingestion is logged and otherwise ignored: the rows are in the store,
//! and the caller deserves to hear about it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use crate::app_config::{RuntimeConfig, ServerConfig};
use crate::backends::{FileSource, FileSourceConfig, Store};
use crate::common::IngestReport;
use crate::pipeline::IngestPipeline;

/// 📦 What every handler gets a copy of. Cheap to clone: the store is behind an `Arc`.
pub(crate) struct AppState<S: Store + 'static> {
    store: Arc<S>,
    runtime: RuntimeConfig,
    list_limit: usize,
    max_upload_bytes: usize,
    upload_dir: Option<PathBuf>,
}

impl<S: Store + 'static> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            runtime: self.runtime.clone(),
            list_limit: self.list_limit,
            max_upload_bytes: self.max_upload_bytes,
            upload_dir: self.upload_dir.clone(),
        }
    }
}

impl<S: Store + 'static> AppState<S> {
    pub(crate) fn new(store: Arc<S>, runtime: RuntimeConfig, server: &ServerConfig) -> Self {
        Self {
            store,
            runtime,
            list_limit: server.list_limit,
            max_upload_bytes: server.max_upload_bytes,
            upload_dir: server.upload_dir.clone(),
        }
    }
}

pub(crate) fn router<S: Store + 'static>(state: AppState<S>) -> Router {
    let body_limit = state.max_upload_bytes;
    Router::new()
        .route("/upload", post(upload::<S>))
        .route("/list", get(list::<S>))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// 🧾 The receipt. Field names are part of the API; camelCase on the wire.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    message: &'static str,
    total_inserted: usize,
    total_lines: usize,
    skipped_lines: usize,
}

impl From<IngestReport> for UploadResponse {
    fn from(report: IngestReport) -> Self {
        Self {
            message: "File processed successfully.",
            total_inserted: report.inserted_count,
            total_lines: report.total_lines,
            skipped_lines: report.skipped_lines,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
}

fn error_response(status: StatusCode, error: &'static str) -> Response {
    (status, Json(ErrorBody { error })).into_response()
}

#[tracing::instrument(skip_all)]
async fn upload<S: Store + 'static>(
    State(state): State<AppState<S>>,
    mut multipart: Multipart,
) -> Response {
    let temp_file = match receive_upload(&mut multipart, state.upload_dir.as_deref()).await {
        Ok(Some(temp_file)) => temp_file,
        Ok(None) => return error_response(StatusCode::BAD_REQUEST, "No file was uploaded."),
        Err(err) => {
            error!("💀 could not receive the upload: {err:#}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to process the file");
        }
    };

    // -- 🗑️ on the error path, dropping temp_file deletes it
    let report = match ingest_upload(&state, temp_file.path()).await {
        Ok(report) => report,
        Err(err) => {
            error!("💀 ingestion of the uploaded file failed: {err:#}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to process the file");
        }
    };

    let temp_path = temp_file.path().to_path_buf();
    if let Err(err) = temp_file.close() {
        warn!(
            "⚠️ ingestion succeeded but the temp file '{}' refused to leave: {err}",
            temp_path.display()
        );
    }

    info!(
        "🧾 upload processed: inserted={}, total_lines={}, skipped={}",
        report.inserted_count, report.total_lines, report.skipped_lines
    );
    (StatusCode::OK, Json(UploadResponse::from(report))).into_response()
}

// 📥 Find the `file` field and stream it to a temp file. `Ok(None)` = no such field.
async fn receive_upload(
    multipart: &mut Multipart,
    upload_dir: Option<&Path>,
) -> Result<Option<NamedTempFile>> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .context("💀 Failed to read the next multipart field")?
    {
        if field.name() != Some("file") {
            debug!("🙈 ignoring multipart field {:?}", field.name());
            continue;
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix("rvx-upload-").suffix(".csv");
        let temp_file = match upload_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .context("💀 Could not create a temp file for the upload")?;
        let handle = temp_file
            .as_file()
            .try_clone()
            .context("💀 Could not get a writable handle on the upload temp file")?;
        let mut writer = tokio::io::BufWriter::new(tokio::fs::File::from_std(handle));

        let mut bytes_received = 0usize;
        while let Some(chunk) = field
            .chunk()
            .await
            .context("💀 The upload stream broke off mid-file")?
        {
            bytes_received += chunk.len();
            writer
                .write_all(&chunk)
                .await
                .context("💀 Writing the upload to its temp file failed")?;
        }
        writer
            .flush()
            .await
            .context("💀 Flushing the upload temp file failed")?;

        debug!(
            "📥 received {} bytes into '{}'",
            bytes_received,
            temp_file.path().display()
        );
        return Ok(Some(temp_file));
    }
    Ok(None)
}

// 🚜 The file source lives only inside this function, so its handle is closed
// by the time the caller deletes the file, pass or fail.
async fn ingest_upload<S: Store + 'static>(state: &AppState<S>, path: &Path) -> Result<IngestReport> {
    let mut source = FileSource::new(FileSourceConfig {
        file_name: path.to_path_buf(),
        show_progress: false,
    })
    .await?;
    IngestPipeline::new(state.store.clone(), &state.runtime)
        .run(&mut source)
        .await
}

#[tracing::instrument(skip_all)]
async fn list<S: Store + 'static>(State(state): State<AppState<S>>) -> Response {
    match state.store.recent(state.list_limit).await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(err) => {
            error!("💀 listing recent records failed: {err:#}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to list records")
        }
    }
}
