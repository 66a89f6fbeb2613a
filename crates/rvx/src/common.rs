//! 📦 Common data structures — the building blocks of rowvex
//!
//! ---
//!
//! 🎬 COLD OPEN — INT. UPLOAD ENDPOINT — 3:47 AM
//!
//! Somebody just uploaded a 2GB CSV. Somewhere in there, a row with five commas
//! instead of six waits patiently to ruin nobody's night, because we skip it and
//! count it. Everyone else becomes a [`Record`], rides a batch into the store,
//! and gets a sequence number like a deli ticket. 🦆
//!
//! ---
//!
//! These are the humble, load-bearing structs that ferry rows from the upload to
//! the store. They don't ask questions. They carry the data.

use serde::{Deserialize, Serialize};

/// 🎯 A `Record` — one validated CSV row, trimmed and typed.
///
/// Field names are the wire names. They show up verbatim in the NDJSON store
/// and in the `/list` response, so renaming one is a breaking change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// 🔢 The row's own identifier, straight from column one.
    /// NOT unique. Nobody promised unique. Dedup is somebody else's problem.
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub email2: String,
    pub profession: String,
}

/// 🗄️ A `Record` after the store has stamped it with a sequence id.
///
/// `_id` grows by one per persisted record and is what "newest first" sorts on.
/// The record itself is flattened next to it, so the JSON looks like
/// `{"_id": 7, "id": 1, "firstname": "Ada", ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    #[serde(rename = "_id")]
    pub seq: u64,
    #[serde(flatten)]
    pub record: Record,
}

/// 📊 The final tally of one ingestion run. Computed once. Never persisted.
///
/// - `inserted_count`: what the store says it persisted, summed at drain points.
/// - `total_lines`: every line after the header, good or bad.
/// - `skipped_lines`: lines the parser rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub inserted_count: usize,
    pub total_lines: usize,
    pub skipped_lines: usize,
}

impl IngestReport {
    /// ✅ Lines that made it past the parser. Whether the store kept them all is
    /// `inserted_count`'s business.
    pub fn accepted_lines(&self) -> usize {
        self.total_lines - self.skipped_lines
    }
}
