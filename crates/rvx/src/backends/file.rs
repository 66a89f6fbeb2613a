//! 📂 Previously, on "Things That Could Go Wrong With A File"...
//!
//! The disk was quiet. Too quiet. A lone process had been tasked with reading
//! an uploaded CSV — just a file, they said. Simple, they said.
//!
//! The file had `\r\n` line endings. The last line had no newline at all. And
//! the NDJSON store on the other end had been appended to by three batch
//! writes at once, which is exactly why it has a mutex.
//!
//! This module handles file-based I/O: a line source over a file on disk, and
//! an append-only NDJSON record store.
//!
//! 🚰 File → BufReader → lines → pipeline → FileStore → BufWriter → NDJSON
//! 💀 Disk full → your problem now
//! 🦆 (mandatory, no notes)

mod file_source;
mod file_store;

pub(crate) use file_source::{FileSource, FileSourceConfig};
pub use file_store::FileStoreConfig;
pub(crate) use file_store::FileStore;
