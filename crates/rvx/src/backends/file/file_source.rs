use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::{
    fs::File,
    io::{self, AsyncBufReadExt},
};
use tracing::{debug, trace};

use crate::backends::Source;
use crate::progress::ProgressMetrics;

// -- 📊 redraw the progress table every this-many lines. Redrawing per line is a DoS on your terminal.
const PROGRESS_EVERY_LINES: u64 = 4096;

// -- 📂 FileSourceConfig — "It's just a file", said no sysadmin ever before the disk filled up.
// -- Built in code by the CLI and the upload handler, never read from TOML:
// -- which file to read is a per-run decision, not a deployment one.
#[derive(Debug, Clone)]
pub(crate) struct FileSourceConfig {
    pub(crate) file_name: PathBuf,
    /// 🎨 draw the progress bar? the CLI says yes, the server says please no
    pub(crate) show_progress: bool,
}

/// 📂 FileSource — reads a file one line at a time and hands each line over
/// without its terminator.
///
/// Think of it like a very diligent intern who reads a massive CSV aloud,
/// one row per breath, and only stops at EOF.
///
/// 🧵 Async, non-blocking. The BufReader wraps a tokio `File`.
/// 🔒 The file handle lives exactly as long as this struct. Drop it and the file is
///     closed, which is what the upload handler relies on before deleting the temp file.
pub(crate) struct FileSource {
    buf_reader: io::BufReader<File>,
    source_config: FileSourceConfig,
    progress: ProgressMetrics,
    // -- 📦 bytes/lines read since the last progress redraw
    pending_bytes: u64,
    pending_lines: u64,
    exhausted: bool,
}

// 🐛 progress is left out: nobody debugging a FileSource wants a wall of counters.
impl std::fmt::Debug for FileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSource")
            .field("source_config", &self.source_config)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

impl FileSource {
    /// 🚀 Opens the file, grabs its size for the progress bar, wraps it in a BufReader.
    ///
    /// If the file doesn't exist: 💀 anyhow will tell you with *theatrical flair*.
    /// If metadata fails: we assume 0 bytes and the progress bar shows unknown.
    pub(crate) async fn new(source_config: FileSourceConfig) -> Result<Self> {
        let file_handle = File::open(&source_config.file_name)
            .await
            .context(format!(
                "💀 The door to '{}' would not budge. We knocked. We pleaded. \
                We checked if it existed (it might not). We checked permissions (they might be wrong). \
                The file remains unopened. We remain outside.",
                source_config.file_name.display()
            ))?;

        let file_size = file_handle.metadata().await.map(|m| m.len()).unwrap_or(0);
        let source_name = source_config.file_name.display().to_string();
        let progress = if source_config.show_progress {
            ProgressMetrics::new(source_name, file_size)
        } else {
            ProgressMetrics::hidden(source_name)
        };

        Ok(Self {
            buf_reader: io::BufReader::new(file_handle),
            source_config,
            progress,
            pending_bytes: 0,
            pending_lines: 0,
            exhausted: false,
        })
    }

    fn flush_progress(&mut self) {
        self.progress.update(self.pending_bytes, self.pending_lines);
        self.pending_bytes = 0;
        self.pending_lines = 0;
    }
}

#[async_trait]
impl Source for FileSource {
    /// 📄 Read the next line. `\n` and `\r\n` are stripped; a last line with no
    /// newline at all still counts as a line. Returns `None` at EOF.
    async fn next_line(&mut self) -> Result<Option<String>> {
        if self.exhausted {
            return Ok(None);
        }

        let mut raw = Vec::new();
        let bytes_read = self.buf_reader.read_until(b'\n', &mut raw).await.context(format!(
            "💀 Reading '{}' went sideways mid-stream. The disk hiccuped, \
            and this run is over.",
            self.source_config.file_name.display()
        ))?;

        if bytes_read == 0 {
            self.exhausted = true;
            self.flush_progress();
            self.progress.finish();
            debug!(
                "🏁 reached EOF on '{}' after {} lines / {} bytes",
                self.source_config.file_name.display(),
                self.progress.total_lines(),
                self.progress.total_bytes()
            );
            return Ok(None);
        }

        if raw.ends_with(b"\n") {
            raw.pop();
            if raw.ends_with(b"\r") {
                raw.pop();
            }
        }

        // -- 🔤 a Latin-1 "José" from a spreadsheet export is one odd row, not a reason to
        // -- stop reading. bad bytes become U+FFFD and the row goes on to the parser.
        let line = match String::from_utf8(raw) {
            Ok(line) => line,
            Err(not_utf8) => {
                trace!("🔤 a line was not valid UTF-8, decoding it lossily");
                String::from_utf8_lossy(not_utf8.as_bytes()).into_owned()
            }
        };

        self.pending_bytes += bytes_read as u64;
        self.pending_lines += 1;
        if self.pending_lines >= PROGRESS_EVERY_LINES {
            trace!(
                "📖 hauled another {} lines out of the file like a digital fishing trip",
                self.pending_lines
            );
            self.flush_progress();
        }

        Ok(Some(line))
    }
}
