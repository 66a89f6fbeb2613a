//! 📊 progress.rs — "Are we there yet?" — every upload, every time, forever.
//!
//! 🚀 Answers the age-old question "how fast are the rows moving?" with a
//! progress bar and a comfy-table underneath it. Fed by the file source as it
//! reads, so the numbers are lines *read*, not lines *persisted*. The store
//! might still be chewing.
//!
//! ⚠️ Watching this progress bar will not make it go faster. Science says no.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::NOTHING};
use indicatif::{ProgressBar, ProgressStyle};

// -- 📏 one mebibyte — not a megabyte, pedants.
const MIB: f64 = 1024.0 * 1024.0;

// -- ⏱️ rates are computed over this much recent history so spikes don't scare anyone
const RATE_WINDOW: Duration = Duration::from_secs(5);

// -- 🎨 indicatif owns the clock: elapsed, eta and the percentage come from the bar itself
const BAR_TEMPLATE: &str = "{msg}\n| [{bar:40.cyan/blue}] {percent:>3}%  {elapsed_precise} elapsed, eta {eta}";

/// 🔢 "1000000" → "1,000,000" — you're welcome, eyes.
fn with_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// 📊 Tracks bytes and lines pulled out of a file and paints them onto an
/// indicatif bar whose length is the file size.
///
/// # Ancient Proverb
/// "He who uploads a 2GB CSV without a progress bar, uploads alone and in darkness."
pub(crate) struct ProgressMetrics {
    source_name: String,
    total_bytes: u64,
    total_lines: u64,
    progress_bar: ProgressBar,
    /// 🔄 (timestamp, bytes, lines) samples inside the rate window
    rate_samples: VecDeque<(Instant, u64, u64)>,
}

impl std::fmt::Debug for ProgressMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // -- 🎭 custom Debug because ProgressBar is a diva and doesn't derive Debug
        f.debug_struct("ProgressMetrics")
            .field("source_name", &self.source_name)
            .field("total_bytes", &self.total_bytes)
            .field("total_lines", &self.total_lines)
            .finish()
    }
}

impl ProgressMetrics {
    /// 🚀 A progress bar that draws to the terminal. `file_size` is the bar's
    /// length in bytes; 0 just means the bar never fills.
    pub(crate) fn new(source_name: String, file_size: u64) -> Self {
        let progress_bar = ProgressBar::new(file_size);
        // -- 🐛 the template is a literal; if it ever fails to parse we keep indicatif's default
        if let Ok(style) = ProgressStyle::default_bar().template(BAR_TEMPLATE) {
            progress_bar.set_style(style.progress_chars("=>-"));
        }
        Self::with_bar(source_name, progress_bar)
    }

    /// 🙈 Same bookkeeping, no drawing. The server ingests behind an HTTP
    /// request; nobody is watching its stderr.
    pub(crate) fn hidden(source_name: String) -> Self {
        Self::with_bar(source_name, ProgressBar::hidden())
    }

    fn with_bar(source_name: String, progress_bar: ProgressBar) -> Self {
        Self {
            source_name,
            total_bytes: 0,
            total_lines: 0,
            progress_bar,
            rate_samples: VecDeque::from([(Instant::now(), 0, 0)]),
        }
    }

    /// 🔄 Feed the metrics with freshly read bytes and lines, then redraw.
    pub(crate) fn update(&mut self, bytes_read: u64, lines_read: u64) {
        self.total_bytes += bytes_read;
        self.total_lines += lines_read;

        if self.progress_bar.is_hidden() {
            return;
        }
        let (lines_per_sec, mib_per_sec) = self.rates_at(Instant::now());
        self.progress_bar.set_message(self.summary(lines_per_sec, mib_per_sec));
        self.progress_bar.set_position(self.total_bytes);
    }

    /// ✅ Ring the bell. We hit EOF.
    pub(crate) fn finish(&self) {
        self.progress_bar.finish();
    }

    pub(crate) fn total_lines(&self) -> u64 {
        self.total_lines
    }

    pub(crate) fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    // 📡 (lines/s, MiB/s) over the samples still inside the window.
    fn rates_at(&mut self, now: Instant) -> (f64, f64) {
        while let Some(&(timestamp, _, _)) = self.rate_samples.front() {
            if now.duration_since(timestamp) <= RATE_WINDOW || self.rate_samples.len() == 1 {
                break;
            }
            self.rate_samples.pop_front();
        }
        self.rate_samples
            .push_back((now, self.total_bytes, self.total_lines));

        let Some(&(oldest, oldest_bytes, oldest_lines)) = self.rate_samples.front() else {
            return (0.0, 0.0);
        };
        let elapsed = now.duration_since(oldest).as_secs_f64();
        if elapsed <= 0.0 {
            // -- 💤 no time has passed. no rate. maintain composure.
            return (0.0, 0.0);
        }
        (
            (self.total_lines - oldest_lines) as f64 / elapsed,
            (self.total_bytes - oldest_bytes) as f64 / elapsed / MIB,
        )
    }

    /// 🎨 The message above the bar:
    ///
    /// ```text
    /// source: people.csv
    ///   12,345 Lines/s   1,000,000 Lines
    ///     3.21 MiB/s        250.00 MiB read
    /// ```
    fn summary(&self, lines_per_sec: f64, mib_per_sec: f64) -> String {
        let mut table = Table::new();
        table.load_preset(NOTHING);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.add_row(vec![
            Cell::new(format!("{} Lines/s", with_thousands(lines_per_sec as u64)))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{} Lines", with_thousands(self.total_lines)))
                .set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new(format!("{mib_per_sec:.2} MiB/s")).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2} MiB read", self.total_bytes as f64 / MIB))
                .set_alignment(CellAlignment::Right),
        ]);
        format!("source: {}\n{}", self.source_name, table)
    }
}
