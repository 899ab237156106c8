//! Single-line progress output on stderr.
//!
//! Every redraw overwrites the previous line: the text is padded with spaces
//! (or cut) to the terminal width and terminated with `\r`.

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

use console::Term;
use humansize::{format_size, BINARY};

use crate::config::ProgressConfig;

/// Render a byte count as `"<bytes> (<human size>)"` fitted to `width`.
///
/// Without a known width the line is returned unpadded.
pub fn format_progress_line(bytes: u64, width: Option<usize>) -> String {
    let line = format!("{} ({})", bytes, format_size(bytes, BINARY));
    let len = line.chars().count();

    match width {
        Some(width) if len < width => format!("{:<width$}", line, width = width),
        Some(width) if len > width => line.chars().take(width).collect(),
        _ => line,
    }
}

/// Draws progress lines on stderr, or nothing when disabled.
#[derive(Debug, Clone, Copy)]
pub struct ProgressReporter {
    enabled: bool,
}

impl ProgressReporter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Redraw the byte counter line.
    pub fn bytes(&self, bytes: u64) {
        if !self.enabled {
            return;
        }
        write_line(&format_progress_line(bytes, terminal_width()));
    }

    /// Redraw the `checked/total` line of the query phase.
    pub fn queries(&self, checked: usize, total: usize) {
        if !self.enabled {
            return;
        }
        write_line(&format!("{}/{}", checked, total));
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl From<&ProgressConfig> for ProgressReporter {
    fn from(config: &ProgressConfig) -> Self {
        Self::new(config.enabled)
    }
}

fn terminal_width() -> Option<usize> {
    Term::stderr()
        .size_checked()
        .map(|(_rows, cols)| cols as usize)
        .filter(|cols| *cols > 0)
}

fn write_line(line: &str) {
    let mut stderr = std::io::stderr().lock();
    // Progress output is best effort.
    let _ = write!(stderr, "{}\r", line);
    let _ = stderr.flush();
}

/// Running byte total for one retrieval attempt.
///
/// Clones share the same total. The lock is held only for the update and the
/// redraw that goes with it.
#[derive(Debug, Clone)]
pub struct ByteCounter {
    total: Arc<Mutex<u64>>,
    progress: ProgressReporter,
}

impl ByteCounter {
    pub fn new(progress: ProgressReporter) -> Self {
        Self {
            total: Arc::new(Mutex::new(0)),
            progress,
        }
    }

    /// Add `bytes` to the total and redraw. Returns the new total.
    pub fn add(&self, bytes: u64) -> u64 {
        let mut total = self.lock();
        *total = total.saturating_add(bytes);
        self.progress.bytes(*total);
        *total
    }

    /// Record a cumulative count reported by a transfer and redraw.
    ///
    /// The total never goes backwards, even if reports arrive out of order.
    pub fn observe_total(&self, received: u64) -> u64 {
        let mut total = self.lock();
        *total = (*total).max(received);
        self.progress.bytes(*total);
        *total
    }

    pub fn total(&self) -> u64 {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, u64> {
        self.total.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
