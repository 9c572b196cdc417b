//! Progress reporting for archive builds.
//!
//! The engine reports byte totals and completion through the update
//! callback, which forwards them, together with per-item and per-volume
//! events, to a [`ProgressReporter`]. A reporter may keep a single status
//! line open between events; [`ProgressReporter::finish_line`] closes it.
//!
//! # Example
//!
//! ```rust,ignore
//! use sevenz_update::progress::progress_fn;
//! use sevenz_update::{ArchiveDriver, ZesvenLoader};
//!
//! let report = ArchiveDriver::new(&ZesvenLoader).build_with_progress(
//!     &["docs"],
//!     "docs.7z",
//!     progress_fn(|done, total| eprint!("\r{}/{} bytes", done, total)),
//! )?;
//! ```

use std::path::Path;

/// IEC byte unit: 1 KiB = 1024 bytes.
pub const BYTES_KIB: u64 = 1024;
/// IEC byte unit: 1 MiB = 1024 KiB.
pub const BYTES_MIB: u64 = 1024 * BYTES_KIB;
/// IEC byte unit: 1 GiB = 1024 MiB.
pub const BYTES_GIB: u64 = 1024 * BYTES_MIB;

/// Receives progress events from the update callback.
///
/// Every method has an empty default so implementors override only what
/// they display.
pub trait ProgressReporter {
    /// Called with the total number of bytes the engine will read.
    fn on_total(&mut self, total_bytes: u64) {
        let _ = total_bytes;
    }

    /// Called with the number of bytes processed so far.
    fn on_completed(&mut self, completed_bytes: u64) {
        let _ = completed_bytes;
    }

    /// Called when the engine starts reading an item.
    fn on_item_start(&mut self, archive_path: &str, size: u64) {
        let _ = (archive_path, size);
    }

    /// Called when the engine reports the result of an item.
    fn on_item_done(&mut self, success: bool) {
        let _ = success;
    }

    /// Called when a new volume file has been created.
    fn on_volume(&mut self, index: u32, path: &Path) {
        let _ = (index, path);
    }

    /// Closes a status line left open by previous events.
    fn finish_line(&mut self) {}
}

impl<P: ProgressReporter + ?Sized> ProgressReporter for Box<P> {
    fn on_total(&mut self, total_bytes: u64) {
        (**self).on_total(total_bytes);
    }

    fn on_completed(&mut self, completed_bytes: u64) {
        (**self).on_completed(completed_bytes);
    }

    fn on_item_start(&mut self, archive_path: &str, size: u64) {
        (**self).on_item_start(archive_path, size);
    }

    fn on_item_done(&mut self, success: bool) {
        (**self).on_item_done(success);
    }

    fn on_volume(&mut self, index: u32, path: &Path) {
        (**self).on_volume(index, path);
    }

    fn finish_line(&mut self) {
        (**self).finish_line();
    }
}

/// A progress reporter that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

/// Adapts a `(completed, total)` closure into a [`ProgressReporter`].
pub struct FnProgress<F> {
    f: F,
    total: u64,
}

impl<F> FnProgress<F>
where
    F: FnMut(u64, u64),
{
    /// Creates a reporter that calls `f` on every completion update.
    pub fn new(f: F) -> Self {
        Self { f, total: 0 }
    }
}

impl<F> ProgressReporter for FnProgress<F>
where
    F: FnMut(u64, u64),
{
    fn on_total(&mut self, total_bytes: u64) {
        self.total = total_bytes;
    }

    fn on_completed(&mut self, completed_bytes: u64) {
        (self.f)(completed_bytes, self.total);
    }
}

/// Creates a closure-based progress reporter.
pub fn progress_fn<F>(f: F) -> FnProgress<F>
where
    F: FnMut(u64, u64),
{
    FnProgress::new(f)
}

/// A progress reporter that counts events.
#[derive(Debug, Default, Clone)]
pub struct StatisticsProgress {
    /// Last reported total.
    pub total_bytes: u64,
    /// Last reported completion.
    pub completed_bytes: u64,
    /// Items started.
    pub items_started: usize,
    /// Items reported as failed or skipped by the engine.
    pub items_failed: usize,
    /// Volumes created.
    pub volumes: usize,
    /// Number of status lines closed.
    pub lines_finished: usize,
}

impl StatisticsProgress {
    /// Creates an empty statistics reporter.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressReporter for StatisticsProgress {
    fn on_total(&mut self, total_bytes: u64) {
        self.total_bytes = total_bytes;
    }

    fn on_completed(&mut self, completed_bytes: u64) {
        self.completed_bytes = completed_bytes;
    }

    fn on_item_start(&mut self, _archive_path: &str, _size: u64) {
        self.items_started += 1;
    }

    fn on_item_done(&mut self, success: bool) {
        if !success {
            self.items_failed += 1;
        }
    }

    fn on_volume(&mut self, _index: u32, _path: &Path) {
        self.volumes += 1;
    }

    fn finish_line(&mut self) {
        self.lines_finished += 1;
    }
}

/// Formats bytes as a human-readable string using IEC units.
///
/// ```rust
/// use sevenz_update::progress::format_bytes_iec;
///
/// assert_eq!(format_bytes_iec(512), "512 B");
/// assert_eq!(format_bytes_iec(1536), "1.5 KiB");
/// assert_eq!(format_bytes_iec(1048576), "1.0 MiB");
/// ```
pub fn format_bytes_iec(bytes: u64) -> String {
    let b = bytes as f64;
    if bytes < BYTES_KIB {
        format!("{} B", bytes)
    } else if bytes < BYTES_MIB {
        format!("{:.1} KiB", b / BYTES_KIB as f64)
    } else if bytes < BYTES_GIB {
        format!("{:.1} MiB", b / BYTES_MIB as f64)
    } else {
        format!("{:.1} GiB", b / BYTES_GIB as f64)
    }
}
