//! Progress bar implementation for archive builds.

use indicatif::{ProgressBar, ProgressStyle};
use sevenz_update::ProgressReporter;
use std::path::Path;

/// Byte progress bar with the current item as message
pub struct CliProgress {
    bar: ProgressBar,
    failed: u64,
}

impl CliProgress {
    /// Creates a progress display, hidden when `quiet`
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(0);
            let style = ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {wide_msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");
            pb.set_style(style);
            pb
        };
        Self { bar, failed: 0 }
    }
}

impl ProgressReporter for CliProgress {
    fn on_total(&mut self, total: u64) {
        self.bar.set_length(total);
    }

    fn on_completed(&mut self, completed: u64) {
        self.bar.set_position(completed);
    }

    fn on_item_start(&mut self, name: &str, _size: u64) {
        let display_name = if name.chars().count() > 40 {
            let tail: String = name.chars().rev().take(37).collect();
            format!("...{}", tail.chars().rev().collect::<String>())
        } else {
            name.to_string()
        };
        self.bar.set_message(display_name);
    }

    fn on_item_done(&mut self, ok: bool) {
        if !ok {
            self.failed += 1;
        }
    }

    fn on_volume(&mut self, index: u32, path: &Path) {
        self.bar
            .println(format!("Volume {}: {}", index + 1, path.display()));
    }

    fn finish_line(&mut self) {
        self.bar.set_message("");
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if self.failed == 0 {
            self.bar.finish_and_clear();
        } else {
            self.bar
                .abandon_with_message(format!("{} item(s) skipped", self.failed));
        }
    }
}
