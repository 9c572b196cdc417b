//! Soft failures recorded while the engine streams items.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// A source file that could not be opened during streaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    /// Catalog index of the item.
    pub index: u32,
    /// The source path that failed.
    pub path: PathBuf,
    /// Platform error code, when the OS reported one.
    pub os_code: Option<i32>,
    /// Rendered error message.
    pub message: String,
}

impl fmt::Display for FailedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)?;
        if let Some(code) = self.os_code {
            write!(f, " (os error {})", code)?;
        }
        Ok(())
    }
}

/// Ordered log of soft failures for one build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureLog {
    items: Vec<FailedItem>,
}

impl FailureLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that item `index` could not be opened.
    pub fn record(&mut self, index: u32, path: &Path, error: &io::Error) {
        self.items.push(FailedItem {
            index,
            path: path.to_path_buf(),
            os_code: error.raw_os_error(),
            message: error.to_string(),
        });
    }

    /// Returns the recorded failures in order.
    pub fn items(&self) -> &[FailedItem] {
        &self.items
    }

    /// Returns the number of failures.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing failed.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consumes the log.
    pub fn into_items(self) -> Vec<FailedItem> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_order_and_code() {
        let mut log = FailureLog::new();
        log.record(3, Path::new("a.txt"), &io::Error::from_raw_os_error(2));
        log.record(1, Path::new("b.txt"), &io::Error::other("locked"));

        assert_eq!(log.len(), 2);
        assert_eq!(log.items()[0].index, 3);
        assert_eq!(log.items()[0].os_code, Some(2));
        assert_eq!(log.items()[1].os_code, None);
        assert_eq!(log.items()[1].to_string(), "b.txt: locked");
        assert_eq!(log.into_items()[1].path, PathBuf::from("b.txt"));
    }
}
