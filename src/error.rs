//! Error types for archive build operations.
//!
//! This module provides the [`Error`] enum which represents every failure
//! mode of an archive build, from loading the engine to assembling a
//! self-extracting executable, along with a convenient [`Result<T>`] alias.
//!
//! # Failure Classes
//!
//! | Class | Variants | Effect |
//! |-------|----------|--------|
//! | Fatal | [`EngineLoad`][Error::EngineLoad], [`PathNotFound`][Error::PathNotFound], [`DirectoryRead`][Error::DirectoryRead], [`NoEntries`][Error::NoEntries], [`CreateOutput`][Error::CreateOutput], [`Property`][Error::Property], ... | Build aborts, no partial product |
//! | Partial | [`PartialFailure`][Error::PartialFailure] | Engine succeeded but some sources were omitted |
//!
//! Per-item open failures never surface as an `Error` while the engine is
//! running; they are recorded by the update callback and reported as
//! [`Error::PartialFailure`] once the write call returns.
//!
//! ```rust
//! use sevenz_update::Error;
//!
//! fn describe(error: &Error) -> String {
//!     match error {
//!         Error::PartialFailure { failures } => {
//!             format!("{} file(s) were left out of the archive", failures.len())
//!         }
//!         e if e.is_fatal() => format!("build aborted: {}", e),
//!         e => e.to_string(),
//!     }
//! }
//! ```

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::callback::FailedItem;

/// Helper struct for formatting PartialFailure error messages.
struct PartialFailureDisplay<'a> {
    failures: &'a [FailedItem],
}

impl fmt::Display for PartialFailureDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} file(s) failed to compress", self.failures.len())?;
        for item in self.failures {
            write!(f, "\n  {}", item.path.display())?;
        }
        Ok(())
    }
}

/// The main error type for archive build operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred outside of a more specific context.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The archive engine could not be loaded or initialized.
    #[error("Cannot load archive engine: {0}")]
    EngineLoad(String),

    /// The engine does not implement the requested archive format.
    #[error("Unsupported archive format: {format}")]
    UnsupportedFormat {
        /// Name of the requested format.
        format: &'static str,
    },

    /// The engine does not expose the requested object interface.
    #[error("Unsupported engine interface: {interface}")]
    UnsupportedInterface {
        /// Name of the requested interface.
        interface: &'static str,
    },

    /// An input path does not exist.
    #[error("Cannot find file or directory: {}", path.display())]
    PathNotFound {
        /// The missing input path.
        path: PathBuf,
    },

    /// A directory could not be read during traversal.
    #[error("Cannot read directory {}: {source}", path.display())]
    DirectoryRead {
        /// The directory (or entry) being read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// A file name cannot be represented as an archive path.
    #[error("Invalid archive path: {0}")]
    InvalidArchivePath(String),

    /// Collection produced no entries.
    #[error("No files found to compress")]
    NoEntries,

    /// An output file could not be created.
    #[error("Cannot create {}: {source}", path.display())]
    CreateOutput {
        /// The output path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// An engine property could not be applied.
    #[error("Cannot set property '{name}': {reason}")]
    Property {
        /// Property name.
        name: String,
        /// Why the property was rejected.
        reason: String,
    },

    /// Compression level outside 0-9.
    #[error("invalid compression level {level}: must be 0-9")]
    InvalidCompressionLevel {
        /// The rejected level.
        level: u32,
    },

    /// Volume size below the start-header size, or an empty size list.
    #[error(
        "Volume size must be at least {} bytes",
        crate::volume::MIN_VOLUME_SIZE
    )]
    InvalidVolumeSize,

    /// The engine queried an index outside the catalog.
    #[error("Item index {index} out of range (catalog has {len} entries)")]
    InvalidIndex {
        /// The requested index.
        index: u32,
        /// Catalog size.
        len: usize,
    },

    /// A capability was queried that the current build does not configure.
    #[error("{0} is not configured for this build")]
    NotApplicable(&'static str),

    /// The engine called back after the callback phase completed.
    #[error("Update callback already completed")]
    CallbackCompleted,

    /// The engine reported a failure of the write call.
    #[error("Compression failed: {0}")]
    Engine(String),

    /// The engine succeeded but some source files were omitted.
    #[error("{}", PartialFailureDisplay { failures })]
    PartialFailure {
        /// Items that could not be read during streaming.
        failures: Vec<FailedItem>,
    },

    /// An SFX input (stub or archive) could not be opened.
    #[error("Cannot open SFX input {}: {source}", path.display())]
    SfxInput {
        /// The input path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// No SFX stub was found at the expected location.
    #[error("SFX module not found: {}", path.display())]
    SfxStubMissing {
        /// Where the stub was looked up.
        path: PathBuf,
    },
}

impl Error {
    /// Returns `true` if this error aborted the build before producing an archive.
    ///
    /// Everything except [`Error::PartialFailure`] is fatal.
    pub fn is_fatal(&self) -> bool {
        !self.is_partial_failure()
    }

    /// Returns `true` if the engine succeeded but some items were omitted.
    pub fn is_partial_failure(&self) -> bool {
        matches!(self, Error::PartialFailure { .. })
    }

    /// Returns the source paths that were left out, if this is a partial failure.
    pub fn failed_paths(&self) -> Vec<&std::path::Path> {
        match self {
            Error::PartialFailure { failures } => {
                failures.iter().map(|item| item.path.as_path()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Returns the path associated with this error, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Error::PathNotFound { path }
            | Error::DirectoryRead { path, .. }
            | Error::CreateOutput { path, .. }
            | Error::SfxInput { path, .. }
            | Error::SfxStubMissing { path } => Some(path),
            _ => None,
        }
    }

    /// Creates a property error.
    pub fn property(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Property {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a create-output error for the given path.
    pub fn create_output(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::CreateOutput {
            path: path.into(),
            source,
        }
    }
}

/// A specialized Result type for archive build operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(path: &str) -> FailedItem {
        FailedItem {
            index: 0,
            path: PathBuf::from(path),
            os_code: Some(2),
            message: "No such file or directory".into(),
        }
    }

    #[test]
    fn test_io_error_from() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_path_not_found_display() {
        let err = Error::PathNotFound {
            path: PathBuf::from("missing.txt"),
        };
        assert_eq!(err.to_string(), "Cannot find file or directory: missing.txt");
        assert_eq!(err.path(), Some(std::path::Path::new("missing.txt")));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_partial_failure_lists_paths() {
        let err = Error::PartialFailure {
            failures: vec![failed("a.txt"), failed("dir/b.txt")],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("2 file(s) failed to compress"));
        assert!(msg.contains("a.txt"));
        assert!(msg.contains("dir/b.txt"));
        assert!(err.is_partial_failure());
        assert!(!err.is_fatal());
        assert_eq!(err.failed_paths().len(), 2);
    }

    #[test]
    fn test_failed_paths_empty_for_fatal() {
        assert!(Error::NoEntries.failed_paths().is_empty());
    }

    #[test]
    fn test_convenience_constructors() {
        let err = Error::property("x", "level out of range");
        assert_eq!(
            err.to_string(),
            "Cannot set property 'x': level out of range"
        );

        let err = Error::create_output(
            "out.7z",
            io::Error::new(io::ErrorKind::AlreadyExists, "exists"),
        );
        assert!(matches!(err, Error::CreateOutput { .. }));
        assert_eq!(err.path(), Some(std::path::Path::new("out.7z")));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
