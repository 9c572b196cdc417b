//! The ordered catalog of entries destined for one archive.
//!
//! The catalog is built once per build by [`collect`] and is read-only
//! afterwards. Entry indices are stable: index `i` in the catalog is the
//! index the engine uses for that entry throughout the callback phase.
//!
//! # Example
//!
//! ```rust,ignore
//! use sevenz_update::catalog::{collect_with, CollectOptions};
//!
//! let catalog = collect_with(&["a.txt", "d"], &CollectOptions::new())?;
//! for entry in catalog.iter() {
//!     println!("{} <- {}", entry.archive_path, entry.source_path.display());
//! }
//! ```

mod attributes;
mod collect;

use std::fs::Metadata;
use std::path::PathBuf;

use crate::{ArchivePath, Timestamp};

pub use attributes::{
    EntryAttributes, FILE_ATTRIBUTE_ARCHIVE, FILE_ATTRIBUTE_DIRECTORY, FILE_ATTRIBUTE_READONLY,
    FILE_ATTRIBUTE_UNIX_EXTENSION,
};
pub use collect::{CollectOptions, collect, collect_with};

/// One file or directory destined for the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Name inside the archive.
    pub archive_path: ArchivePath,
    /// Where the data is read from.
    pub source_path: PathBuf,
    /// Uncompressed size; zero for directories.
    pub size: u64,
    /// Whether the entry is a directory.
    pub is_directory: bool,
    /// Creation time.
    pub created: Option<Timestamp>,
    /// Last modification time.
    pub modified: Option<Timestamp>,
    /// Last access time.
    pub accessed: Option<Timestamp>,
    /// Windows attribute bits.
    pub attributes: u32,
    /// Unix mode bits, when known.
    pub posix_mode: Option<u32>,
}

impl ArchiveEntry {
    /// Builds an entry from metadata captured during traversal.
    pub fn from_metadata(
        archive_path: ArchivePath,
        source_path: impl Into<PathBuf>,
        metadata: &Metadata,
    ) -> Self {
        let is_directory = metadata.is_dir();
        let attrs = EntryAttributes::from_metadata(metadata);
        Self {
            archive_path,
            source_path: source_path.into(),
            size: if is_directory { 0 } else { metadata.len() },
            is_directory,
            created: metadata.created().ok().and_then(Timestamp::from_system_time),
            modified: metadata.modified().ok().and_then(Timestamp::from_system_time),
            accessed: metadata.accessed().ok().and_then(Timestamp::from_system_time),
            attributes: attrs.attributes,
            posix_mode: attrs.posix_mode,
        }
    }

    /// Builds a file entry without timestamps.
    pub fn file(archive_path: ArchivePath, source_path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            archive_path,
            source_path: source_path.into(),
            size,
            is_directory: false,
            created: None,
            modified: None,
            accessed: None,
            attributes: FILE_ATTRIBUTE_ARCHIVE,
            posix_mode: None,
        }
    }

    /// Builds a directory entry without timestamps.
    pub fn directory(archive_path: ArchivePath, source_path: impl Into<PathBuf>) -> Self {
        Self {
            size: 0,
            is_directory: true,
            attributes: FILE_ATTRIBUTE_DIRECTORY,
            ..Self::file(archive_path, source_path, 0)
        }
    }
}

/// Insertion-ordered entries of one build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryCatalog {
    entries: Vec<ArchiveEntry>,
}

impl EntryCatalog {
    /// Creates a catalog from entries in their final order.
    pub fn from_entries(entries: Vec<ArchiveEntry>) -> Self {
        Self { entries }
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entry at an engine index.
    pub fn get(&self, index: u32) -> Option<&ArchiveEntry> {
        self.entries.get(index as usize)
    }

    /// Iterates entries in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, ArchiveEntry> {
        self.entries.iter()
    }

    /// Returns the sum of file sizes.
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }

    /// Returns the number of file entries.
    pub fn file_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_directory).count()
    }

    /// Returns the number of directory entries.
    pub fn directory_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_directory).count()
    }

    /// Returns the entry count as the engine sees it.
    pub fn count(&self) -> u32 {
        u32::try_from(self.entries.len()).unwrap_or(u32::MAX)
    }

    pub(crate) fn push(&mut self, entry: ArchiveEntry) {
        self.entries.push(entry);
    }
}

impl<'a> IntoIterator for &'a EntryCatalog {
    type Item = &'a ArchiveEntry;
    type IntoIter = std::slice::Iter<'a, ArchiveEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
