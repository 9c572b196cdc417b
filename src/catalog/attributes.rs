//! Platform attribute bits recorded for each entry.

use std::fs::Metadata;

/// Read-only file.
pub const FILE_ATTRIBUTE_READONLY: u32 = 0x01;
/// Directory.
pub const FILE_ATTRIBUTE_DIRECTORY: u32 = 0x10;
/// File marked for archiving.
pub const FILE_ATTRIBUTE_ARCHIVE: u32 = 0x20;
/// Marks that the high 16 bits hold a Unix `st_mode`.
pub const FILE_ATTRIBUTE_UNIX_EXTENSION: u32 = 0x8000;

/// Attribute bits and optional Unix mode captured from file metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryAttributes {
    /// Windows attribute bits, with the Unix extension on Unix.
    pub attributes: u32,
    /// Unix permission and type bits, when the platform has them.
    pub posix_mode: Option<u32>,
}

impl EntryAttributes {
    /// Reads attribute bits from metadata.
    #[cfg(windows)]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        use std::os::windows::fs::MetadataExt;

        Self {
            attributes: metadata.file_attributes(),
            posix_mode: None,
        }
    }

    /// Reads attribute bits from metadata.
    #[cfg(unix)]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;

        Self::from_unix_mode(metadata.mode(), metadata.is_dir())
    }

    /// Reads attribute bits from metadata.
    #[cfg(not(any(unix, windows)))]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let mut attributes = if metadata.is_dir() {
            FILE_ATTRIBUTE_DIRECTORY
        } else {
            FILE_ATTRIBUTE_ARCHIVE
        };
        if metadata.permissions().readonly() {
            attributes |= FILE_ATTRIBUTE_READONLY;
        }
        Self {
            attributes,
            posix_mode: None,
        }
    }

    /// Encodes a Unix `st_mode` the way 7-Zip stores it.
    pub fn from_unix_mode(mode: u32, is_dir: bool) -> Self {
        let mode = mode & 0xFFFF;
        let mut attributes = if is_dir {
            FILE_ATTRIBUTE_DIRECTORY
        } else {
            FILE_ATTRIBUTE_ARCHIVE
        };
        if mode & 0o200 == 0 {
            attributes |= FILE_ATTRIBUTE_READONLY;
        }
        attributes |= FILE_ATTRIBUTE_UNIX_EXTENSION | (mode << 16);
        Self {
            attributes,
            posix_mode: Some(mode),
        }
    }

    /// Returns `true` if the directory bit is set.
    pub fn is_directory(&self) -> bool {
        self.attributes & FILE_ATTRIBUTE_DIRECTORY != 0
    }
}
