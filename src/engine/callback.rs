//! Callback traits the engine pulls from during `update_items`.

use std::fmt;
use std::io::Read;

use super::{OutStream, PropId, PropValue};
use crate::Result;
use crate::crypto::Password;

/// How the engine should treat an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateItemInfo {
    /// The item carries new data to compress.
    pub new_data: bool,
    /// The item carries new properties.
    pub new_properties: bool,
    /// Index of the item in an existing archive, `None` for new items.
    pub index_in_archive: Option<u32>,
}

impl UpdateItemInfo {
    /// An item added to a freshly created archive.
    pub const fn fresh() -> Self {
        Self {
            new_data: true,
            new_properties: true,
            index_in_archive: None,
        }
    }
}

/// The answer to a stream request.
pub enum ItemStream {
    /// Sequential reader over the item's data.
    Data(Box<dyn Read>),
    /// The item is a directory and has no data.
    Directory,
    /// The source could not be opened; the engine skips the item's data.
    Skipped,
}

impl ItemStream {
    /// Returns `true` for [`ItemStream::Skipped`].
    pub fn is_skipped(&self) -> bool {
        matches!(self, ItemStream::Skipped)
    }
}

impl fmt::Debug for ItemStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemStream::Data(_) => f.write_str("Data(..)"),
            ItemStream::Directory => f.write_str("Directory"),
            ItemStream::Skipped => f.write_str("Skipped"),
        }
    }
}

/// Per-item result reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// The item was written.
    Ok,
    /// The item's data was not written.
    Skipped,
    /// The item failed inside the engine.
    Error(String),
}

impl OperationResult {
    /// Returns `true` for [`OperationResult::Ok`].
    pub fn is_ok(&self) -> bool {
        matches!(self, OperationResult::Ok)
    }
}

/// Item metadata, data and progress queries.
pub trait UpdateCallback {
    /// Receives the total number of bytes to be read.
    fn set_total(&mut self, total: u64);

    /// Receives the number of bytes processed so far.
    fn set_completed(&mut self, completed: u64);

    /// Describes how item `index` should be treated.
    fn update_item_info(&mut self, index: u32) -> Result<UpdateItemInfo>;

    /// Returns property `id` of item `index`.
    ///
    /// Unavailable values are [`PropValue::Empty`].
    fn property(&mut self, index: u32, id: PropId) -> Result<PropValue>;

    /// Opens the data of item `index`.
    ///
    /// A source that cannot be opened is answered with
    /// [`ItemStream::Skipped`], not an error.
    fn stream(&mut self, index: u32) -> Result<ItemStream>;

    /// Receives the result of the item last streamed.
    fn set_operation_result(&mut self, result: OperationResult);
}

/// Password query for encrypted archives.
pub trait CryptoPasswordCallback {
    /// Returns the password, or `None` when none is configured.
    fn crypto_password(&mut self) -> Option<Password>;
}

/// Volume-size and volume-stream queries for split archives.
pub trait VolumeCallback {
    /// Returns the byte limit of volume `index` (0-based).
    ///
    /// `None` means the archive is not split.
    fn volume_size(&mut self, index: u32) -> Option<u64>;

    /// Creates the output stream for volume `index` (0-based).
    fn volume_stream(&mut self, index: u32) -> Result<Box<dyn OutStream>>;
}

/// The full callback surface handed to an engine.
pub trait ArchiveUpdateCallback: UpdateCallback + CryptoPasswordCallback + VolumeCallback {}

impl<T: UpdateCallback + CryptoPasswordCallback + VolumeCallback> ArchiveUpdateCallback for T {}
