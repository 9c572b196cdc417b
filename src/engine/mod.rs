//! The archive-engine boundary.
//!
//! An archive engine is the component that actually compresses data and lays
//! out the 7z container. This crate never does either: it hands the engine an
//! output stream and an [`ArchiveUpdateCallback`], and the engine pulls item
//! metadata, item data, passwords and volume streams from that callback in a
//! single blocking [`OutArchive::update_items`] call.
//!
//! # Lifecycle
//!
//! ```text
//! EngineLoader::load()          -> Box<dyn ArchiveEngine>
//! ArchiveEngine::create_object() -> Box<dyn OutArchive>
//! OutArchive::set_properties()   (level, header encryption, timestamps)
//! OutArchive::update_items()     engine calls back into the callback
//! ```
//!
//! Loading is an explicit, scoped step of each build; dropping the engine
//! releases it.
//!
//! # Backends
//!
//! With the `zesven` feature the crate provides [`ZesvenEngine`], a pure-Rust
//! 7z writer driven through this protocol. Any other engine, including one
//! backed by a native library, plugs in by implementing these traits.

mod callback;
mod property;
#[cfg(feature = "zesven")]
mod zesven;

use std::fmt;
use std::io::{Seek, Write};

use crate::Result;

pub use callback::{
    ArchiveUpdateCallback, CryptoPasswordCallback, ItemStream, OperationResult, UpdateCallback,
    UpdateItemInfo, VolumeCallback,
};
pub use property::{PropId, PropValue};
#[cfg(feature = "zesven")]
pub use zesven::{ZesvenArchive, ZesvenEngine, ZesvenLoader};

/// A seekable output stream handed to the engine.
pub trait OutStream: Write + Seek {}

impl<T: Write + Seek> OutStream for T {}

/// Archive formats an engine may be asked to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ArchiveFormat {
    /// The 7z container.
    SevenZip,
}

impl ArchiveFormat {
    /// Returns the format name.
    pub fn name(self) -> &'static str {
        match self {
            ArchiveFormat::SevenZip => "7z",
        }
    }

    /// Returns the customary file extension, without a dot.
    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::SevenZip => "7z",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Engine object interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum InterfaceId {
    /// An archive writer.
    OutArchive,
    /// An archive reader.
    InArchive,
}

impl InterfaceId {
    /// Returns the interface name.
    pub fn name(self) -> &'static str {
        match self {
            InterfaceId::OutArchive => "IOutArchive",
            InterfaceId::InArchive => "IInArchive",
        }
    }
}

/// Produces a loaded engine for the duration of one build.
pub trait EngineLoader {
    /// Loads and initializes the engine.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EngineLoad`](crate::Error::EngineLoad) when the
    /// engine is unavailable.
    fn load(&self) -> Result<Box<dyn ArchiveEngine>>;
}

impl<F> EngineLoader for F
where
    F: Fn() -> Result<Box<dyn ArchiveEngine>>,
{
    fn load(&self) -> Result<Box<dyn ArchiveEngine>> {
        self()
    }
}

/// A loaded archive engine.
pub trait ArchiveEngine {
    /// Returns a short engine name for diagnostics.
    fn name(&self) -> &str;

    /// Creates an archive object for `format` exposing `interface`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`](crate::Error::UnsupportedFormat)
    /// or [`Error::UnsupportedInterface`](crate::Error::UnsupportedInterface).
    fn create_object(
        &self,
        format: ArchiveFormat,
        interface: InterfaceId,
    ) -> Result<Box<dyn OutArchive>>;
}

/// An archive writer object.
pub trait OutArchive {
    /// Applies named engine properties such as `x` (level) or `he`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Property`](crate::Error::Property) for an unknown
    /// name or an out-of-range value.
    fn set_properties(&mut self, properties: &[(&str, PropValue)]) -> Result<()>;

    /// Writes `count` items pulled from `callback` into `output`.
    ///
    /// The engine calls back once per item and, in volume mode, once per
    /// volume boundary before returning. Item indices are `0..count`.
    fn update_items(
        &mut self,
        output: Box<dyn OutStream>,
        count: u32,
        callback: &mut dyn ArchiveUpdateCallback,
    ) -> Result<()>;
}
