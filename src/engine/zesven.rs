//! Archive engine backed by the pure-Rust `zesven` 7z writer.
//!
//! The engine pulls everything from the update callback: the password comes
//! from [`crypto_password`](super::CryptoPasswordCallback::crypto_password),
//! item metadata from [`property`](super::UpdateCallback::property), item
//! data from [`stream`](super::UpdateCallback::stream).
//! When the callback reports a size for volume 0 the output is routed
//! through a [`VolumeSpanWriter`] that asks the callback for each further
//! volume stream.
//!
//! Supported properties:
//!
//! | Name | Value | Effect |
//! |------|-------|--------|
//! | `x`  | 0-9   | Compression level |
//! | `he` | switch | Encrypt the archive header (file names) |
//! | `tc`, `ta`, `tm` | switch | Store creation, access, modification times |

use std::cell::RefCell;
use std::io::{Seek, Write};

use zesven::write::{EntryMeta, WriteOptions, WriteResult, Writer};

use super::{
    ArchiveEngine, ArchiveFormat, ArchiveUpdateCallback, EngineLoader, InterfaceId, ItemStream,
    OperationResult, OutArchive, OutStream, PropId, PropValue, VolumeCallback,
};
use crate::crypto::Password;
use crate::volume::{VolumeSpanWriter, unwrap_carried_error};
use crate::{Error, Result};

/// Compression level used until `x` is set.
const DEFAULT_LEVEL: u32 = 5;

/// Loads the [`ZesvenEngine`]. Loading cannot fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZesvenLoader;

impl EngineLoader for ZesvenLoader {
    fn load(&self) -> Result<Box<dyn ArchiveEngine>> {
        Ok(Box::new(ZesvenEngine))
    }
}

/// The zesven engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZesvenEngine;

impl ArchiveEngine for ZesvenEngine {
    fn name(&self) -> &str {
        "zesven"
    }

    fn create_object(
        &self,
        format: ArchiveFormat,
        interface: InterfaceId,
    ) -> Result<Box<dyn OutArchive>> {
        match format {
            ArchiveFormat::SevenZip => {}
        }
        if interface != InterfaceId::OutArchive {
            return Err(Error::UnsupportedInterface {
                interface: interface.name(),
            });
        }
        Ok(Box::new(ZesvenArchive::default()))
    }
}

/// A 7z writer object configured through engine properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZesvenArchive {
    level: u32,
    encrypt_header: bool,
    times: TimeFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TimeFlags {
    ctime: bool,
    atime: bool,
    mtime: bool,
}

impl Default for ZesvenArchive {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
            encrypt_header: false,
            times: TimeFlags {
                ctime: false,
                atime: false,
                mtime: true,
            },
        }
    }
}

impl ZesvenArchive {
    /// Returns the configured compression level.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Returns true if the header is encrypted when a password is given.
    pub fn encrypts_header(&self) -> bool {
        self.encrypt_header
    }

    fn write_options(&self, password: Option<&Password>) -> Result<WriteOptions> {
        let options = WriteOptions::new()
            .level(self.level)
            .map_err(|e| Error::property("x", e.to_string()))?;
        Ok(match password {
            Some(password) => options
                .password(password.as_str())
                .encrypt_data(true)
                .encrypt_header(self.encrypt_header),
            None => options,
        })
    }
}

fn switch(name: &str, value: &PropValue) -> Result<bool> {
    value
        .as_switch()
        .ok_or_else(|| Error::property(name, format!("expected on/off, got {:?}", value)))
}

impl OutArchive for ZesvenArchive {
    fn set_properties(&mut self, properties: &[(&str, PropValue)]) -> Result<()> {
        for (name, value) in properties {
            match *name {
                "x" => {
                    let level = value
                        .as_u32()
                        .filter(|level| *level <= 9)
                        .ok_or_else(|| Error::property("x", "level must be 0-9"))?;
                    self.level = level;
                }
                "he" => self.encrypt_header = switch(name, value)?,
                "tc" => self.times.ctime = switch(name, value)?,
                "ta" => self.times.atime = switch(name, value)?,
                "tm" => self.times.mtime = switch(name, value)?,
                other => return Err(Error::property(other, "unknown property")),
            }
        }
        Ok(())
    }

    fn update_items(
        &mut self,
        output: Box<dyn OutStream>,
        count: u32,
        callback: &mut dyn ArchiveUpdateCallback,
    ) -> Result<()> {
        let password = callback.crypto_password();
        let options = self.write_options(password.as_ref())?;
        let multi_volume = callback.volume_size(0).is_some();
        let cell = RefCell::new(callback);

        if multi_volume {
            let span = VolumeSpanWriter::new(output, SharedCallback(&cell))?;
            let writer = Writer::create(span).map_err(engine_error)?.options(options);
            let (result, span) = write_items(writer, count, &cell, self.times)?;
            let sizes = span.finish().map_err(carried_error)?;
            log::debug!(
                "zesven: {} entries in {} volume(s)",
                result.entries_written,
                sizes.len()
            );
        } else {
            let writer = Writer::create(output).map_err(engine_error)?.options(options);
            let (result, mut sink) = write_items(writer, count, &cell, self.times)?;
            sink.flush()?;
            log::debug!(
                "zesven: {} entries, {} -> {} bytes",
                result.entries_written,
                result.total_size,
                result.compressed_size
            );
        }
        Ok(())
    }
}

type CallbackCell<'c, 'a> = &'c RefCell<&'a mut dyn ArchiveUpdateCallback>;

/// Forwards volume queries from the span writer into the shared callback.
struct SharedCallback<'c, 'a>(CallbackCell<'c, 'a>);

impl VolumeCallback for SharedCallback<'_, '_> {
    fn volume_size(&mut self, index: u32) -> Option<u64> {
        self.0.borrow_mut().volume_size(index)
    }

    fn volume_stream(&mut self, index: u32) -> Result<Box<dyn OutStream>> {
        self.0.borrow_mut().volume_stream(index)
    }
}

/// Pulls `count` items from the callback into `writer`.
///
/// No borrow of the callback is held while the writer runs, since the span
/// writer may call back for the next volume.
fn write_items<W: Write + Seek>(
    mut writer: Writer<W>,
    count: u32,
    cell: CallbackCell<'_, '_>,
    times: TimeFlags,
) -> Result<(WriteResult, W)> {
    let mut total = 0u64;
    for index in 0..count {
        let size = cell.borrow_mut().property(index, PropId::Size)?;
        total = total.saturating_add(as_u64(&size));
    }
    cell.borrow_mut().set_total(total);

    let mut completed = 0u64;
    for index in 0..count {
        let info = cell.borrow_mut().update_item_info(index)?;
        if info.index_in_archive.is_some() {
            return Err(Error::Engine(
                "updating items of an existing archive is not supported".into(),
            ));
        }

        let (path, meta) = item_metadata(&mut **cell.borrow_mut(), index, times)?;
        let size = meta.size;
        let stream = cell.borrow_mut().stream(index)?;

        match stream {
            ItemStream::Skipped => {
                cell.borrow_mut()
                    .set_operation_result(OperationResult::Skipped);
                continue;
            }
            ItemStream::Directory => writer.add_directory(path, meta).map_err(engine_error)?,
            ItemStream::Data(mut reader) => writer
                .add_stream(path, &mut *reader, meta)
                .map_err(engine_error)?,
        }

        completed = completed.saturating_add(size);
        let mut callback = cell.borrow_mut();
        callback.set_completed(completed);
        callback.set_operation_result(OperationResult::Ok);
    }

    writer.finish_into_inner().map_err(engine_error)
}

fn item_metadata(
    callback: &mut dyn ArchiveUpdateCallback,
    index: u32,
    times: TimeFlags,
) -> Result<(zesven::ArchivePath, EntryMeta)> {
    let name = match callback.property(index, PropId::Path)? {
        PropValue::Str(name) => name,
        other => {
            return Err(Error::Engine(format!(
                "item {} has no path (got {:?})",
                index, other
            )));
        }
    };
    let path = zesven::ArchivePath::new(&name)
        .map_err(|e| Error::InvalidArchivePath(format!("{}: {}", name, e)))?;

    let is_directory = matches!(callback.property(index, PropId::IsDir)?, PropValue::Bool(true));
    let mut meta = if is_directory {
        EntryMeta::directory()
    } else {
        EntryMeta::file(as_u64(&callback.property(index, PropId::Size)?))
    };

    if times.ctime {
        meta.creation_time = filetime(callback.property(index, PropId::CTime)?);
    }
    if times.atime {
        meta.access_time = filetime(callback.property(index, PropId::ATime)?);
    }
    if times.mtime {
        meta.modification_time = filetime(callback.property(index, PropId::MTime)?);
    }
    if let PropValue::U32(attributes) = callback.property(index, PropId::Attrib)? {
        meta.attributes = Some(attributes);
    }
    meta.is_anti = matches!(callback.property(index, PropId::IsAnti)?, PropValue::Bool(true));

    Ok((path, meta))
}

fn as_u64(value: &PropValue) -> u64 {
    match value {
        PropValue::U64(n) => *n,
        PropValue::U32(n) => u64::from(*n),
        _ => 0,
    }
}

fn filetime(value: PropValue) -> Option<u64> {
    match value {
        PropValue::FileTime(time) => Some(u64::from(time)),
        _ => None,
    }
}

fn engine_error(error: zesven::Error) -> Error {
    match error {
        zesven::Error::Io(e) => carried_error(e),
        other => Error::Engine(other.to_string()),
    }
}

fn carried_error(error: std::io::Error) -> Error {
    unwrap_carried_error(error).unwrap_or_else(Error::Io)
}
