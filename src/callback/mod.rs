//! The update callback answered over a pre-built catalog.
//!
//! [`FileUpdateCallback`] is the passive side of an archive build: the engine
//! asks it for item metadata, item data, a password and volume streams, in
//! whatever order the engine needs. Metadata comes from the
//! [`EntryCatalog`] only; the file system is touched again solely to open
//! item sources and create volumes.
//!
//! # Failure Handling
//!
//! A source that cannot be opened is a soft failure: the item is answered
//! with [`ItemStream::Skipped`], a warning is logged and the path is kept in
//! the [`FailureLog`]. The driver inspects the log once the engine returns.
//!
//! # Phases
//!
//! ```text
//! Idle -> (MetadataQueried | StreamRequested | VolumeRequested)* -> Completed
//! ```
//!
//! After [`FileUpdateCallback::complete`] every further engine query fails
//! with [`Error::CallbackCompleted`].

mod failure;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use crate::catalog::{ArchiveEntry, EntryCatalog};
use crate::crypto::Password;
use crate::engine::{
    CryptoPasswordCallback, ItemStream, OperationResult, OutStream, PropId, PropValue,
    UpdateCallback, UpdateItemInfo, VolumeCallback,
};
use crate::progress::{NoProgress, ProgressReporter};
use crate::volume::VolumeSpec;
use crate::{Error, Result};

pub use failure::{FailedItem, FailureLog};

/// Where the callback is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackPhase {
    /// No engine query yet.
    Idle,
    /// Last query was for item metadata.
    MetadataQueried,
    /// Last query was for item data.
    StreamRequested,
    /// Last query was for a volume stream.
    VolumeRequested,
    /// The write call has returned.
    Completed,
}

/// Update callback over a borrowed catalog.
pub struct FileUpdateCallback<'a> {
    catalog: &'a EntryCatalog,
    password: Option<Password>,
    volumes: Option<VolumeSpec>,
    failures: FailureLog,
    progress: Box<dyn ProgressReporter + 'a>,
    phase: CallbackPhase,
    line_open: bool,
    created_volumes: Vec<PathBuf>,
}

impl<'a> FileUpdateCallback<'a> {
    /// Creates a callback without password or volume policy.
    pub fn new(catalog: &'a EntryCatalog) -> Self {
        Self {
            catalog,
            password: None,
            volumes: None,
            failures: FailureLog::new(),
            progress: Box::new(NoProgress),
            phase: CallbackPhase::Idle,
            line_open: false,
            created_volumes: Vec::new(),
        }
    }

    /// Sets the password answered to the engine.
    pub fn password(mut self, password: Option<Password>) -> Self {
        self.password = password;
        self
    }

    /// Sets the volume policy.
    pub fn volumes(mut self, volumes: Option<VolumeSpec>) -> Self {
        self.volumes = volumes;
        self
    }

    /// Sets the progress reporter.
    pub fn progress(mut self, progress: impl ProgressReporter + 'a) -> Self {
        self.progress = Box::new(progress);
        self
    }

    /// Closes the status line if item output left one open.
    pub fn finalize(&mut self) {
        if self.line_open {
            self.progress.finish_line();
            self.line_open = false;
        }
    }

    /// Ends the callback phase.
    pub fn complete(&mut self) {
        self.finalize();
        self.phase = CallbackPhase::Completed;
    }

    /// Returns the current phase.
    pub fn phase(&self) -> CallbackPhase {
        self.phase
    }

    /// Returns the soft failures recorded so far.
    pub fn failures(&self) -> &FailureLog {
        &self.failures
    }

    /// Returns the volume files created through [`VolumeCallback::volume_stream`].
    pub fn created_volumes(&self) -> &[PathBuf] {
        &self.created_volumes
    }

    /// Consumes the callback, returning failures and created volume paths.
    pub fn into_parts(self) -> (FailureLog, Vec<PathBuf>) {
        (self.failures, self.created_volumes)
    }

    fn enter(&mut self, phase: CallbackPhase) -> Result<()> {
        if self.phase == CallbackPhase::Completed {
            return Err(Error::CallbackCompleted);
        }
        self.phase = phase;
        Ok(())
    }

    fn entry(&self, index: u32) -> Result<&'a ArchiveEntry> {
        let catalog: &'a EntryCatalog = self.catalog;
        catalog.get(index).ok_or(Error::InvalidIndex {
            index,
            len: catalog.len(),
        })
    }
}

impl UpdateCallback for FileUpdateCallback<'_> {
    fn set_total(&mut self, total: u64) {
        log::debug!("Total size: {}", total);
        self.progress.on_total(total);
    }

    fn set_completed(&mut self, completed: u64) {
        self.progress.on_completed(completed);
    }

    fn update_item_info(&mut self, index: u32) -> Result<UpdateItemInfo> {
        self.enter(CallbackPhase::MetadataQueried)?;
        self.entry(index)?;
        Ok(UpdateItemInfo::fresh())
    }

    fn property(&mut self, index: u32, id: PropId) -> Result<PropValue> {
        self.enter(CallbackPhase::MetadataQueried)?;
        let entry = self.entry(index)?;
        let value = match id {
            PropId::Path => PropValue::Str(entry.archive_path.as_str().to_string()),
            PropId::IsDir => PropValue::Bool(entry.is_directory),
            PropId::Size => PropValue::U64(entry.size),
            PropId::CTime => entry.created.into(),
            PropId::ATime => entry.accessed.into(),
            PropId::MTime => entry.modified.into(),
            PropId::Attrib => PropValue::U32(entry.attributes),
            PropId::PosixAttrib => entry.posix_mode.map_or(PropValue::Empty, PropValue::U32),
            PropId::IsAnti => PropValue::Bool(false),
        };
        Ok(value)
    }

    fn stream(&mut self, index: u32) -> Result<ItemStream> {
        self.finalize();
        self.enter(CallbackPhase::StreamRequested)?;
        let entry = self.entry(index)?;

        if entry.is_directory {
            return Ok(ItemStream::Directory);
        }

        self.progress
            .on_item_start(entry.archive_path.as_str(), entry.size);
        self.line_open = true;

        match File::open(&entry.source_path) {
            Ok(file) => Ok(ItemStream::Data(Box::new(BufReader::new(file)))),
            Err(e) => {
                log::warn!("Cannot open file {}: {}", entry.source_path.display(), e);
                self.failures.record(index, &entry.source_path, &e);
                Ok(ItemStream::Skipped)
            }
        }
    }

    fn set_operation_result(&mut self, result: OperationResult) {
        if let OperationResult::Error(message) = &result {
            log::warn!("Item failed in engine: {}", message);
        }
        self.progress.on_item_done(result.is_ok());
        self.line_open = true;
    }
}

impl CryptoPasswordCallback for FileUpdateCallback<'_> {
    fn crypto_password(&mut self) -> Option<Password> {
        self.password.clone()
    }
}

impl VolumeCallback for FileUpdateCallback<'_> {
    fn volume_size(&mut self, index: u32) -> Option<u64> {
        self.volumes.as_ref().map(|spec| spec.size_for(index))
    }

    fn volume_stream(&mut self, index: u32) -> Result<Box<dyn OutStream>> {
        self.finalize();
        self.enter(CallbackPhase::VolumeRequested)?;
        let spec = self
            .volumes
            .as_ref()
            .ok_or(Error::NotApplicable("volume splitting"))?;

        let stream = spec.create_volume(index)?;
        let path = spec.path_for_index(index);
        log::debug!("Creating volume: {}", path.display());
        self.progress.on_volume(index, &path);
        self.created_volumes.push(path);
        Ok(Box::new(stream))
    }
}
