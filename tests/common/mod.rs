//! Shared test utilities for integration tests.
//!
//! [`MockLoader`] provides an engine that drives the update callback the way
//! a real archive writer does and records every answer it receives.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use sevenz_update::engine::{
    ArchiveEngine, ArchiveFormat, ArchiveUpdateCallback, EngineLoader, InterfaceId, ItemStream,
    OperationResult, OutArchive, OutStream, PropId, PropValue, VolumeCallback,
};
use sevenz_update::{Error, Password, Result, VolumeSpanWriter};

/// Leading bytes the mock writes as a placeholder and later rewrites.
pub const PLACEHOLDER: &[u8; 4] = b"....";

/// Final value of the leading bytes.
pub const SIGNATURE: &[u8; 4] = b"MOCK";

/// One item as the mock engine received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedItem {
    pub index: u32,
    pub path: String,
    pub is_dir: bool,
    pub size: u64,
    pub mtime: PropValue,
    pub data: Option<Vec<u8>>,
    pub skipped: bool,
}

/// Everything the mock engine observed during one build.
#[derive(Debug, Default)]
pub struct Recorded {
    pub loads: u32,
    pub properties: Vec<(String, PropValue)>,
    pub password: Option<Password>,
    pub total: u64,
    pub items: Vec<RecordedItem>,
    pub results: Vec<OperationResult>,
    pub volume_sizes: Vec<u64>,
}

impl Recorded {
    /// Returns the archive paths of the stored (not skipped) items.
    pub fn stored_paths(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|i| !i.skipped)
            .map(|i| i.path.as_str())
            .collect()
    }

    /// Returns the value of a property set on the archive object.
    pub fn property(&self, name: &str) -> Option<&PropValue> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// Failure injection for the mock engine.
#[derive(Debug, Clone, Default)]
pub struct MockBehavior {
    pub fail_load: bool,
    pub unsupported_format: bool,
    pub reject_property: Option<&'static str>,
    pub fail_at_item: Option<u32>,
}

/// Loads a [`MockEngine`] sharing one [`Recorded`] log.
#[derive(Clone, Default)]
pub struct MockLoader {
    pub behavior: MockBehavior,
    pub recorded: Rc<RefCell<Recorded>>,
}

impl MockLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            recorded: Rc::default(),
        }
    }
}

impl EngineLoader for MockLoader {
    fn load(&self) -> Result<Box<dyn ArchiveEngine>> {
        if self.behavior.fail_load {
            return Err(Error::EngineLoad("mock engine unavailable".into()));
        }
        self.recorded.borrow_mut().loads += 1;
        Ok(Box::new(MockEngine {
            behavior: self.behavior.clone(),
            recorded: Rc::clone(&self.recorded),
        }))
    }
}

pub struct MockEngine {
    behavior: MockBehavior,
    recorded: Rc<RefCell<Recorded>>,
}

impl ArchiveEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    fn create_object(
        &self,
        format: ArchiveFormat,
        interface: InterfaceId,
    ) -> Result<Box<dyn OutArchive>> {
        if self.behavior.unsupported_format {
            return Err(Error::UnsupportedFormat {
                format: format.name(),
            });
        }
        assert_eq!(interface, InterfaceId::OutArchive);
        Ok(Box::new(MockArchive {
            behavior: self.behavior.clone(),
            recorded: Rc::clone(&self.recorded),
        }))
    }
}

pub struct MockArchive {
    behavior: MockBehavior,
    recorded: Rc<RefCell<Recorded>>,
}

/// Exposes only the volume half of the callback to the span writer.
struct Volumes<'a>(&'a mut dyn ArchiveUpdateCallback);

impl VolumeCallback for Volumes<'_> {
    fn volume_size(&mut self, index: u32) -> Option<u64> {
        self.0.volume_size(index)
    }

    fn volume_stream(&mut self, index: u32) -> Result<Box<dyn OutStream>> {
        self.0.volume_stream(index)
    }
}

impl OutArchive for MockArchive {
    fn set_properties(&mut self, properties: &[(&str, PropValue)]) -> Result<()> {
        for (name, value) in properties {
            if self.behavior.reject_property == Some(*name) {
                return Err(Error::property(*name, "rejected by mock"));
            }
            self.recorded
                .borrow_mut()
                .properties
                .push((name.to_string(), value.clone()));
        }
        Ok(())
    }

    fn update_items(
        &mut self,
        output: Box<dyn OutStream>,
        count: u32,
        callback: &mut dyn ArchiveUpdateCallback,
    ) -> Result<()> {
        let mut recorded = self.recorded.borrow_mut();
        recorded.password = callback.crypto_password();

        let mut total = 0;
        for index in 0..count {
            if let PropValue::U64(size) = callback.property(index, PropId::Size)? {
                total += size;
            }
        }
        recorded.total = total;
        callback.set_total(total);

        let mut payload = PLACEHOLDER.to_vec();
        let mut completed = 0;
        for index in 0..count {
            if self.behavior.fail_at_item == Some(index) {
                return Err(Error::Engine(format!("mock failure at item {}", index)));
            }
            let info = callback.update_item_info(index)?;
            assert!(info.new_data && info.new_properties);
            assert_eq!(info.index_in_archive, None);

            let path = match callback.property(index, PropId::Path)? {
                PropValue::Str(path) => path,
                other => panic!("item {} path is {:?}", index, other),
            };
            let is_dir = callback.property(index, PropId::IsDir)? == PropValue::Bool(true);
            let size = match callback.property(index, PropId::Size)? {
                PropValue::U64(size) => size,
                _ => 0,
            };
            let mtime = callback.property(index, PropId::MTime)?;
            assert_eq!(
                callback.property(index, PropId::IsAnti)?,
                PropValue::Bool(false)
            );

            let mut item = RecordedItem {
                index,
                path,
                is_dir,
                size,
                mtime,
                data: None,
                skipped: false,
            };
            match callback.stream(index)? {
                ItemStream::Data(mut reader) => {
                    let mut data = Vec::new();
                    reader.read_to_end(&mut data)?;
                    payload.extend_from_slice(&data);
                    item.data = Some(data);
                }
                ItemStream::Directory => {}
                ItemStream::Skipped => item.skipped = true,
            }

            let result = if item.skipped {
                OperationResult::Skipped
            } else {
                completed += size;
                callback.set_completed(completed);
                OperationResult::Ok
            };
            recorded.results.push(result.clone());
            callback.set_operation_result(result);
            payload.extend_from_slice(item.path.as_bytes());
            payload.push(b'\n');
            recorded.items.push(item);
        }

        if callback.volume_size(0).is_some() {
            let mut span = VolumeSpanWriter::new(output, Volumes(callback))?;
            write_payload(&mut span, &payload)?;
            recorded.volume_sizes = span.finish()?;
        } else {
            let mut output = output;
            write_payload(&mut output, &payload)?;
            recorded.volume_sizes = vec![payload.len() as u64];
        }
        Ok(())
    }
}

/// Writes the payload, then rewrites its leading bytes like a container
/// start header.
fn write_payload<W: Write + Seek + ?Sized>(sink: &mut W, payload: &[u8]) -> std::io::Result<()> {
    sink.write_all(payload)?;
    sink.seek(SeekFrom::Start(0))?;
    sink.write_all(SIGNATURE)?;
    sink.seek(SeekFrom::End(0))?;
    sink.flush()
}

/// Creates `relative` under `root` with `data`, making parent directories.
pub fn write_file(root: &Path, relative: &str, data: &[u8]) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, data).unwrap();
    path
}

/// Concatenates files in order.
pub fn concat_files(paths: &[PathBuf]) -> Vec<u8> {
    let mut out = Vec::new();
    for path in paths {
        out.extend(std::fs::read(path).unwrap());
    }
    out
}
