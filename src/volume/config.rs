//! Volume naming and size policy.

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use crate::progress::BYTES_MIB;
use crate::{Error, Result};

/// Default zero-padding width of volume numbers.
pub const DEFAULT_VOLUME_DIGITS: usize = 3;

/// Smallest accepted padding width.
pub const MIN_VOLUME_DIGITS: usize = 2;

/// Smallest accepted volume size: the 7z start header must fit in volume 1,
/// since the writer rewrites it in place once the archive is complete.
pub const MIN_VOLUME_SIZE: u64 = 32;

/// Extension used when the output path has none.
const FALLBACK_EXTENSION: &str = "7z";

/// Volume-splitting parameters for one build.
///
/// Volume `index` (0-based, as the engine counts) is written to
/// `<base>.<NNN>[.<ext>]` where `NNN` is `index + 1` zero-padded to
/// [`digits`](Self::digits) places. The size list gives the byte limit for
/// each index; the last size repeats for every further volume.
///
/// # Example
///
/// ```rust
/// use sevenz_update::VolumeSpec;
/// use std::path::PathBuf;
///
/// let spec = VolumeSpec::from_output_path("backup/data.7z", 1024).unwrap();
/// assert_eq!(spec.volume_path(1), PathBuf::from("backup/data.001.7z"));
/// assert_eq!(spec.path_for_index(1), PathBuf::from("backup/data.002.7z"));
/// assert_eq!(spec.size_for(40), 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeSpec {
    base: PathBuf,
    extension: Option<OsString>,
    sizes: Vec<u64>,
    digits: usize,
}

impl VolumeSpec {
    /// Creates a spec with one fixed volume size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVolumeSize`] if `volume_size` is below
    /// [`MIN_VOLUME_SIZE`].
    pub fn new(
        base: impl Into<PathBuf>,
        extension: Option<&str>,
        volume_size: u64,
    ) -> Result<Self> {
        Self::with_sizes(base, extension, vec![volume_size])
    }

    /// Creates a spec with per-index volume sizes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVolumeSize`] if the list is empty or any size
    /// is below [`MIN_VOLUME_SIZE`].
    pub fn with_sizes(
        base: impl Into<PathBuf>,
        extension: Option<&str>,
        sizes: Vec<u64>,
    ) -> Result<Self> {
        if !is_valid_size_list(&sizes) {
            return Err(Error::InvalidVolumeSize);
        }
        Ok(Self {
            base: base.into(),
            extension: extension.filter(|e| !e.is_empty()).map(OsString::from),
            sizes,
            digits: DEFAULT_VOLUME_DIGITS,
        })
    }

    /// Derives the base name and extension from an archive output path.
    ///
    /// The file name is split at its last dot: `dir/data.7z` becomes base
    /// `dir/data` with extension `7z`. A file name without an extension keeps
    /// the whole name as base and uses `7z` as extension.
    pub fn from_output_path(output: impl AsRef<Path>, volume_size: u64) -> Result<Self> {
        Self::from_output_path_with_sizes(output, vec![volume_size])
    }

    /// Like [`from_output_path`](Self::from_output_path) with a size list.
    pub fn from_output_path_with_sizes(output: impl AsRef<Path>, sizes: Vec<u64>) -> Result<Self> {
        let output = output.as_ref();
        let mut spec = Self::with_sizes(output, None, sizes)?;
        match (output.file_stem(), output.extension()) {
            (Some(stem), Some(ext)) => {
                spec.base = output.with_file_name(stem);
                if !ext.is_empty() {
                    spec.extension = Some(ext.to_os_string());
                }
            }
            _ => spec.extension = Some(OsString::from(FALLBACK_EXTENSION)),
        }
        Ok(spec)
    }

    /// Creates a spec with one fixed size given in MiB.
    pub fn from_output_path_mib(output: impl AsRef<Path>, volume_size_mib: u64) -> Result<Self> {
        let bytes = volume_size_mib
            .checked_mul(BYTES_MIB)
            .ok_or(Error::InvalidVolumeSize)?;
        Self::from_output_path(output, bytes)
    }

    /// Sets the zero-padding width, clamped to at least two digits.
    pub fn digits(mut self, digits: usize) -> Self {
        self.digits = digits.max(MIN_VOLUME_DIGITS);
        self
    }

    /// Returns the base path (everything before the volume number).
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Returns the extension appended after the volume number, if any.
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref().and_then(|e| e.to_str())
    }

    /// Returns the configured size list.
    pub fn sizes(&self) -> &[u64] {
        &self.sizes
    }

    /// Returns the padding width.
    pub fn digit_count(&self) -> usize {
        self.digits
    }

    /// Returns the byte limit of volume `index` (0-based).
    pub fn size_for(&self, index: u32) -> u64 {
        let last = self.sizes.len() - 1;
        self.sizes[(index as usize).min(last)]
    }

    /// Returns the path of volume `number` (1-based).
    pub fn volume_path(&self, number: u32) -> PathBuf {
        let mut name = self.base.clone().into_os_string();
        name.push(format!(".{:0width$}", number, width = self.digits));
        if let Some(ext) = &self.extension {
            name.push(".");
            name.push(ext);
        }
        PathBuf::from(name)
    }

    /// Returns the path of volume `index` (0-based, as the engine counts).
    pub fn path_for_index(&self, index: u32) -> PathBuf {
        self.volume_path(index.saturating_add(1))
    }

    /// Creates the file for volume `index` (0-based).
    ///
    /// The file must not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CreateOutput`] if the file exists or cannot be
    /// created.
    pub fn create_volume(&self, index: u32) -> Result<BufWriter<File>> {
        let path = self.path_for_index(index);
        create_new(&path)
            .map(BufWriter::new)
            .map_err(|e| Error::create_output(path, e))
    }
}

/// Returns true if `sizes` is non-empty and no size is below
/// [`MIN_VOLUME_SIZE`].
pub(crate) fn is_valid_size_list(sizes: &[u64]) -> bool {
    !sizes.is_empty() && sizes.iter().all(|&size| size >= MIN_VOLUME_SIZE)
}

/// Opens a new file for writing, failing if it already exists.
pub(crate) fn create_new(path: &Path) -> io::Result<File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}
