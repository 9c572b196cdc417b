//! Self-extracting archive (SFX) assembly.
//!
//! An SFX file is a stub executable with a finished 7z archive appended
//! byte for byte. The stub locates the archive inside itself when run.
//!
//! ```text
//! +------------------+
//! |   Stub (.sfx)    |  <- stub_size bytes
//! +------------------+
//! |   7z Archive     |  <- archive_size bytes
//! +------------------+
//! ```
//!
//! Nothing is transformed on the way: the output is exactly the stub bytes
//! followed by the archive bytes.
//!
//! # Example
//!
//! ```rust,ignore
//! use sevenz_update::sfx::{assemble_sfx, default_stub_path};
//!
//! let stub = default_stub_path()?;
//! let result = assemble_sfx(&stub, "payload.7z", "installer.exe")?;
//! println!(
//!     "Created SFX: {} bytes (stub: {}, archive: {})",
//!     result.total_size, result.stub_size, result.archive_size
//! );
//! ```

mod stub;

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

pub use stub::{SfxFormat, SfxStub};

use crate::volume::create_new;
use crate::{Error, Result};

/// File name of the stub looked up next to the running executable.
pub const DEFAULT_STUB_NAME: &str = "7z.sfx";

/// Outcome of assembling an SFX file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SfxResult {
    /// Bytes copied from the stub.
    pub stub_size: u64,
    /// Bytes copied from the archive.
    pub archive_size: u64,
    /// Size of the output file.
    pub total_size: u64,
    /// Detected stub format.
    pub format: Option<SfxFormat>,
}

/// Writes `stub` followed by `archive` into a new file at `output`.
///
/// Both inputs are opened before the output is created, so a missing input
/// leaves nothing behind. On Unix the output gets execute permission.
///
/// # Errors
///
/// * [`Error::SfxInput`] if the stub or the archive cannot be opened.
/// * [`Error::CreateOutput`] if the output exists or cannot be created.
/// * [`Error::Io`] if copying fails; the partial output is removed.
pub fn assemble_sfx(
    stub: impl AsRef<Path>,
    archive: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<SfxResult> {
    let stub = SfxStub::open(stub.as_ref())?;
    let archive = archive.as_ref();
    let output = output.as_ref();

    let mut stub_file = open_input(&stub.path)?;
    let mut archive_file = open_input(archive)?;
    let out_file = create_new(output).map_err(|e| Error::create_output(output, e))?;

    match concatenate(&mut stub_file, &mut archive_file, out_file) {
        Ok((stub_size, archive_size)) => {
            set_executable(output)?;
            match stub.format {
                Some(format) => log::debug!("SFX stub format: {}", format.name()),
                None => log::debug!("SFX stub format not recognized"),
            }
            Ok(SfxResult {
                stub_size,
                archive_size,
                total_size: stub_size + archive_size,
                format: stub.format,
            })
        }
        Err(e) => {
            if let Err(remove) = fs::remove_file(output) {
                log::debug!("Cannot remove {}: {}", output.display(), remove);
            }
            Err(Error::Io(e))
        }
    }
}

/// Returns the path of `7z.sfx` in the directory of the running executable.
///
/// # Errors
///
/// Returns [`Error::SfxStubMissing`] if no stub exists there.
pub fn default_stub_path() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe.parent().unwrap_or_else(|| Path::new("."));
    locate_stub(dir)
}

/// Returns the path of `7z.sfx` inside `dir` if it is a file.
///
/// # Errors
///
/// Returns [`Error::SfxStubMissing`] if no stub exists there.
pub fn locate_stub(dir: impl AsRef<Path>) -> Result<PathBuf> {
    let path = dir.as_ref().join(DEFAULT_STUB_NAME);
    if path.is_file() {
        Ok(path)
    } else {
        Err(Error::SfxStubMissing { path })
    }
}

fn open_input(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| Error::SfxInput {
        path: path.to_path_buf(),
        source,
    })
}

fn concatenate(stub: &mut File, archive: &mut File, output: File) -> io::Result<(u64, u64)> {
    let mut writer = BufWriter::new(output);
    let stub_size = io::copy(stub, &mut writer)?;
    let archive_size = io::copy(archive, &mut writer)?;
    writer.flush()?;
    writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
    Ok((stub_size, archive_size))
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(permissions.mode() | 0o111);
    fs::set_permissions(path, permissions)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}
