//! Archive build orchestration.
//!
//! [`ArchiveDriver`] runs one build end to end: it loads the engine,
//! collects the inputs, opens the output, configures the writer object and
//! hands everything to the engine in a single blocking call.
//!
//! # Example
//!
//! ```rust,ignore
//! use sevenz_update::{ArchiveDriver, BuildOptions, ZesvenLoader};
//!
//! let options = BuildOptions::new().level(5)?.volume_size(4 * 1024 * 1024)?;
//! let report = ArchiveDriver::new(&ZesvenLoader)
//!     .options(options)
//!     .build(&["docs", "README.md"], "out/docs.7z")?;
//! println!("{} entries in {} volume(s)", report.entries, report.volumes.len());
//! ```

use std::ffi::OsString;
use std::fs;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use crate::callback::{FailedItem, FileUpdateCallback};
use crate::catalog::{CollectOptions, collect_with};
use crate::crypto::Password;
use crate::engine::{ArchiveFormat, EngineLoader, InterfaceId, OutArchive, PropValue};
use crate::progress::{BYTES_MIB, NoProgress, ProgressReporter};
use crate::sfx::{SfxResult, assemble_sfx};
use crate::volume::{
    DEFAULT_VOLUME_DIGITS, VolumeSpec, create_new, is_valid_size_list, unwrap_carried_error,
};
use crate::{Error, Result};

/// Default compression level.
pub const DEFAULT_LEVEL: u32 = 9;

/// Compression level of the archive embedded in an SFX file.
pub const SFX_LEVEL: u32 = 7;

/// Suffix of the intermediate archive written while building an SFX file.
const SFX_TEMP_SUFFIX: &str = ".temp.7z";

/// Options for one archive build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Compression level (0-9).
    pub level: u32,
    /// Password for data encryption.
    pub password: Option<Password>,
    /// Encrypt file names when a password is set.
    pub encrypt_headers: bool,
    /// Store creation times.
    pub store_ctime: bool,
    /// Store access times.
    pub store_atime: bool,
    /// Store modification times.
    pub store_mtime: bool,
    /// Volume sizes in bytes; empty for a single output file.
    pub volume_sizes: Vec<u64>,
    /// Zero-padding width of volume numbers.
    pub volume_digits: usize,
    /// Remove existing output files instead of failing.
    pub overwrite: bool,
    /// Input collection options.
    pub collect: CollectOptions,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
            password: None,
            encrypt_headers: true,
            store_ctime: true,
            store_atime: false,
            store_mtime: true,
            volume_sizes: Vec::new(),
            volume_digits: DEFAULT_VOLUME_DIGITS,
            overwrite: false,
            collect: CollectOptions::default(),
        }
    }
}

impl BuildOptions {
    /// Creates default options: level 9, no password, single output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the compression level.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCompressionLevel`] if `level` exceeds 9.
    pub fn level(mut self, level: u32) -> Result<Self> {
        if level > 9 {
            return Err(Error::InvalidCompressionLevel { level });
        }
        self.level = level;
        Ok(self)
    }

    /// Sets the encryption password.
    pub fn password(mut self, password: impl Into<Password>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Controls file-name encryption for password-protected builds.
    pub fn encrypt_headers(mut self, encrypt: bool) -> Self {
        self.encrypt_headers = encrypt;
        self
    }

    /// Stores or drops creation and modification times.
    pub fn preserve_times(mut self, preserve: bool) -> Self {
        self.store_ctime = preserve;
        self.store_mtime = preserve;
        self
    }

    /// Stores or drops access times.
    pub fn preserve_atime(mut self, preserve: bool) -> Self {
        self.store_atime = preserve;
        self
    }

    /// Splits the output into volumes of `bytes` each.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVolumeSize`] if `bytes` is below
    /// [`MIN_VOLUME_SIZE`](crate::volume::MIN_VOLUME_SIZE).
    pub fn volume_size(self, bytes: u64) -> Result<Self> {
        self.volume_sizes(vec![bytes])
    }

    /// Splits the output into volumes of `mib` MiB each.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVolumeSize`] if `mib` is zero or too large.
    pub fn volume_size_mib(self, mib: u64) -> Result<Self> {
        let bytes = mib.checked_mul(BYTES_MIB).ok_or(Error::InvalidVolumeSize)?;
        self.volume_size(bytes)
    }

    /// Splits the output with a per-volume size list; the last size repeats.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVolumeSize`] if the list is empty or contains
    /// a size below [`MIN_VOLUME_SIZE`](crate::volume::MIN_VOLUME_SIZE).
    pub fn volume_sizes(mut self, sizes: Vec<u64>) -> Result<Self> {
        if !is_valid_size_list(&sizes) {
            return Err(Error::InvalidVolumeSize);
        }
        self.volume_sizes = sizes;
        Ok(self)
    }

    /// Sets the zero-padding width of volume numbers.
    pub fn volume_digits(mut self, digits: usize) -> Self {
        self.volume_digits = digits;
        self
    }

    /// Removes existing output files before building.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Sets the input collection options.
    pub fn collect(mut self, collect: CollectOptions) -> Self {
        self.collect = collect;
        self
    }

    /// Returns true if the output is split into volumes.
    pub fn is_multi_volume(&self) -> bool {
        !self.volume_sizes.is_empty()
    }

    /// Returns the engine properties these options translate to.
    pub fn engine_properties(&self) -> Vec<(&'static str, PropValue)> {
        let mut properties = vec![
            ("x", PropValue::U32(self.level)),
            ("tc", PropValue::Bool(self.store_ctime)),
            ("ta", PropValue::Bool(self.store_atime)),
            ("tm", PropValue::Bool(self.store_mtime)),
        ];
        if self.password.is_some() {
            properties.push(("he", PropValue::Bool(self.encrypt_headers)));
        }
        properties
    }

    fn volume_spec(&self, output: &Path) -> Result<Option<VolumeSpec>> {
        if !self.is_multi_volume() {
            return Ok(None);
        }
        let spec = VolumeSpec::from_output_path_with_sizes(output, self.volume_sizes.clone())?
            .digits(self.volume_digits);
        Ok(Some(spec))
    }
}

/// Summary of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Number of catalog entries handed to the engine.
    pub entries: usize,
    /// Sum of the entry sizes.
    pub total_size: u64,
    /// Items omitted from the archive; empty in a report returned by
    /// [`ArchiveDriver::build`].
    pub failures: Vec<FailedItem>,
    /// Files written: the archive, or every volume in order.
    pub volumes: Vec<PathBuf>,
}

/// Summary of a successful SFX build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SfxReport {
    /// The intermediate archive build.
    pub archive: BuildReport,
    /// The assembled executable.
    pub sfx: SfxResult,
    /// Where the executable was written.
    pub output: PathBuf,
}

/// Builds archives with an engine obtained from a loader.
pub struct ArchiveDriver<'l> {
    loader: &'l dyn EngineLoader,
    options: BuildOptions,
}

impl<'l> ArchiveDriver<'l> {
    /// Creates a driver with default options.
    pub fn new(loader: &'l dyn EngineLoader) -> Self {
        Self {
            loader,
            options: BuildOptions::default(),
        }
    }

    /// Replaces the build options.
    pub fn options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the build options.
    pub fn build_options(&self) -> &BuildOptions {
        &self.options
    }

    /// Archives `inputs` into `output`.
    ///
    /// See [`build_with_progress`](Self::build_with_progress).
    pub fn build<P: AsRef<Path>>(
        &self,
        inputs: &[P],
        output: impl AsRef<Path>,
    ) -> Result<BuildReport> {
        self.build_with_progress(inputs, output, NoProgress)
    }

    /// Archives `inputs` into `output`, reporting progress to `progress`.
    ///
    /// In volume mode `output` names the archive as a whole; the files
    /// actually written are `<base>.001[.<ext>]`, `<base>.002[.<ext>]` and
    /// so on.
    ///
    /// # Errors
    ///
    /// Any failure before or inside the engine call aborts the build and
    /// removes the files it created. If the engine succeeded but some
    /// sources could not be read the archive is kept and
    /// [`Error::PartialFailure`] lists them.
    pub fn build_with_progress<P: AsRef<Path>>(
        &self,
        inputs: &[P],
        output: impl AsRef<Path>,
        progress: impl ProgressReporter,
    ) -> Result<BuildReport> {
        let report = self.run(inputs, output.as_ref(), progress)?;
        if !report.failures.is_empty() {
            return Err(Error::PartialFailure {
                failures: report.failures,
            });
        }
        Ok(report)
    }

    /// Runs a build, returning soft failures inside the report.
    fn run<P: AsRef<Path>>(
        &self,
        inputs: &[P],
        output: &Path,
        progress: impl ProgressReporter,
    ) -> Result<BuildReport> {
        let options = &self.options;

        log::info!("Loading archive engine");
        let engine = self.loader.load()?;
        log::debug!("Engine loaded: {}", engine.name());

        log::info!("Collecting files");
        let catalog = collect_with(inputs, &options.collect)?;
        if catalog.is_empty() {
            return Err(Error::NoEntries);
        }
        log::info!(
            "Found {} file(s), {} directory(ies), {} bytes",
            catalog.file_count(),
            catalog.directory_count(),
            catalog.total_size()
        );

        let volumes = options.volume_spec(output)?;
        let primary_path = match &volumes {
            Some(spec) => spec.volume_path(1),
            None => output.to_path_buf(),
        };
        if options.overwrite {
            remove_stale(&primary_path, volumes.as_ref())?;
        }
        log::info!("Creating output: {}", primary_path.display());
        let primary =
            create_new(&primary_path).map_err(|e| Error::create_output(&primary_path, e))?;

        let created = engine
            .create_object(ArchiveFormat::SevenZip, InterfaceId::OutArchive)
            .and_then(|archive| configure(archive, options));
        let mut archive = match created {
            Ok(archive) => archive,
            Err(e) => {
                discard(&primary_path, &[]);
                return Err(e);
            }
        };

        let mut callback = FileUpdateCallback::new(&catalog)
            .password(options.password.clone())
            .volumes(volumes)
            .progress(progress);

        log::info!("Compressing {} item(s)", catalog.len());
        let outcome = archive.update_items(
            Box::new(BufWriter::new(primary)),
            catalog.count(),
            &mut callback,
        );
        callback.complete();
        drop(archive);
        let (failures, created) = callback.into_parts();

        if let Err(e) = outcome {
            // Volume errors may arrive wrapped in the engine's I/O error.
            let e = match e {
                Error::Io(io) => unwrap_carried_error(io).unwrap_or_else(Error::Io),
                e => e,
            };
            log::error!("Compression failed: {}", e);
            discard(&primary_path, &created);
            return Err(e);
        }
        if !failures.is_empty() {
            log::warn!("{} file(s) could not be read", failures.len());
        }

        let mut volumes = vec![primary_path];
        volumes.extend(created);
        log::info!("Archive created: {}", output.display());
        Ok(BuildReport {
            entries: catalog.len(),
            total_size: catalog.total_size(),
            failures: failures.into_items(),
            volumes,
        })
    }

    /// Builds a self-extracting executable from `inputs`.
    ///
    /// The archive is first written to `<sfx_output>.temp.7z` at level 7,
    /// then appended to `stub`. The temporary archive is removed whether or
    /// not assembly succeeds. Volume settings are ignored.
    ///
    /// # Errors
    ///
    /// Fails like [`build`](Self::build) or [`assemble_sfx`]. A partial
    /// failure still produces the executable before it is reported.
    pub fn build_sfx<P: AsRef<Path>>(
        &self,
        inputs: &[P],
        sfx_output: impl AsRef<Path>,
        stub: impl AsRef<Path>,
    ) -> Result<SfxReport> {
        let sfx_output = sfx_output.as_ref();
        let temp = TempArchiveGuard::new(temp_archive_path(sfx_output));

        let mut options = self.options.clone();
        options.level = SFX_LEVEL;
        options.volume_sizes.clear();
        options.overwrite = true;
        let driver = ArchiveDriver {
            loader: self.loader,
            options,
        };

        let mut archive = driver.run(inputs, temp.path(), NoProgress)?;
        let failures = std::mem::take(&mut archive.failures);

        if self.options.overwrite {
            remove_file_if_exists(sfx_output)?;
        }
        log::info!("Creating SFX archive: {}", sfx_output.display());
        let sfx = assemble_sfx(stub, temp.path(), sfx_output)?;
        log::info!(
            "SFX created: {} bytes (stub: {}, archive: {})",
            sfx.total_size,
            sfx.stub_size,
            sfx.archive_size
        );

        if !failures.is_empty() {
            return Err(Error::PartialFailure { failures });
        }
        Ok(SfxReport {
            archive,
            sfx,
            output: sfx_output.to_path_buf(),
        })
    }
}

/// Removes the intermediate archive of an SFX build when dropped.
pub struct TempArchiveGuard {
    path: PathBuf,
}

impl TempArchiveGuard {
    /// Guards `path`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns the guarded path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArchiveGuard {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed temporary archive: {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "Cannot remove temporary archive {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// Returns `<sfx_output>.temp.7z`.
pub fn temp_archive_path(sfx_output: &Path) -> PathBuf {
    let mut name = OsString::from(sfx_output.as_os_str());
    name.push(SFX_TEMP_SUFFIX);
    PathBuf::from(name)
}

/// Archives `inputs` into `output` at level 9.
pub fn compress<P: AsRef<Path>>(
    loader: &dyn EngineLoader,
    inputs: &[P],
    output: impl AsRef<Path>,
) -> Result<BuildReport> {
    ArchiveDriver::new(loader).build(inputs, output)
}

/// Archives `inputs` into volumes of `volume_size_mib` MiB.
///
/// # Errors
///
/// Returns [`Error::InvalidVolumeSize`] if `volume_size_mib` is zero.
pub fn compress_with_volumes<P: AsRef<Path>>(
    loader: &dyn EngineLoader,
    inputs: &[P],
    output: impl AsRef<Path>,
    volume_size_mib: u64,
) -> Result<BuildReport> {
    let options = BuildOptions::new().volume_size_mib(volume_size_mib)?;
    ArchiveDriver::new(loader).options(options).build(inputs, output)
}

/// Archives `inputs` with data and file-name encryption.
pub fn compress_encrypted<P: AsRef<Path>>(
    loader: &dyn EngineLoader,
    inputs: &[P],
    output: impl AsRef<Path>,
    password: impl Into<Password>,
) -> Result<BuildReport> {
    let options = BuildOptions::new().password(password).encrypt_headers(true);
    ArchiveDriver::new(loader).options(options).build(inputs, output)
}

/// Builds a self-extracting executable from `inputs` and `stub`.
pub fn create_sfx<P: AsRef<Path>>(
    loader: &dyn EngineLoader,
    inputs: &[P],
    sfx_output: impl AsRef<Path>,
    stub: impl AsRef<Path>,
) -> Result<SfxReport> {
    ArchiveDriver::new(loader).build_sfx(inputs, sfx_output, stub)
}

fn configure(
    mut archive: Box<dyn OutArchive>,
    options: &BuildOptions,
) -> Result<Box<dyn OutArchive>> {
    archive.set_properties(&options.engine_properties())?;
    Ok(archive)
}

fn remove_stale(primary: &Path, volumes: Option<&VolumeSpec>) -> Result<()> {
    remove_file_if_exists(primary)?;
    if let Some(spec) = volumes {
        let mut number = 2;
        loop {
            let path = spec.volume_path(number);
            if !path.is_file() {
                break;
            }
            remove_file_if_exists(&path)?;
            number += 1;
        }
    }
    Ok(())
}

fn remove_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            log::debug!("Removed existing file: {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::create_output(path, e)),
    }
}

fn discard(primary: &Path, volumes: &[PathBuf]) {
    for path in std::iter::once(primary).chain(volumes.iter().map(PathBuf::as_path)) {
        if let Err(e) = fs::remove_file(path) {
            log::debug!("Cannot remove {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_properties() {
        let props = BuildOptions::new().engine_properties();
        assert_eq!(
            props,
            vec![
                ("x", PropValue::U32(9)),
                ("tc", PropValue::Bool(true)),
                ("ta", PropValue::Bool(false)),
                ("tm", PropValue::Bool(true)),
            ]
        );
    }

    #[test]
    fn test_password_adds_header_encryption() {
        let props = BuildOptions::new().password("secret").engine_properties();
        assert_eq!(props.last(), Some(&("he", PropValue::Bool(true))));

        let props = BuildOptions::new()
            .password("secret")
            .encrypt_headers(false)
            .engine_properties();
        assert_eq!(props.last(), Some(&("he", PropValue::Bool(false))));
    }

    #[test]
    fn test_level_validation() {
        assert!(BuildOptions::new().level(0).is_ok());
        assert!(matches!(
            BuildOptions::new().level(10),
            Err(Error::InvalidCompressionLevel { level: 10 })
        ));
    }

    #[test]
    fn test_volume_size_validation() {
        assert!(matches!(
            BuildOptions::new().volume_size_mib(0),
            Err(Error::InvalidVolumeSize)
        ));
        assert!(matches!(
            BuildOptions::new().volume_sizes(vec![10, 0]),
            Err(Error::InvalidVolumeSize)
        ));
        assert!(matches!(
            BuildOptions::new().volume_size(16),
            Err(Error::InvalidVolumeSize)
        ));
        assert!(BuildOptions::new().volume_size(32).is_ok());
        let options = BuildOptions::new().volume_size_mib(2).unwrap();
        assert_eq!(options.volume_sizes, vec![2 * BYTES_MIB]);
        assert!(options.is_multi_volume());
    }

    #[test]
    fn test_volume_spec_from_options() {
        let options = BuildOptions::new().volume_size(100).unwrap().volume_digits(4);
        let spec = options.volume_spec(Path::new("out/a.7z")).unwrap().unwrap();
        assert_eq!(spec.volume_path(1), PathBuf::from("out/a.0001.7z"));
        assert!(BuildOptions::new()
            .volume_spec(Path::new("a.7z"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_temp_archive_path() {
        assert_eq!(
            temp_archive_path(Path::new("dist/setup.exe")),
            PathBuf::from("dist/setup.exe.temp.7z")
        );
    }

    #[test]
    fn test_temp_guard_removes_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("x.temp.7z");
        fs::write(&path, b"7z").unwrap();
        drop(TempArchiveGuard::new(path.clone()));
        assert!(!path.exists());
        drop(TempArchiveGuard::new(path));
    }

    #[test]
    fn test_remove_stale_volumes() {
        let dir = tempfile::TempDir::new().unwrap();
        let spec = VolumeSpec::from_output_path(dir.path().join("a.7z"), 64).unwrap();
        for n in 1..=3 {
            fs::write(spec.volume_path(n), b"old").unwrap();
        }
        remove_stale(&spec.volume_path(1), Some(&spec)).unwrap();
        for n in 1..=3 {
            assert!(!spec.volume_path(n).exists());
        }
    }
}
