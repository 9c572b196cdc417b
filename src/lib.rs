//! # sevenz-update
//!
//! Builds 7z archives by driving a streaming archive-writer engine through a
//! pull-based update callback.
//!
//! The crate never compresses data or lays out the 7z container itself. It
//! collects the items to archive, answers the engine's queries for item
//! metadata, item data, passwords and volume streams, owns volume naming and
//! the volume size policy, and appends finished archives to SFX stubs.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sevenz_update::{ArchiveDriver, BuildOptions, Result, ZesvenLoader};
//!
//! fn main() -> Result<()> {
//!     let report = ArchiveDriver::new(&ZesvenLoader)
//!         .options(BuildOptions::new().level(9)?)
//!         .build(&["notes.txt", "photos"], "backup.7z")?;
//!     println!("Archived {} entries ({} bytes)", report.entries, report.total_size);
//!     Ok(())
//! }
//! ```
//!
//! ## Volumes
//!
//! With a volume size the archive is split into `backup.001.7z`,
//! `backup.002.7z`, ... Each volume is filled to the size configured for its
//! index; the last configured size repeats.
//!
//! ```rust,ignore
//! use sevenz_update::{ZesvenLoader, compress_with_volumes};
//!
//! let report = compress_with_volumes(&ZesvenLoader, &["photos"], "backup.7z", 100)?;
//! for volume in &report.volumes {
//!     println!("{}", volume.display());
//! }
//! ```
//!
//! ## Self-Extracting Archives
//!
//! ```rust,ignore
//! use sevenz_update::{ZesvenLoader, create_sfx, sfx::default_stub_path};
//!
//! let stub = default_stub_path()?;
//! create_sfx(&ZesvenLoader, &["app"], "setup.exe", stub)?;
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns [`Result<T>`]. Unreadable source files do not
//! abort a build: the engine still writes the archive and the build reports
//! [`Error::PartialFailure`] listing what was left out.
//!
//! ```rust,ignore
//! use sevenz_update::{Error, ZesvenLoader, compress};
//!
//! match compress(&ZesvenLoader, &["data"], "data.7z") {
//!     Ok(report) => println!("{} entries", report.entries),
//!     Err(Error::PartialFailure { failures }) => {
//!         for item in &failures {
//!             eprintln!("skipped {}", item);
//!         }
//!     }
//!     Err(e) => eprintln!("build failed: {}", e),
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `zesven` | Pure-Rust engine backend ([`ZesvenEngine`]) |
//! | `cli` | Command-line tool |
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod archive_path;
pub mod callback;
pub mod catalog;
pub mod crypto;
pub mod driver;
pub mod engine;
pub mod error;
pub mod progress;
pub mod sfx;
pub mod timestamp;
pub mod volume;

pub use archive_path::ArchivePath;
pub use error::{Error, Result};
pub use timestamp::Timestamp;

pub use crypto::Password;

pub use callback::{FailedItem, FailureLog, FileUpdateCallback};
pub use catalog::{ArchiveEntry, CollectOptions, EntryCatalog, collect, collect_with};
pub use driver::{
    ArchiveDriver, BuildOptions, BuildReport, SfxReport, compress, compress_encrypted,
    compress_with_volumes, create_sfx,
};
pub use engine::{ArchiveEngine, ArchiveUpdateCallback, EngineLoader, OutArchive};
pub use progress::{NoProgress, ProgressReporter, progress_fn};
pub use sfx::{SfxFormat, SfxResult, assemble_sfx};
pub use volume::{VolumeSpanWriter, VolumeSpec};

#[cfg(feature = "zesven")]
#[cfg_attr(docsrs, doc(cfg(feature = "zesven")))]
pub use engine::{ZesvenEngine, ZesvenLoader};
