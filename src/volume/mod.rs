//! Multi-volume output support.
//!
//! A split archive is one byte stream spread over several files. This crate
//! owns the naming and size policy of those files ([`VolumeSpec`]); the
//! engine decides where volume boundaries fall in its output by asking the
//! update callback for per-index volume sizes and streams.
//!
//! # Volume Naming Convention
//!
//! Volumes are named `<base>.<NNN>[.<ext>]`, numbered from 1:
//! - `backup.001.7z` - First volume
//! - `backup.002.7z` - Second volume
//! - `backup.003.7z` - Third volume
//!
//! The number is zero-padded to three digits by default.
//!
//! Every volume holds at least [`MIN_VOLUME_SIZE`] bytes so the archive's
//! start header can be rewritten inside volume 1.
//!
//! # Writing Through the Callback
//!
//! ```rust,ignore
//! use sevenz_update::volume::VolumeSpanWriter;
//!
//! // `callback` answers volume_size/volume_stream, first volume opened by the driver
//! let mut sink = VolumeSpanWriter::new(first_volume, &mut callback)?;
//! sink.write_all(&archive_bytes)?;
//! let sizes = sink.finish()?;
//! println!("Created {} volumes", sizes.len());
//! ```

mod config;
mod writer;

pub use config::{DEFAULT_VOLUME_DIGITS, MIN_VOLUME_DIGITS, MIN_VOLUME_SIZE, VolumeSpec};
pub(crate) use config::{create_new, is_valid_size_list};
pub(crate) use writer::unwrap_carried_error;
pub use writer::VolumeSpanWriter;
