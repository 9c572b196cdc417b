//! File timestamps in Windows FILETIME precision.
//!
//! The 7z container records creation, access and modification times as
//! FILETIME values: 100-nanosecond intervals since January 1, 1601 (UTC).
//! The collector captures file-system times once, as [`Timestamp`]s, and the
//! update callback hands them to the engine unchanged.
//!
//! ```rust
//! use sevenz_update::Timestamp;
//!
//! let ts = Timestamp::from_unix_secs(0).unwrap();
//! assert_eq!(ts.as_filetime(), 116444736000000000);
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

/// Unix epoch expressed as FILETIME.
const FILETIME_UNIX_DIFF: u64 = 116444736000000000;

/// Number of 100-nanosecond intervals per second.
const INTERVALS_PER_SECOND: u64 = 10_000_000;

/// A file timestamp stored as a raw FILETIME value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    filetime: u64,
}

impl Timestamp {
    /// Creates a timestamp from a raw FILETIME value.
    #[inline]
    pub const fn from_filetime(filetime: u64) -> Self {
        Self { filetime }
    }

    /// Creates a timestamp from Unix seconds.
    ///
    /// Returns `None` if the value falls outside the FILETIME range.
    pub fn from_unix_secs(secs: i64) -> Option<Self> {
        Self::from_unix_secs_nanos(secs, 0)
    }

    /// Creates a timestamp from Unix seconds and nanoseconds.
    ///
    /// Nanoseconds are truncated to 100ns precision.
    pub fn from_unix_secs_nanos(secs: i64, nanos: u32) -> Option<Self> {
        let nano_intervals = u64::from(nanos) / 100;
        let base = if secs < 0 {
            let neg = secs.unsigned_abs().checked_mul(INTERVALS_PER_SECOND)?;
            FILETIME_UNIX_DIFF.checked_sub(neg)?
        } else {
            let pos = (secs as u64).checked_mul(INTERVALS_PER_SECOND)?;
            FILETIME_UNIX_DIFF.checked_add(pos)?
        };
        base.checked_add(nano_intervals).map(Self::from_filetime)
    }

    /// Creates a timestamp from a `SystemTime`.
    pub fn from_system_time(time: SystemTime) -> Option<Self> {
        match time.duration_since(UNIX_EPOCH) {
            Ok(d) => Self::from_unix_secs_nanos(d.as_secs() as i64, d.subsec_nanos()),
            Err(e) => {
                let d = e.duration();
                // Round toward the earlier instant for pre-epoch times.
                let secs = -(d.as_secs() as i64);
                let nanos = d.subsec_nanos();
                if nanos == 0 {
                    Self::from_unix_secs(secs)
                } else {
                    Self::from_unix_secs_nanos(secs - 1, 1_000_000_000 - nanos)
                }
            }
        }
    }

    /// Returns the raw FILETIME value.
    #[inline]
    pub const fn as_filetime(&self) -> u64 {
        self.filetime
    }

    /// Returns whole Unix seconds, rounded toward negative infinity.
    pub fn as_unix_secs(&self) -> i64 {
        let diff = self.filetime as i128 - FILETIME_UNIX_DIFF as i128;
        diff.div_euclid(INTERVALS_PER_SECOND as i128) as i64
    }
}

impl From<Timestamp> for u64 {
    fn from(ts: Timestamp) -> Self {
        ts.filetime
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_unix_epoch() {
        let ts = Timestamp::from_system_time(UNIX_EPOCH).unwrap();
        assert_eq!(ts.as_filetime(), FILETIME_UNIX_DIFF);
        assert_eq!(ts.as_unix_secs(), 0);
    }

    #[test]
    fn test_sub_second_precision_truncated() {
        let time = UNIX_EPOCH + Duration::new(10, 123_456_789);
        let ts = Timestamp::from_system_time(time).unwrap();
        assert_eq!(
            ts.as_filetime(),
            FILETIME_UNIX_DIFF + 10 * INTERVALS_PER_SECOND + 1_234_567
        );
    }

    #[test]
    fn test_before_epoch() {
        let time = UNIX_EPOCH - Duration::from_millis(1500);
        let ts = Timestamp::from_system_time(time).unwrap();
        assert_eq!(ts.as_filetime(), FILETIME_UNIX_DIFF - 15_000_000);
        assert_eq!(ts.as_unix_secs(), -2);
    }

    #[test]
    fn test_before_filetime_epoch_is_none() {
        assert!(Timestamp::from_unix_secs(-20_000_000_000).is_none());
    }

    #[test]
    fn test_into_u64() {
        let raw: u64 = Timestamp::from_filetime(42).into();
        assert_eq!(raw, 42);
    }
}
