//! Item property identifiers and values.

use crate::Timestamp;

/// Per-item properties the engine may query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PropId {
    /// Archive-relative path.
    Path,
    /// Directory flag.
    IsDir,
    /// Uncompressed size.
    Size,
    /// Creation time.
    CTime,
    /// Last access time.
    ATime,
    /// Last modification time.
    MTime,
    /// Windows attribute bits.
    Attrib,
    /// Unix permission bits.
    PosixAttrib,
    /// Anti-item (deletion marker) flag.
    IsAnti,
}

/// A property value exchanged with the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropValue {
    /// No value available.
    Empty,
    /// Boolean flag.
    Bool(bool),
    /// 32-bit unsigned integer.
    U32(u32),
    /// 64-bit unsigned integer.
    U64(u64),
    /// Text.
    Str(String),
    /// FILETIME timestamp.
    FileTime(Timestamp),
}

impl PropValue {
    /// Returns `true` for [`PropValue::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, PropValue::Empty)
    }

    /// Interprets the value as a boolean switch.
    ///
    /// Accepts `Bool`, integers (non-zero is on), and the strings
    /// `on`/`off`, `true`/`false`, `+`/`-`. `Empty` means on, matching a bare
    /// switch.
    pub fn as_switch(&self) -> Option<bool> {
        match self {
            PropValue::Empty => Some(true),
            PropValue::Bool(b) => Some(*b),
            PropValue::U32(n) => Some(*n != 0),
            PropValue::U64(n) => Some(*n != 0),
            PropValue::Str(s) => match s.to_ascii_lowercase().as_str() {
                "on" | "true" | "+" | "" => Some(true),
                "off" | "false" | "-" => Some(false),
                _ => None,
            },
            PropValue::FileTime(_) => None,
        }
    }

    /// Interprets the value as an unsigned integer.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            PropValue::U32(n) => Some(*n),
            PropValue::U64(n) => u32::try_from(*n).ok(),
            PropValue::Str(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        PropValue::Bool(b)
    }
}

impl From<u32> for PropValue {
    fn from(n: u32) -> Self {
        PropValue::U32(n)
    }
}

impl From<u64> for PropValue {
    fn from(n: u64) -> Self {
        PropValue::U64(n)
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        PropValue::Str(s.to_string())
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        PropValue::Str(s)
    }
}

impl From<Option<Timestamp>> for PropValue {
    fn from(ts: Option<Timestamp>) -> Self {
        ts.map_or(PropValue::Empty, PropValue::FileTime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_parsing() {
        assert_eq!(PropValue::from("on").as_switch(), Some(true));
        assert_eq!(PropValue::from("OFF").as_switch(), Some(false));
        assert_eq!(PropValue::Bool(false).as_switch(), Some(false));
        assert_eq!(PropValue::U32(1).as_switch(), Some(true));
        assert_eq!(PropValue::Empty.as_switch(), Some(true));
        assert_eq!(PropValue::from("maybe").as_switch(), None);
    }

    #[test]
    fn test_u32_parsing() {
        assert_eq!(PropValue::U32(9).as_u32(), Some(9));
        assert_eq!(PropValue::from("7").as_u32(), Some(7));
        assert_eq!(PropValue::U64(u64::MAX).as_u32(), None);
        assert_eq!(PropValue::Bool(true).as_u32(), None);
    }

    #[test]
    fn test_timestamp_option() {
        assert!(PropValue::from(None).is_empty());
        let ts = Timestamp::from_filetime(5);
        assert_eq!(PropValue::from(Some(ts)), PropValue::FileTime(ts));
    }
}
