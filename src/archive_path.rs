//! Archive-relative entry names.
//!
//! Entries inside a 7z archive are named by forward-slash separated relative
//! paths. [`ArchivePath`] holds such a name after validation, and knows how to
//! build one from a file-system path relative to a traversal root.

use std::fmt;
use std::path::{Component, Path};

use crate::{Error, Result};

/// Upper bound on the byte length of an archive path.
const MAX_PATH_LENGTH: usize = 32768;

/// A validated, forward-slash separated archive entry name.
///
/// The name is relative, has no empty, `.` or `..` segments and contains no
/// NUL bytes.
///
/// # Examples
///
/// ```
/// use sevenz_update::ArchivePath;
///
/// let path = ArchivePath::new("d/sub/c.txt").unwrap();
/// assert_eq!(path.file_name(), "c.txt");
/// assert!(ArchivePath::new("../escape").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchivePath(String);

impl ArchivePath {
    /// Creates an archive path from a string, validating it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArchivePath`] for empty, absolute or
    /// traversing names.
    pub fn new(s: &str) -> Result<Self> {
        Self::validate(s)?;
        Ok(Self(s.to_string()))
    }

    /// Builds an archive path from a relative file-system path.
    ///
    /// Each normal component becomes one segment; platform separators are
    /// replaced by `/`.
    pub fn from_relative(path: &Path) -> Result<Self> {
        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => {
                    let part = part.to_str().ok_or_else(|| {
                        Error::InvalidArchivePath(format!(
                            "non UTF-8 name: {}",
                            path.display()
                        ))
                    })?;
                    segments.push(part);
                }
                Component::CurDir => {}
                _ => {
                    return Err(Error::InvalidArchivePath(format!(
                        "not a relative path: {}",
                        path.display()
                    )));
                }
            }
        }
        Self::try_from(segments.join("/"))
    }

    fn validate(s: &str) -> Result<()> {
        if s.is_empty() {
            return Err(Error::InvalidArchivePath("empty path".into()));
        }
        if s.contains('\0') {
            return Err(Error::InvalidArchivePath("contains NUL byte".into()));
        }
        if s.len() > MAX_PATH_LENGTH {
            return Err(Error::InvalidArchivePath(format!(
                "path exceeds maximum length of {} bytes",
                MAX_PATH_LENGTH
            )));
        }
        if s.starts_with('/') {
            return Err(Error::InvalidArchivePath(
                "absolute path not allowed".into(),
            ));
        }
        for segment in s.split('/') {
            match segment {
                "" => {
                    return Err(Error::InvalidArchivePath(
                        "empty segment (consecutive or trailing slashes)".into(),
                    ));
                }
                "." | ".." => {
                    return Err(Error::InvalidArchivePath(format!(
                        "'{}' segment not allowed",
                        segment
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns the path as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the last segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Returns the number of segments.
    pub fn depth(&self) -> usize {
        self.0.split('/').count()
    }
}

impl AsRef<str> for ArchivePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for ArchivePath {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ArchivePath {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::validate(&s)?;
        Ok(Self(s))
    }
}
