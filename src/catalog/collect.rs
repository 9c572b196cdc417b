//! File-system traversal that builds an [`EntryCatalog`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{ArchiveEntry, EntryCatalog};
use crate::{ArchivePath, Error, Result};

/// Options controlling how inputs are collected.
#[derive(Debug, Clone, Default)]
pub struct CollectOptions {
    /// Store traversed subdirectories as explicit entries.
    pub include_directories: bool,
    /// Follow symbolic links instead of skipping them.
    pub follow_links: bool,
}

impl CollectOptions {
    /// Creates the default options: files only, links not followed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores each traversed subdirectory before its contents.
    pub fn include_directories(mut self, include: bool) -> Self {
        self.include_directories = include;
        self
    }

    /// Archives symbolic links as the entries they point to.
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }
}

/// Collects `paths` with default options.
///
/// See [`collect_with`].
pub fn collect<P: AsRef<Path>>(paths: &[P]) -> Result<EntryCatalog> {
    collect_with(paths, &CollectOptions::default())
}

/// Collects `paths` into a catalog, in order.
///
/// A plain file is stored under its base name. A directory is traversed
/// depth-first in file-name order and each file inside is stored under its
/// path relative to that directory. The directory itself is never stored.
///
/// # Errors
///
/// Fails without a partial catalog if any input does not exist
/// ([`Error::PathNotFound`]) or any directory cannot be read
/// ([`Error::DirectoryRead`]). A plain-file input whose name is not valid
/// UTF-8 is [`Error::InvalidArchivePath`]; such names inside a directory are
/// skipped with a warning.
pub fn collect_with<P: AsRef<Path>>(
    paths: &[P],
    options: &CollectOptions,
) -> Result<EntryCatalog> {
    let mut catalog = EntryCatalog::default();

    for input in paths {
        let input = input.as_ref();
        let metadata = stat(input)?;

        if metadata.is_dir() {
            log::info!("Processing directory: {}", input.display());
            collect_directory(input, options, &mut catalog)?;
        } else if metadata.is_file() {
            let name = input
                .file_name()
                .ok_or_else(|| Error::InvalidArchivePath(input.display().to_string()))?;
            let archive_path = ArchivePath::from_relative(Path::new(name))?;
            log::debug!("Added file: {}", input.display());
            catalog.push(ArchiveEntry::from_metadata(archive_path, input, &metadata));
        } else {
            log::warn!("Skipping {}: not a regular file", input.display());
        }
    }

    Ok(catalog)
}

/// Inputs named explicitly are always resolved through links.
fn stat(path: &Path) -> Result<fs::Metadata> {
    fs::metadata(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::PathNotFound {
            path: path.to_path_buf(),
        },
        _ => Error::Io(e),
    })
}

fn collect_directory(
    root: &Path,
    options: &CollectOptions,
    catalog: &mut EntryCatalog,
) -> Result<()> {
    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(options.follow_links)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|e| directory_error(root, e))?;
        let file_type = entry.file_type();

        if file_type.is_dir() && !options.include_directories {
            continue;
        }
        if file_type.is_symlink() {
            log::debug!("Skipping symbolic link: {}", entry.path().display());
            continue;
        }
        if !file_type.is_dir() && !file_type.is_file() {
            log::warn!("Skipping {}: not a regular file", entry.path().display());
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| Error::InvalidArchivePath(entry.path().display().to_string()))?;
        let archive_path = match ArchivePath::from_relative(relative) {
            Ok(archive_path) => archive_path,
            Err(e) => {
                log::warn!("Skipping {}: {}", entry.path().display(), e);
                continue;
            }
        };
        let metadata = entry.metadata().map_err(|e| directory_error(root, e))?;

        log::debug!("  Found {}: {}", kind(file_type.is_dir()), archive_path);
        catalog.push(ArchiveEntry::from_metadata(archive_path, entry.path(), &metadata));
    }

    Ok(())
}

fn kind(is_dir: bool) -> &'static str {
    if is_dir { "directory" } else { "file" }
}

fn directory_error(root: &Path, error: walkdir::Error) -> Error {
    let path = error
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(root));
    Error::DirectoryRead {
        path,
        source: error.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(catalog: &EntryCatalog) -> Vec<&str> {
        catalog.iter().map(|e| e.archive_path.as_str()).collect()
    }

    #[test]
    fn test_options_builder() {
        let options = CollectOptions::new()
            .include_directories(true)
            .follow_links(true);
        assert!(options.include_directories);
        assert!(options.follow_links);
    }

    #[test]
    fn test_empty_directory_yields_empty_catalog() {
        let dir = TempDir::new().unwrap();
        let catalog = collect(&[dir.path()]).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_missing_input_aborts() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        let missing = dir.path().join("missing");
        let err = collect(&[dir.path().join("a.txt"), missing.clone()]).unwrap_err();
        match err {
            Error::PathNotFound { path } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_files_sorted_by_name() {
        let dir = TempDir::new().unwrap();
        for name in ["c.txt", "a.txt", "b.txt"] {
            std::fs::write(dir.path().join(name), name).unwrap();
        }
        let catalog = collect(&[dir.path()]).unwrap();
        assert_eq!(names(&catalog), vec!["a.txt", "b.txt", "c.txt"]);
    }

    #[test]
    fn test_include_directories_before_contents() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        std::fs::write(dir.path().join("sub/deeper/x.bin"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("empty")).unwrap();

        let options = CollectOptions::new().include_directories(true);
        let catalog = collect_with(&[dir.path()], &options).unwrap();
        assert_eq!(
            names(&catalog),
            vec!["empty", "sub", "sub/deeper", "sub/deeper/x.bin"]
        );
        assert_eq!(catalog.directory_count(), 3);
        assert_eq!(catalog.total_size(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_skipped_unless_followed() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir(&data).unwrap();
        std::fs::write(data.join("real.txt"), b"real").unwrap();
        std::os::unix::fs::symlink(data.join("real.txt"), data.join("link.txt")).unwrap();

        let catalog = collect(&[&data]).unwrap();
        assert_eq!(names(&catalog), vec!["real.txt"]);

        let options = CollectOptions::new().follow_links(true);
        let catalog = collect_with(&[&data], &options).unwrap();
        assert_eq!(names(&catalog), vec!["link.txt", "real.txt"]);
        assert_eq!(catalog.get(0).unwrap().size, 4);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_name_in_directory_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("good.txt"), b"good").unwrap();
        std::fs::write(dir.path().join(OsStr::from_bytes(b"bad\xff.txt")), b"bad").unwrap();

        let catalog = collect(&[dir.path()]).unwrap();
        assert_eq!(names(&catalog), vec!["good.txt"]);
    }
}
