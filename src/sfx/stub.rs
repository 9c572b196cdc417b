//! SFX stub executable detection.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Executable formats recognized in SFX stubs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SfxFormat {
    /// Windows PE executable (.exe).
    WindowsPe,
    /// Linux ELF binary.
    LinuxElf,
    /// macOS Mach-O binary.
    MacOsMachO,
}

impl SfxFormat {
    /// Detects the format of a stub from its leading magic bytes.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(b"MZ") {
            return Some(Self::WindowsPe);
        }
        let magic: [u8; 4] = data.get(..4)?.try_into().ok()?;
        if &magic == b"\x7FELF" {
            return Some(Self::LinuxElf);
        }
        let be = u32::from_be_bytes(magic);
        let le = u32::from_le_bytes(magic);
        if matches!(be, 0xFEEDFACE | 0xFEEDFACF | 0xCAFEBABE | 0xBEBAFECA)
            || matches!(le, 0xFEEDFACE | 0xFEEDFACF)
        {
            return Some(Self::MacOsMachO);
        }
        None
    }

    /// Returns the customary file extension, empty when there is none.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::WindowsPe => "exe",
            Self::LinuxElf | Self::MacOsMachO => "",
        }
    }

    /// Returns a human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::WindowsPe => "Windows PE",
            Self::LinuxElf => "Linux ELF",
            Self::MacOsMachO => "macOS Mach-O",
        }
    }
}

/// A stub executable on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SfxStub {
    /// Where the stub lives.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Detected format, `None` for unrecognized stubs.
    pub format: Option<SfxFormat>,
}

impl SfxStub {
    /// Opens a stub and detects its format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SfxInput`] if the file cannot be read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let input_error = |source| Error::SfxInput {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(input_error)?;
        let size = file.metadata().map_err(input_error)?.len();
        let mut magic = Vec::with_capacity(4);
        file.by_ref()
            .take(4)
            .read_to_end(&mut magic)
            .map_err(input_error)?;

        Ok(Self {
            path: path.to_path_buf(),
            size,
            format: SfxFormat::detect(&magic),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_pe() {
        assert_eq!(SfxFormat::detect(b"MZ\x90\x00"), Some(SfxFormat::WindowsPe));
        assert_eq!(SfxFormat::detect(b"MZ"), Some(SfxFormat::WindowsPe));
    }

    #[test]
    fn test_detect_elf() {
        assert_eq!(
            SfxFormat::detect(b"\x7FELF\x02\x01"),
            Some(SfxFormat::LinuxElf)
        );
    }

    #[test]
    fn test_detect_macho() {
        assert_eq!(
            SfxFormat::detect(&[0xCF, 0xFA, 0xED, 0xFE]),
            Some(SfxFormat::MacOsMachO)
        );
        assert_eq!(
            SfxFormat::detect(&[0xCA, 0xFE, 0xBA, 0xBE]),
            Some(SfxFormat::MacOsMachO)
        );
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(SfxFormat::detect(b"7z\xBC\xAF"), None);
        assert_eq!(SfxFormat::detect(b"M"), None);
        assert_eq!(SfxFormat::detect(b""), None);
    }

    #[test]
    fn test_format_names() {
        assert_eq!(SfxFormat::WindowsPe.extension(), "exe");
        assert_eq!(SfxFormat::LinuxElf.extension(), "");
        assert_eq!(SfxFormat::MacOsMachO.name(), "macOS Mach-O");
    }

    #[test]
    fn test_open_reads_size_and_format() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("7z.sfx");
        std::fs::write(&path, b"MZ stub bytes").unwrap();
        let stub = SfxStub::open(&path).unwrap();
        assert_eq!(stub.size, 13);
        assert_eq!(stub.format, Some(SfxFormat::WindowsPe));

        let err = SfxStub::open(dir.path().join("missing.sfx")).unwrap_err();
        assert!(matches!(err, Error::SfxInput { .. }));
    }
}
