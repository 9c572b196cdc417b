//! Exit codes for the CLI tool.

use sevenz_update::Error;

/// Exit code constants
pub const SUCCESS: i32 = 0;
/// Archive written but some files were left out
pub const WARNING: i32 = 1;
/// Fatal error occurred
pub const FATAL_ERROR: i32 = 2;
/// Input or output file error
pub const IO_ERROR: i32 = 5;
/// Ctrl+C (128 + SIGINT)
pub const USER_INTERRUPT: i32 = 130;
/// Invalid command line arguments
pub const BAD_ARGS: i32 = 255;

/// Exit code enum for structured handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    Warning,
    FatalError,
    IoError,
    BadArgs,
}

impl ExitCode {
    /// Returns the numeric exit code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::Warning => WARNING,
            Self::FatalError => FATAL_ERROR,
            Self::IoError => IO_ERROR,
            Self::BadArgs => BAD_ARGS,
        }
    }
}

/// Converts a build error to an exit code
pub fn error_to_exit_code(error: &Error) -> ExitCode {
    match error {
        Error::PartialFailure { .. } => ExitCode::Warning,
        Error::Io(_)
        | Error::PathNotFound { .. }
        | Error::DirectoryRead { .. }
        | Error::CreateOutput { .. }
        | Error::SfxInput { .. }
        | Error::SfxStubMissing { .. } => ExitCode::IoError,
        Error::InvalidCompressionLevel { .. }
        | Error::InvalidVolumeSize
        | Error::InvalidArchivePath(_)
        | Error::NoEntries => ExitCode::BadArgs,
        _ => ExitCode::FatalError,
    }
}
