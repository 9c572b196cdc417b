//! Command implementations for the CLI tool.

use std::path::{Path, PathBuf};

use sevenz_update::sfx::default_stub_path;
use sevenz_update::{ArchiveDriver, BuildOptions, CollectOptions, Error, Result, ZesvenLoader};

use crate::exit_codes::{ExitCode, error_to_exit_code};
use crate::output::{OutputFormatter, create_formatter};
use crate::password::get_or_prompt_password;
use crate::progress::CliProgress;
use crate::{BuildArgs, OutputFormat};

/// How results are shown
#[derive(Clone, Copy)]
pub struct DisplayOptions {
    pub format: OutputFormat,
    pub quiet: bool,
}

/// Configuration for the volumes command
pub struct VolumesConfig<'a> {
    pub archive: &'a Path,
    pub build: &'a BuildArgs,
    pub size_mib: u64,
    pub level: u32,
    pub digits: usize,
    pub display: DisplayOptions,
}

/// Configuration for the encrypt command
pub struct EncryptConfig<'a> {
    pub archive: &'a Path,
    pub build: &'a BuildArgs,
    pub password: Option<String>,
    pub encrypt_headers: bool,
    pub level: u32,
    pub display: DisplayOptions,
}

/// Creates a plain archive
pub fn compress(
    archive: &Path,
    build: &BuildArgs,
    level: u32,
    display: DisplayOptions,
) -> ExitCode {
    let options = match base_options(build).level(level) {
        Ok(options) => options,
        Err(e) => return report_error(&e, display),
    };
    run_build(archive, build, options, display)
}

/// Creates a multi-volume archive
pub fn volumes(config: &VolumesConfig<'_>) -> ExitCode {
    let options = base_options(config.build)
        .level(config.level)
        .and_then(|o| o.volume_size_mib(config.size_mib))
        .map(|o| o.volume_digits(config.digits));
    let options = match options {
        Ok(options) => options,
        Err(e) => return report_error(&e, config.display),
    };
    run_build(config.archive, config.build, options, config.display)
}

/// Creates an encrypted archive
pub fn encrypt(config: &EncryptConfig<'_>) -> ExitCode {
    let Some(password) = get_or_prompt_password(config.password.clone()) else {
        return ExitCode::BadArgs;
    };
    let options = match base_options(config.build).level(config.level) {
        Ok(options) => options
            .password(password)
            .encrypt_headers(config.encrypt_headers),
        Err(e) => return report_error(&e, config.display),
    };
    run_build(config.archive, config.build, options, config.display)
}

/// Creates a self-extracting executable
pub fn sfx(
    output: &Path,
    build: &BuildArgs,
    stub: Option<PathBuf>,
    display: DisplayOptions,
) -> ExitCode {
    let stub = match stub.map_or_else(default_stub_path, Ok) {
        Ok(stub) => stub,
        Err(e) => return report_error(&e, display),
    };

    let result = ArchiveDriver::new(&ZesvenLoader)
        .options(base_options(build))
        .build_sfx(&build.files, output, &stub);

    match result {
        Ok(report) => {
            print(&create_formatter(display.format).format_sfx(&report));
            ExitCode::Success
        }
        Err(e) => report_error(&e, display),
    }
}

fn base_options(build: &BuildArgs) -> BuildOptions {
    BuildOptions::new()
        .overwrite(build.overwrite)
        .preserve_atime(build.atime)
        .collect(
            CollectOptions::new()
                .include_directories(build.include_directories)
                .follow_links(build.follow_links),
        )
}

fn run_build(
    archive: &Path,
    build: &BuildArgs,
    options: BuildOptions,
    display: DisplayOptions,
) -> ExitCode {
    let result: Result<_> = ArchiveDriver::new(&ZesvenLoader)
        .options(options)
        .build_with_progress(&build.files, archive, CliProgress::new(display.quiet));

    match result {
        Ok(report) => {
            if !display.quiet || display.format == OutputFormat::Json {
                print(&create_formatter(display.format).format_build(&report));
            }
            ExitCode::Success
        }
        Err(e) => report_error(&e, display),
    }
}

fn report_error(error: &Error, display: DisplayOptions) -> ExitCode {
    let formatter: Box<dyn OutputFormatter> = create_formatter(display.format);
    match error {
        Error::PartialFailure { failures } => eprint!("{}", formatter.format_partial(failures)),
        e => eprintln!("Error: {}", e),
    }
    error_to_exit_code(error)
}

fn print(text: &str) {
    if text.ends_with('\n') {
        print!("{}", text);
    } else {
        println!("{}", text);
    }
}
