//! CLI tool for building 7z archives, volume sets and SFX executables.

mod commands;
mod exit_codes;
mod logger;
mod output;
mod password;
mod progress;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use std::path::PathBuf;

use exit_codes::ExitCode;

/// Build 7z archives through the update-callback engine protocol
#[derive(Parser)]
#[command(name = "sevenz-update")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value = "human", global = true)]
    format: OutputFormat,

    /// Suppress progress output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Log collection and volume details (-v info, -vv debug)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

/// Options shared by every build command.
#[derive(Args, Clone)]
pub struct BuildArgs {
    /// Files and directories to add
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Replace existing output files
    #[arg(long)]
    overwrite: bool,

    /// Store subdirectories as explicit entries
    #[arg(long)]
    include_directories: bool,

    /// Archive what symbolic links point to
    #[arg(long, short = 'L')]
    follow_links: bool,

    /// Also store access times
    #[arg(long)]
    atime: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an archive (alias: a)
    #[command(alias = "a")]
    Compress {
        /// Archive file to create
        archive: PathBuf,

        #[command(flatten)]
        build: BuildArgs,

        /// Compression level (0-9)
        #[arg(short = 'l', long, default_value = "9")]
        level: u32,
    },

    /// Create an archive split into volumes (alias: v)
    #[command(alias = "v")]
    Volumes {
        /// Archive name; volumes are written as <name>.001.<ext>, ...
        archive: PathBuf,

        #[command(flatten)]
        build: BuildArgs,

        /// Volume size in MiB
        #[arg(short = 's', long)]
        size: u64,

        /// Compression level (0-9)
        #[arg(short = 'l', long, default_value = "9")]
        level: u32,

        /// Digits in volume numbers
        #[arg(long, default_value = "3")]
        digits: usize,
    },

    /// Create a self-extracting executable
    Sfx {
        /// Executable to create
        output: PathBuf,

        #[command(flatten)]
        build: BuildArgs,

        /// SFX stub (default: 7z.sfx next to this program)
        #[arg(long)]
        stub: Option<PathBuf>,
    },

    /// Create a password-protected archive (alias: e)
    #[command(alias = "e")]
    Encrypt {
        /// Archive file to create
        archive: PathBuf,

        #[command(flatten)]
        build: BuildArgs,

        /// Password (will prompt if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,

        /// Leave file names readable
        #[arg(long)]
        no_encrypt_headers: bool,

        /// Compression level (0-9)
        #[arg(short = 'l', long, default_value = "9")]
        level: u32,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

fn main() {
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted");
        std::process::exit(exit_codes::USER_INTERRUPT);
    })
    .ok();

    let cli = Cli::parse();
    logger::init(cli.verbose);

    let display = commands::DisplayOptions {
        format: cli.format,
        quiet: cli.quiet,
    };

    let exit_code = match cli.command {
        Commands::Compress {
            archive,
            build,
            level,
        } => commands::compress(&archive, &build, level, display),

        Commands::Volumes {
            archive,
            build,
            size,
            level,
            digits,
        } => commands::volumes(&commands::VolumesConfig {
            archive: &archive,
            build: &build,
            size_mib: size,
            level,
            digits,
            display,
        }),

        Commands::Sfx {
            output,
            build,
            stub,
        } => commands::sfx(&output, &build, stub, display),

        Commands::Encrypt {
            archive,
            build,
            password,
            no_encrypt_headers,
            level,
        } => commands::encrypt(&commands::EncryptConfig {
            archive: &archive,
            build: &build,
            password,
            encrypt_headers: !no_encrypt_headers,
            level,
            display,
        }),

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            ExitCode::Success
        }
    };

    std::process::exit(exit_code.code());
}
