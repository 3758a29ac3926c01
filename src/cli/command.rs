use std::path::PathBuf;

use audiorip::process::validate::AudioFormat;
use clap::{Parser as ClapParser, ValueEnum};

pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (core ",
    env!("AUDIORIP_CORE_VERSION"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

#[derive(Debug, ClapParser)]
#[command(
    name         = "audiorip",
    version      = env!("CARGO_PKG_VERSION"),
    long_version = LONG_VERSION,
    about        = "Find and extract WAVE, Ogg and MPEG audio streams embedded in binary files",
    long_about   = None,
    after_help   = "Format flags take two dashes: --wav, --ogg, --mpeg. \
                    Without any of them every format is scanned.",
)]
pub struct Cli {
    /// Input file to scan.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Search for RIFF/WAVE files.
    #[arg(long)]
    pub wav: bool,

    /// Search for Ogg bitstreams.
    #[arg(long)]
    pub ogg: bool,

    /// Search for MPEG audio (layer I/II/III) streams.
    #[arg(long)]
    pub mpeg: bool,

    /// Report streams without extracting them.
    #[arg(short, long)]
    pub scan_only: bool,

    /// Directory in which the extraction dir is created.
    #[arg(short, long, value_name = "PATH", default_value = ".")]
    pub output_path: PathBuf,

    /// Write a YAML report of the scan to this file.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Abort the whole run on the first failing format pass.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long, global = true)]
    pub progress: bool,
}

impl Cli {
    /// Formats to scan for, in scan order. No format flag means all formats.
    pub fn formats(&self) -> Vec<AudioFormat> {
        let selected: Vec<AudioFormat> = AudioFormat::ALL
            .into_iter()
            .filter(|format| match format {
                AudioFormat::Wav => self.wav,
                AudioFormat::Ogg => self.ogg,
                AudioFormat::Mpeg => self.mpeg,
            })
            .collect();

        if selected.is_empty() {
            AudioFormat::ALL.to_vec()
        } else {
            selected
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}
