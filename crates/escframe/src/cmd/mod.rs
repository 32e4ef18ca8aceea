use clap::{Args, Subcommand};
use escframe_frame::{FrameConfig, Markers, DEFAULT_MAX_FRAME_SIZE, ESC, SOF};
use std::path::PathBuf;

use crate::exit::{frame_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod demo;
pub mod encode;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the two-stream example against one parser.
    Demo(DemoArgs),
    /// Decode frames from a file or stdin.
    Decode(DecodeArgs),
    /// Encode a payload as a single frame on stdout.
    Encode(EncodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat, framing: &FramingArgs) -> CliResult<i32> {
    match command {
        Command::Demo(args) => demo::run(args, format, framing),
        Command::Decode(args) => decode::run(args, format, framing),
        Command::Encode(args) => encode::run(args, framing),
        Command::Version(args) => version::run(args),
    }
}

/// Protocol settings shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct FramingArgs {
    /// Escape marker byte (decimal, 0x-hex, or one ASCII character). Default: 'H'.
    #[arg(long, value_name = "BYTE", env = "ESCFRAME_ESC", value_parser = parse_byte, global = true)]
    pub esc: Option<u8>,
    /// Start/end-of-frame marker byte. Default: 0x10.
    #[arg(long, value_name = "BYTE", env = "ESCFRAME_SOF", value_parser = parse_byte, global = true)]
    pub sof: Option<u8>,
    /// Maximum frame payload size in bytes. Default: 65536.
    #[arg(long, value_name = "BYTES", env = "ESCFRAME_MAX_FRAME_SIZE", global = true)]
    pub max_frame_size: Option<usize>,
}

impl FramingArgs {
    pub fn to_config(&self) -> CliResult<FrameConfig> {
        let markers = Markers::new(self.esc.unwrap_or(ESC), self.sof.unwrap_or(SOF))
            .map_err(|err| frame_error("invalid framing options", err))?;
        let max_frame_size = self.max_frame_size.unwrap_or(DEFAULT_MAX_FRAME_SIZE);
        if max_frame_size == 0 {
            return Err(CliError::new(USAGE, "--max-frame-size must be greater than zero"));
        }

        Ok(FrameConfig {
            markers,
            max_frame_size,
            ..FrameConfig::default()
        })
    }
}

fn parse_byte(input: &str) -> Result<u8, String> {
    let input = input.trim();
    if let Some(hex) = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        return u8::from_str_radix(hex, 16).map_err(|_| format!("invalid hex byte: {input}"));
    }
    if let Ok(value) = input.parse::<u8>() {
        return Ok(value);
    }

    let mut chars = input.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c as u8),
        _ => Err(format!("invalid byte: {input}")),
    }
}

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Print parser counters to stderr when done.
    #[arg(long)]
    pub stats: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// File to read. Reads stdin when omitted or "-".
    pub path: Option<PathBuf>,
    /// Input is hex text (whitespace ignored) rather than raw bytes.
    #[arg(long)]
    pub hex: bool,
    /// Exit after decoding N frames.
    #[arg(long)]
    pub count: Option<usize>,
    /// Dispatch empty frames instead of dropping them.
    #[arg(long)]
    pub emit_empty: bool,
    /// Print parser counters to stderr when done.
    #[arg(long)]
    pub stats: bool,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// String payload.
    #[arg(long, conflicts_with = "file")]
    pub data: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with = "data")]
    pub file: Option<PathBuf>,
    /// Print the encoded frame as hex text instead of raw bytes.
    #[arg(long)]
    pub hex: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
