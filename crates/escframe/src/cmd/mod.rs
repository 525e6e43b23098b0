use std::path::PathBuf;

use clap::{Args, Subcommand};
use escframe_codec::{decoded_capacity, encoded_capacity};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod info;
pub mod version;

/// Largest payload the tool handles; codec buffers are sized from this at
/// compile time.
pub const MAX_PAYLOAD: usize = 64 * 1024;
pub const ENCODE_CAP: usize = encoded_capacity(MAX_PAYLOAD);
pub const DECODE_CAP: usize = decoded_capacity(MAX_PAYLOAD);

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode one payload into a frame.
    Encode(EncodeArgs),
    /// Scan a byte stream and print every recovered frame.
    Decode(DecodeArgs),
    /// Show wire-format constants and tool capacities.
    Info(InfoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args),
        Command::Decode(args) => decode::run(args, format),
        Command::Info(args) => info::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Raw string payload.
    #[arg(long, conflicts_with_all = ["hex", "file"])]
    pub data: Option<String>,
    /// Hex-encoded payload.
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub hex: Option<String>,
    /// Read payload from file (stdin when no payload source is given).
    #[arg(long, conflicts_with_all = ["data", "hex"])]
    pub file: Option<PathBuf>,
    /// Omit the CRC-32 trailer.
    #[arg(long)]
    pub no_crc: bool,
    /// Write the frame to a file instead of stdout.
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
    /// Print the frame as hex instead of raw bytes.
    #[arg(long)]
    pub hex_out: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Wire bytes to scan (stdin when omitted).
    pub input: Option<PathBuf>,
    /// Treat the input as hex text.
    #[arg(long)]
    pub hex: bool,
    /// Expect frames without a CRC-32 trailer.
    #[arg(long)]
    pub no_crc: bool,
    /// Stop after recovering N frames.
    #[arg(long)]
    pub count: Option<usize>,
    /// Fail on the first corrupt or oversized frame.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug, Default)]
pub struct InfoArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
