use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod crc;
pub mod teleinfo;
pub mod vbus;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Append (or verify) the Nikobus CRC16 of a hex string.
    Crc(CrcArgs),
    /// Append (or verify) the Nikobus outer CRC8 of a command string.
    Crc2(CrcArgs),
    /// Build (or verify) a complete Nikobus command.
    Nikobus(NikobusArgs),
    /// Parse a CBETM Teleinfo frame from a file or stdin.
    Teleinfo(TeleinfoArgs),
    /// Encode or decode RESOL VBus live messages.
    #[command(subcommand)]
    Vbus(VbusCommand),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Crc(args) => crc::run_crc16(args, format),
        Command::Crc2(args) => crc::run_crc8(args, format),
        Command::Nikobus(args) => crc::run_nikobus(args, format),
        Command::Teleinfo(args) => teleinfo::run(args, format),
        Command::Vbus(command) => vbus::run(command, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct CrcArgs {
    /// Input text. With --verify, the text including its trailing checksum.
    pub input: String,
    /// Check the trailing checksum instead of appending one.
    #[arg(long)]
    pub verify: bool,
}

#[derive(Args, Debug)]
pub struct NikobusArgs {
    /// Command prefix, e.g. `$1012`.
    pub prefix: String,
    /// Hex body (address + data). With --verify, the complete command.
    pub body: String,
    /// Check both checksums of a complete command.
    #[arg(long)]
    pub verify: bool,
}

#[derive(Args, Debug)]
pub struct TeleinfoArgs {
    /// Read the frame from a file instead of stdin.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
    /// Skip group checksum verification.
    #[arg(long)]
    pub no_verify: bool,
    /// Reject frames without STX/ETX.
    #[arg(long)]
    pub require_delimiters: bool,
}

#[derive(Subcommand, Debug)]
pub enum VbusCommand {
    /// Encode one message and print its live bytes.
    Encode(VbusEncodeArgs),
    /// Decode live bytes from a hex string, a capture file or stdin.
    Decode(VbusDecodeArgs),
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum VbusProtocol {
    /// Protocol 1.0 packet.
    Packet,
    /// Protocol 2.0 datagram.
    Datagram,
    /// Protocol 3.0 telegram.
    Telegram,
}

#[derive(Args, Debug)]
pub struct VbusEncodeArgs {
    /// Protocol version to encode.
    #[arg(long, value_enum, default_value_t = VbusProtocol::Packet)]
    pub protocol: VbusProtocol,
    /// Destination address (hex).
    #[arg(long, value_parser = parse_hex_word)]
    pub dst: u16,
    /// Source address (hex).
    #[arg(long, value_parser = parse_hex_word)]
    pub src: u16,
    /// Command word (hex). Telegrams use the low byte only.
    #[arg(long, value_parser = parse_hex_word)]
    pub command: u16,
    /// Datagram value id (hex).
    #[arg(long, value_parser = parse_hex_word, default_value = "0")]
    pub value_id: u16,
    /// Datagram value.
    #[arg(long, default_value_t = 0)]
    pub value: i32,
    /// Packet or telegram payload (hex).
    #[arg(long, value_name = "HEX", default_value = "")]
    pub payload: String,
}

#[derive(Args, Debug)]
pub struct VbusDecodeArgs {
    /// Live bytes as hex. Reads binary from --file or stdin when absent.
    pub hex: Option<String>,
    /// Binary capture file.
    #[arg(long, value_name = "PATH", conflicts_with = "hex")]
    pub file: Option<PathBuf>,
    /// Maximum frames accepted per message.
    #[arg(long, default_value_t = 255)]
    pub max_frames: usize,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `0x7E11` or `7E11`.
fn parse_hex_word(text: &str) -> Result<u16, String> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u16::from_str_radix(digits, 16).map_err(|err| format!("invalid hex word {text:?}: {err}"))
}
