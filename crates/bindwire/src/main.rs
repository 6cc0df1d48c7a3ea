mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "bindwire", version, about = "Home-automation wire codec CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true, env = "BINDWIRE_FORMAT")]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        global = true,
        env = "BINDWIRE_LOG_LEVEL"
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::VbusCommand;

    #[test]
    fn parses_crc_subcommand() {
        let cli = Cli::try_parse_from(["bindwire", "crc", "0A0200", "--verify"])
            .expect("crc args should parse");

        match cli.command {
            Command::Crc(args) => {
                assert_eq!(args.input, "0A0200");
                assert!(args.verify);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_vbus_encode_with_hex_addresses() {
        let cli = Cli::try_parse_from([
            "bindwire",
            "vbus",
            "encode",
            "--protocol",
            "datagram",
            "--dst",
            "0x7E11",
            "--src",
            "0020",
            "--command",
            "0x0900",
            "--value-id",
            "0x1234",
            "--value=-2",
        ])
        .expect("vbus encode args should parse");

        let Command::Vbus(VbusCommand::Encode(args)) = cli.command else {
            panic!("expected vbus encode");
        };
        assert_eq!(args.dst, 0x7E11);
        assert_eq!(args.src, 0x0020);
        assert_eq!(args.value_id, 0x1234);
        assert_eq!(args.value, -2);
    }

    #[test]
    fn rejects_conflicting_vbus_decode_inputs() {
        let err = Cli::try_parse_from([
            "bindwire",
            "vbus",
            "decode",
            "aa1000117e100001004f",
            "--file",
            "/tmp/capture.bin",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn rejects_bad_hex_word() {
        let err = Cli::try_parse_from([
            "bindwire", "vbus", "encode", "--dst", "0xZZ", "--src", "0x20", "--command", "0x100",
        ])
        .expect_err("bad hex should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_teleinfo_subcommand() {
        let cli = Cli::try_parse_from(["bindwire", "--format", "json", "teleinfo", "--no-verify"])
            .expect("teleinfo args should parse");
        assert!(matches!(cli.command, Command::Teleinfo(ref args) if args.no_verify));
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
    }
}
