use std::io::{Cursor, Read};

use bindwire_vbus::{
    Datagram, Header, LiveReader, LiveWriter, Message, Packet, Telegram, VbusConfig, VbusError,
};

use crate::cmd::{VbusCommand, VbusDecodeArgs, VbusEncodeArgs, VbusProtocol};
use crate::exit::{io_error, vbus_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_live, print_messages, OutputFormat};

pub fn run(command: VbusCommand, format: OutputFormat) -> CliResult<i32> {
    match command {
        VbusCommand::Encode(args) => encode(args, format),
        VbusCommand::Decode(args) => decode(args, format),
    }
}

fn encode(args: VbusEncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let header = Header::new(args.dst, args.src);
    let payload = parse_hex("payload", &args.payload)?;
    let message = match args.protocol {
        VbusProtocol::Packet => Message::Packet(Packet::new(header, args.command, payload)),
        VbusProtocol::Datagram => Message::Datagram(Datagram {
            header,
            command: args.command,
            value_id: args.value_id,
            value: args.value,
        }),
        VbusProtocol::Telegram => {
            let command = u8::try_from(args.command).map_err(|_| {
                CliError::new(
                    USAGE,
                    format!("telegram command 0x{:X} does not fit in one byte", args.command),
                )
            })?;
            Message::Telegram(Telegram::new(header, command, payload))
        }
    };

    if matches!(format, OutputFormat::Raw) {
        let mut writer = LiveWriter::new(std::io::stdout().lock());
        writer
            .write_message(&message)
            .map_err(|err| vbus_error("encode failed", err))?;
        return Ok(SUCCESS);
    }

    let live = message
        .to_live_bytes()
        .map_err(|err| vbus_error("encode failed", err))?;
    print_live(&message, &live, format);
    Ok(SUCCESS)
}

fn decode(args: VbusDecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let config = VbusConfig {
        max_frames: args.max_frames,
        ..VbusConfig::default()
    };

    let (messages, corrupt) = match (&args.hex, &args.file) {
        (Some(text), _) => read_all(Cursor::new(parse_hex("input", text)?), config)?,
        (None, Some(path)) => {
            let file = std::fs::File::open(path)
                .map_err(|err| io_error(&format!("cannot open {}", path.display()), err))?;
            read_all(file, config)?
        }
        (None, None) => read_all(std::io::stdin().lock(), config)?,
    };

    if messages.is_empty() && corrupt == 0 {
        return Err(CliError::new(
            DATA_INVALID,
            "no complete VBus message in input",
        ));
    }

    print_messages(&messages, format);
    if corrupt > 0 {
        tracing::warn!(corrupt, decoded = messages.len(), "input contained corrupt messages");
        return Ok(DATA_INVALID);
    }
    Ok(SUCCESS)
}

/// Read messages until EOF. Corrupt messages are logged and counted.
fn read_all<R: Read>(source: R, config: VbusConfig) -> CliResult<(Vec<Message>, usize)> {
    let mut reader = LiveReader::with_config(source, config);
    let mut messages = Vec::new();
    let mut corrupt = 0usize;

    loop {
        match reader.read_message() {
            Ok(message) => {
                tracing::debug!(
                    protocol = message.protocol(),
                    source = message.header().source,
                    "decoded message"
                );
                messages.push(message);
            }
            Err(VbusError::ConnectionClosed) => break,
            Err(VbusError::Io(err)) => return Err(io_error("read failed", err)),
            Err(err) => {
                corrupt += 1;
                tracing::warn!(error = %err, "skipping corrupt message");
            }
        }
    }
    Ok((messages, corrupt))
}

fn parse_hex(what: &str, text: &str) -> CliResult<Vec<u8>> {
    let digits: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&digits)
        .map_err(|err| CliError::new(USAGE, format!("invalid {what} hex {text:?}: {err}")))
}
