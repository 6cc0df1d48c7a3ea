use std::io::{IsTerminal, Write};

use bindwire_teleinfo::{CbetmFrame, Value};
use bindwire_vbus::{device_name, Message};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
pub struct ChecksumOutput<'a> {
    pub algorithm: &'a str,
    pub input: &'a str,
    pub output: &'a str,
}

#[derive(Serialize)]
pub struct VerifyOutput<'a> {
    pub algorithm: &'a str,
    pub input: &'a str,
    pub valid: bool,
}

pub fn print_checksum(out: &ChecksumOutput<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => print_table(
            vec!["ALGORITHM", "INPUT", "OUTPUT"],
            vec![vec![
                out.algorithm.to_string(),
                out.input.to_string(),
                out.output.to_string(),
            ]],
        ),
        OutputFormat::Pretty => println!("{}", out.output),
        OutputFormat::Raw => print_raw(out.output.as_bytes()),
    }
}

pub fn print_verification(out: &VerifyOutput<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => print_table(
            vec!["ALGORITHM", "INPUT", "VALID"],
            vec![vec![
                out.algorithm.to_string(),
                out.input.to_string(),
                out.valid.to_string(),
            ]],
        ),
        OutputFormat::Pretty | OutputFormat::Raw => {
            println!("{}", if out.valid { "valid" } else { "invalid" })
        }
    }
}

pub fn print_teleinfo(frame: &CbetmFrame, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(frame),
        OutputFormat::Table => {
            let rows = teleinfo_rows(frame)
                .into_iter()
                .map(|(label, value)| vec![label.to_string(), value])
                .collect();
            print_table(vec!["LABEL", "VALUE"], rows);
        }
        OutputFormat::Pretty => {
            println!("frame_type={}", frame.frame_type());
            for (label, value) in teleinfo_rows(frame) {
                println!("{label}={value}");
            }
        }
        OutputFormat::Raw => print_raw(frame.encode().as_bytes()),
    }
}

/// Set fields of a frame, in label order.
pub fn teleinfo_rows(frame: &CbetmFrame) -> Vec<(&'static str, String)> {
    frame
        .fields()
        .into_iter()
        .filter_map(|(label, value)| value.map(|v| (label, value_text(&v))))
        .collect()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Integer(n) => n.to_string(),
        Value::Decimal(x) => x.to_string(),
        Value::Enum(token) => (*token).to_string(),
        Value::Text(text) => text.clone(),
    }
}

#[derive(Serialize)]
pub struct LiveOutput {
    pub protocol: &'static str,
    pub size: usize,
    pub hex: String,
}

pub fn print_live(message: &Message, live: &[u8], format: OutputFormat) {
    let out = LiveOutput {
        protocol: protocol_name(message),
        size: live.len(),
        hex: hex::encode(live),
    };
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => print_table(
            vec!["PROTOCOL", "SIZE", "LIVE"],
            vec![vec![out.protocol.to_string(), out.size.to_string(), out.hex]],
        ),
        OutputFormat::Pretty => println!("{}", out.hex),
        OutputFormat::Raw => print_raw(live),
    }
}

#[derive(Debug, Serialize)]
pub struct MessageOutput {
    pub protocol: &'static str,
    pub destination: String,
    pub destination_name: Option<&'static str>,
    pub source: String,
    pub source_name: Option<&'static str>,
    pub command: String,
    pub frames: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<i32>,
}

impl MessageOutput {
    pub fn from_message(message: &Message) -> Self {
        let header = message.header();
        let (command, frames, payload, value_id, value) = match message {
            Message::Packet(p) => (
                format!("0x{:04X}", p.command),
                p.frame_count(),
                Some(hex::encode(&p.payload)),
                None,
                None,
            ),
            Message::Datagram(d) => (
                format!("0x{:04X}", d.command),
                0,
                None,
                Some(format!("0x{:04X}", d.value_id)),
                Some(d.value),
            ),
            Message::Telegram(t) => (
                format!("0x{:02X}", t.command),
                t.frame_count(),
                Some(hex::encode(&t.payload)),
                None,
                None,
            ),
        };

        Self {
            protocol: protocol_name(message),
            destination: format!("0x{:04X}", header.destination),
            destination_name: device_name(header.destination),
            source: format!("0x{:04X}", header.source),
            source_name: device_name(header.source),
            command,
            frames,
            payload,
            value_id,
            value,
        }
    }

    fn detail(&self) -> String {
        match (&self.payload, &self.value_id, self.value) {
            (Some(payload), _, _) => payload.clone(),
            (None, Some(id), Some(value)) => format!("{id}={value}"),
            _ => String::new(),
        }
    }
}

pub fn print_messages(messages: &[Message], format: OutputFormat) {
    let outputs: Vec<MessageOutput> = messages.iter().map(MessageOutput::from_message).collect();
    match format {
        OutputFormat::Json => {
            for out in &outputs {
                print_json(out);
            }
        }
        OutputFormat::Table => {
            let rows = outputs
                .iter()
                .map(|out| {
                    vec![
                        out.protocol.to_string(),
                        labelled(&out.destination, out.destination_name),
                        labelled(&out.source, out.source_name),
                        out.command.clone(),
                        out.frames.to_string(),
                        out.detail(),
                    ]
                })
                .collect();
            print_table(vec!["PROTOCOL", "DST", "SRC", "COMMAND", "FRAMES", "DATA"], rows);
        }
        OutputFormat::Pretty => {
            for out in &outputs {
                println!(
                    "v{} dst={} src={} cmd={} frames={} {}",
                    out.protocol,
                    labelled(&out.destination, out.destination_name),
                    labelled(&out.source, out.source_name),
                    out.command,
                    out.frames,
                    out.detail()
                );
            }
        }
        OutputFormat::Raw => {
            for message in messages {
                if let Ok(live) = message.to_live_bytes() {
                    print_raw(&live);
                }
            }
        }
    }
}

fn protocol_name(message: &Message) -> &'static str {
    match message {
        Message::Packet(_) => "1.0",
        Message::Datagram(_) => "2.0",
        Message::Telegram(_) => "3.0",
    }
}

fn labelled(address: &str, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("{address} ({name})"),
        None => address.to_string(),
    }
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn print_table(header: Vec<&str>, rows: Vec<Vec<String>>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    for row in rows {
        table.add_row(row);
    }
    println!("{table}");
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}
