use std::ops::Range;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, VbusError};
use crate::layout::{
    frame_len, COMMAND_RANGE, DATAGRAM_DATA_RANGE, DATAGRAM_LEN, DESTINATION_RANGE,
    MIN_PREFIX_LEN, PACKET_FRAME_COUNT_OFFSET, PACKET_FRAME_DATA_LEN, PACKET_HEADER_LEN,
    PROTOCOL_DATAGRAM, PROTOCOL_OFFSET, PROTOCOL_PACKET, PROTOCOL_TELEGRAM, SOURCE_RANGE, SYNC,
    TELEGRAM_COMMAND_OFFSET, TELEGRAM_FRAME_DATA_LEN, TELEGRAM_HEADER_LEN,
};

/// Addressing shared by every protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub destination: u16,
    pub source: u16,
}

impl Header {
    pub fn new(destination: u16, source: u16) -> Self {
        Self {
            destination,
            source,
        }
    }
}

/// Protocol 1.0 packet: a command and a payload of 4-byte frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub header: Header,
    pub command: u16,
    pub payload: Bytes,
}

impl Packet {
    pub fn new(header: Header, command: u16, payload: impl Into<Bytes>) -> Self {
        Self {
            header,
            command,
            payload: payload.into(),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.payload.len().div_ceil(PACKET_FRAME_DATA_LEN)
    }
}

/// Protocol 2.0 datagram: a command addressing one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Datagram {
    pub header: Header,
    pub command: u16,
    pub value_id: u16,
    pub value: i32,
}

/// Protocol 3.0 telegram. The frame count lives in bits 5-6 of the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Telegram {
    pub header: Header,
    pub command: u8,
    pub payload: Bytes,
}

impl Telegram {
    pub fn new(header: Header, command: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            header,
            command,
            payload: payload.into(),
        }
    }

    pub fn frame_count(&self) -> usize {
        telegram_frame_count(self.command)
    }
}

/// A decoded live message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Packet(Packet),
    Datagram(Datagram),
    Telegram(Telegram),
}

impl Message {
    pub fn header(&self) -> Header {
        match self {
            Message::Packet(p) => p.header,
            Message::Datagram(d) => d.header,
            Message::Telegram(t) => t.header,
        }
    }

    /// Protocol version byte (`0x10`, `0x20` or `0x30`).
    pub fn protocol(&self) -> u8 {
        match self {
            Message::Packet(_) => PROTOCOL_PACKET,
            Message::Datagram(_) => PROTOCOL_DATAGRAM,
            Message::Telegram(_) => PROTOCOL_TELEGRAM,
        }
    }

    /// Copy of this message with different addressing.
    pub fn with_header(&self, header: Header) -> Self {
        let mut message = self.clone();
        match &mut message {
            Message::Packet(p) => p.header = header,
            Message::Datagram(d) => d.header = header,
            Message::Telegram(t) => t.header = header,
        }
        message
    }

    /// The total wire size of this message.
    pub fn wire_size(&self) -> usize {
        match self {
            Message::Packet(p) => {
                PACKET_HEADER_LEN + p.frame_count() * frame_len(PACKET_FRAME_DATA_LEN)
            }
            Message::Datagram(_) => DATAGRAM_LEN,
            Message::Telegram(t) => {
                TELEGRAM_HEADER_LEN + t.frame_count() * frame_len(TELEGRAM_FRAME_DATA_LEN)
            }
        }
    }

    /// Live representation using the message's own header.
    pub fn to_live_bytes(&self) -> Result<Bytes> {
        let header = self.header();
        let mut buf = BytesMut::with_capacity(self.wire_size());
        encode(self, header.destination, header.source, &mut buf)?;
        Ok(buf.freeze())
    }
}

/// Configuration for the live codec.
#[derive(Debug, Clone)]
pub struct VbusConfig {
    /// Maximum frames accepted in one incoming message. Default: 255.
    pub max_frames: usize,
    /// Read timeout applied to socket sources.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout applied to socket sinks.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for VbusConfig {
    fn default() -> Self {
        Self {
            max_frames: u8::MAX as usize,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

/// VBus protocol checksum: `0x7F` minus every byte, modulo 128.
pub fn checksum_v0(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .fold(0x7Fu8, |crc, &b| crc.wrapping_sub(b) & 0x7F)
}

/// Encode a message into its live representation.
///
/// `destination` and `source` replace the addressing carried by `message`.
///
/// Packet layout:
/// ```text
/// ┌──────┬──────────┬──────────┬─────┬──────────┬───────┬─────┬──────────────────────┐
/// │ 0xAA │ Dst (LE) │ Src (LE) │ 0x10│ Cmd (LE) │ Count │ CRC │ Count × 6-byte frame │
/// └──────┴──────────┴──────────┴─────┴──────────┴───────┴─────┴──────────────────────┘
/// ```
/// Datagrams replace the count with a septettified value id and value;
/// telegrams carry a single command byte.
pub fn encode(message: &Message, destination: u16, source: u16, dst: &mut BytesMut) -> Result<()> {
    check_word("destination", destination)?;
    check_word("source", source)?;

    let start = dst.len();
    match message {
        Message::Packet(p) => {
            if p.payload.len() % PACKET_FRAME_DATA_LEN != 0 {
                return Err(VbusError::PayloadLength {
                    len: p.payload.len(),
                    reason: "packet payload must be a multiple of 4 bytes",
                });
            }
            let count = p.frame_count();
            if count > u8::MAX as usize {
                return Err(VbusError::TooManyFrames {
                    count,
                    max: u8::MAX as usize,
                });
            }
            check_word("command", p.command)?;

            dst.reserve(message.wire_size());
            put_prefix(dst, destination, source, PROTOCOL_PACKET);
            dst.put_u16_le(p.command);
            dst.put_u8(count as u8);
            put_checksum(dst, start);
            for chunk in p.payload.chunks(PACKET_FRAME_DATA_LEN) {
                put_frame(dst, chunk);
            }
        }
        Message::Datagram(d) => {
            check_word("command", d.command)?;

            dst.reserve(DATAGRAM_LEN);
            put_prefix(dst, destination, source, PROTOCOL_DATAGRAM);
            dst.put_u16_le(d.command);
            let mut data = [0u8; 6];
            data[..2].copy_from_slice(&d.value_id.to_le_bytes());
            data[2..].copy_from_slice(&d.value.to_le_bytes());
            put_septett(dst, &data);
            put_checksum(dst, start);
        }
        Message::Telegram(t) => {
            if t.command & 0x80 != 0 {
                return Err(VbusError::Unrepresentable {
                    field: "command",
                    value: u32::from(t.command),
                });
            }
            let expected = t.frame_count() * TELEGRAM_FRAME_DATA_LEN;
            if t.payload.len() != expected {
                return Err(VbusError::PayloadLength {
                    len: t.payload.len(),
                    reason: "telegram payload must match the command's frame count",
                });
            }

            dst.reserve(message.wire_size());
            put_prefix(dst, destination, source, PROTOCOL_TELEGRAM);
            dst.put_u8(t.command);
            put_checksum(dst, start);
            for chunk in t.payload.chunks(TELEGRAM_FRAME_DATA_LEN) {
                put_frame(dst, chunk);
            }
        }
    }
    Ok(())
}

/// Decode one message from a buffer.
///
/// Bytes before the next SYNC are discarded. Returns `Ok(None)` if the
/// buffer doesn't contain a complete message yet. On success, consumes the
/// message bytes. On error, consumes the offending SYNC byte so the next
/// call resynchronizes.
pub fn decode_message(src: &mut BytesMut, config: &VbusConfig) -> Result<Option<Message>> {
    match src.iter().position(|&b| b == SYNC) {
        Some(0) => {}
        Some(skip) => {
            tracing::trace!(skipped = skip, "discarding bytes before SYNC");
            src.advance(skip);
        }
        None => {
            if !src.is_empty() {
                tracing::trace!(skipped = src.len(), "discarding bytes without SYNC");
                src.clear();
            }
            return Ok(None);
        }
    }

    match parse_message(src, config) {
        Err(err) => {
            src.advance(1);
            Err(err)
        }
        ok => ok,
    }
}

fn parse_message(src: &mut BytesMut, config: &VbusConfig) -> Result<Option<Message>> {
    if src.len() < MIN_PREFIX_LEN {
        return Ok(None); // Need more data
    }
    check_septets(src, 1..MIN_PREFIX_LEN)?;

    let protocol = src[PROTOCOL_OFFSET];
    let (header_len, frame_data_len) = match protocol {
        PROTOCOL_PACKET => (PACKET_HEADER_LEN, PACKET_FRAME_DATA_LEN),
        PROTOCOL_DATAGRAM => (DATAGRAM_LEN, 0),
        PROTOCOL_TELEGRAM => (TELEGRAM_HEADER_LEN, TELEGRAM_FRAME_DATA_LEN),
        other => return Err(VbusError::UnsupportedProtocol(other)),
    };

    if src.len() < header_len {
        return Ok(None); // Need more data
    }
    check_septets(src, MIN_PREFIX_LEN..header_len)?;
    check_block(src, 1..header_len)?;

    let frame_count = match protocol {
        PROTOCOL_PACKET => src[PACKET_FRAME_COUNT_OFFSET] as usize,
        PROTOCOL_TELEGRAM => telegram_frame_count(src[TELEGRAM_COMMAND_OFFSET]),
        _ => 0,
    };
    if frame_count > config.max_frames {
        return Err(VbusError::TooManyFrames {
            count: frame_count,
            max: config.max_frames,
        });
    }

    let block_len = frame_len(frame_data_len);
    let total = header_len + frame_count * block_len;
    if src.len() < total {
        return Ok(None); // Need more data
    }
    for index in 0..frame_count {
        let block = header_len + index * block_len;
        check_septets(src, block..block + block_len)?;
        check_block(src, block..block + block_len)?;
    }

    let buf = src.split_to(total).freeze();
    let header = Header {
        destination: read_u16_le(&buf, DESTINATION_RANGE),
        source: read_u16_le(&buf, SOURCE_RANGE),
    };
    let frames = || {
        let mut payload = BytesMut::with_capacity(frame_count * frame_data_len);
        for index in 0..frame_count {
            let block = header_len + index * block_len;
            payload.extend_from_slice(&unseptett(&buf[block..block + frame_data_len + 1]));
        }
        payload.freeze()
    };

    let message = match protocol {
        PROTOCOL_PACKET => Message::Packet(Packet {
            header,
            command: read_u16_le(&buf, COMMAND_RANGE),
            payload: frames(),
        }),
        PROTOCOL_DATAGRAM => {
            let data = unseptett(&buf[DATAGRAM_DATA_RANGE.start..DATAGRAM_DATA_RANGE.end + 1]);
            Message::Datagram(Datagram {
                header,
                command: read_u16_le(&buf, COMMAND_RANGE),
                value_id: u16::from_le_bytes([data[0], data[1]]),
                value: i32::from_le_bytes([data[2], data[3], data[4], data[5]]),
            })
        }
        _ => Message::Telegram(Telegram {
            header,
            command: buf[TELEGRAM_COMMAND_OFFSET],
            payload: frames(),
        }),
    };
    Ok(Some(message))
}

fn telegram_frame_count(command: u8) -> usize {
    ((command >> 5) & 0x03) as usize
}

fn check_word(field: &'static str, value: u16) -> Result<()> {
    if value & 0x8080 != 0 {
        return Err(VbusError::Unrepresentable {
            field,
            value: u32::from(value),
        });
    }
    Ok(())
}

fn check_septets(src: &[u8], range: Range<usize>) -> Result<()> {
    match src[range.clone()].iter().position(|&b| b & 0x80 != 0) {
        Some(pos) => Err(VbusError::MsbSet {
            offset: range.start + pos,
        }),
        None => Ok(()),
    }
}

/// The last byte of `range` must be the checksum of the bytes before it.
fn check_block(src: &[u8], range: Range<usize>) -> Result<()> {
    let offset = range.end - 1;
    let expected = checksum_v0(&src[range.start..offset]);
    let actual = src[offset];
    if expected != actual {
        return Err(VbusError::InvalidChecksum {
            offset,
            expected,
            actual,
        });
    }
    Ok(())
}

fn read_u16_le(buf: &[u8], range: Range<usize>) -> u16 {
    u16::from_le_bytes([buf[range.start], buf[range.start + 1]])
}

fn put_prefix(dst: &mut BytesMut, destination: u16, source: u16, protocol: u8) {
    dst.put_u8(SYNC);
    dst.put_u16_le(destination);
    dst.put_u16_le(source);
    dst.put_u8(protocol);
}

/// Checksum over everything written since the SYNC at `start`.
fn put_checksum(dst: &mut BytesMut, start: usize) {
    let checksum = checksum_v0(&dst[start + 1..]);
    dst.put_u8(checksum);
}

/// Data bytes with their MSBs stripped, followed by the septett byte.
fn put_septett(dst: &mut BytesMut, data: &[u8]) {
    let mut septett = 0u8;
    for (i, &b) in data.iter().enumerate() {
        if b & 0x80 != 0 {
            septett |= 1 << i;
        }
        dst.put_u8(b & 0x7F);
    }
    dst.put_u8(septett);
}

fn put_frame(dst: &mut BytesMut, data: &[u8]) {
    let start = dst.len();
    put_septett(dst, data);
    let checksum = checksum_v0(&dst[start..]);
    dst.put_u8(checksum);
}

/// Inverse of [`put_septett`]: `block` is the data bytes followed by the septett.
fn unseptett(block: &[u8]) -> Vec<u8> {
    let (data, septett) = block.split_at(block.len() - 1);
    data.iter()
        .enumerate()
        .map(|(i, &b)| b | (((septett[0] >> i) & 1) << 7))
        .collect()
}
