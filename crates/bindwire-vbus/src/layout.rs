use std::ops::Range;

pub const SYNC: u8 = 0xAA;

pub const DESTINATION_RANGE: Range<usize> = 1..3;
pub const SOURCE_RANGE: Range<usize> = 3..5;
pub const PROTOCOL_OFFSET: usize = 5;
pub const COMMAND_RANGE: Range<usize> = 6..8;

pub const PROTOCOL_PACKET: u8 = 0x10;
pub const PROTOCOL_DATAGRAM: u8 = 0x20;
pub const PROTOCOL_TELEGRAM: u8 = 0x30;

pub const PACKET_FRAME_COUNT_OFFSET: usize = 8;
pub const PACKET_HEADER_LEN: usize = 10;
pub const PACKET_FRAME_DATA_LEN: usize = 4;

pub const DATAGRAM_DATA_RANGE: Range<usize> = 8..14;
pub const DATAGRAM_LEN: usize = 16;

pub const TELEGRAM_COMMAND_OFFSET: usize = 6;
pub const TELEGRAM_HEADER_LEN: usize = 8;
pub const TELEGRAM_FRAME_DATA_LEN: usize = 7;

/// Smallest prefix that identifies the protocol version.
pub const MIN_PREFIX_LEN: usize = PROTOCOL_OFFSET + 1;

/// Data bytes + septett + checksum.
pub const fn frame_len(data_len: usize) -> usize {
    data_len + 2
}
