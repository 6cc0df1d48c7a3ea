/// Errors that can occur while encoding, decoding or transmitting VBus messages.
#[derive(Debug, thiserror::Error)]
pub enum VbusError {
    /// A checksum byte does not match the bytes it covers.
    #[error("checksum mismatch at offset {offset} (expected 0x{expected:02X}, got 0x{actual:02X})")]
    InvalidChecksum {
        offset: usize,
        expected: u8,
        actual: u8,
    },

    /// A byte after SYNC has its MSB set.
    #[error("byte at offset {offset} has MSB set")]
    MsbSet { offset: usize },

    /// The protocol version byte is not 1.0, 2.0 or 3.0.
    #[error("unsupported protocol version 0x{0:02X}")]
    UnsupportedProtocol(u8),

    /// The message announces more frames than allowed.
    #[error("too many frames ({count}, max {max})")]
    TooManyFrames { count: usize, max: usize },

    /// The payload does not fit the frame layout of its protocol.
    #[error("invalid payload length {len}: {reason}")]
    PayloadLength { len: usize, reason: &'static str },

    /// A header field cannot be expressed in 7-bit wire bytes.
    #[error("{field} 0x{value:X} is not representable on the wire")]
    Unrepresentable { field: &'static str, value: u32 },

    /// The sink or source failed.
    #[error("VBus I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete message was transferred.
    #[error("connection closed (incomplete message)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, VbusError>;
