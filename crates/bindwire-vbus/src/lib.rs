//! RESOL VBus live encoding.
//!
//! Every live message starts with the SYNC byte `0xAA`; all other bytes
//! are 7-bit. Payload bytes lose their MSB on the wire and carry it in a
//! trailing septett byte. Three protocol versions are supported:
//! - 1.0 packets (command + 4-byte frames)
//! - 2.0 datagrams (command + value id + 32-bit value)
//! - 3.0 telegrams (command byte + 7-byte frames)

pub mod address;
pub mod codec;
pub mod error;
pub mod layout;
pub mod reader;
pub mod writer;

pub use address::{
    device_name, em_address, BROADCAST, COMPUTER, DFA, EM_BASE, EM_IDS, STANDARD_INFOS,
};
pub use codec::{
    checksum_v0, decode_message, encode, Datagram, Header, Message, Packet, Telegram, VbusConfig,
};
pub use error::{Result, VbusError};
pub use reader::LiveReader;
pub use writer::LiveWriter;
