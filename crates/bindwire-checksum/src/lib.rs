//! Checksum engine for vendor wire protocols.
//!
//! Two register walks cover the protocols handled here:
//! - bit-serial CRC over hex-decoded bytes (Nikobus CRC16, CCITT polynomial)
//! - byte-XOR rolling checksum over raw ASCII bytes (Nikobus outer CRC8)
//!
//! Both render as fixed-width, zero-padded, uppercase hex.

pub mod engine;
pub mod error;
pub mod nikobus;
pub mod params;

pub use engine::{append_checksum, compute_bytes, compute_checksum, verify_checksum, ChecksumResult};
pub use error::{ChecksumError, Result};
pub use nikobus::{append_crc, append_crc2, build_command, verify_command};
pub use params::{Algorithm, ChecksumParameters, InputEncoding, NIKOBUS_CRC16, NIKOBUS_CRC8};
