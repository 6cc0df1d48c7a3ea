//! Nikobus command checksums.
//!
//! Outgoing PC-link commands carry two checksums: a CRC16 over the
//! hex-encoded module address and data, and an outer CRC8 over the full
//! ASCII command including its `$` prefix.

use crate::engine::{append_checksum, verify_checksum};
use crate::error::{ChecksumError, Result};
use crate::params::{NIKOBUS_CRC16, NIKOBUS_CRC8};

/// Append the CRC16 to a hex string and uppercase the result.
///
/// `None` passes through as `None`.
pub fn append_crc<'a>(input: impl Into<Option<&'a str>>) -> Result<Option<String>> {
    match input.into() {
        Some(text) => append_checksum(text, &NIKOBUS_CRC16).map(Some),
        None => Ok(None),
    }
}

/// Append the outer CRC8 to a command string.
///
/// Only the two appended digits are uppercased; the command text is kept
/// as given.
// TODO: confirm against PC-link captures whether the module expects the whole
// command uppercased.
pub fn append_crc2(input: &str) -> String {
    let checksum = crate::engine::compute_bytes(input.as_bytes(), &NIKOBUS_CRC8);
    format!("{input}{checksum}")
}

/// Build a complete command: `prefix` + body with CRC16 + outer CRC8.
pub fn build_command(prefix: &str, body: &str) -> Result<String> {
    let inner = append_checksum(body, &NIKOBUS_CRC16)?;
    Ok(append_crc2(&format!("{prefix}{inner}")))
}

/// Check both checksums of a command built by [`build_command`].
///
/// `prefix_len` is the length of the prefix that precedes the CRC16-protected body.
pub fn verify_command(command: &str, prefix_len: usize) -> Result<bool> {
    let outer = NIKOBUS_CRC8.hex_width();
    let inner = NIKOBUS_CRC16.hex_width();
    let needed = prefix_len + inner + outer;
    if command.len() < needed {
        return Err(ChecksumError::TooShort {
            len: command.len(),
            needed,
        });
    }

    if !verify_checksum(command, &NIKOBUS_CRC8)? {
        return Ok(false);
    }

    let Some(body) = command.get(prefix_len..command.len() - outer) else {
        return Ok(false);
    };
    verify_checksum(body, &NIKOBUS_CRC16)
}
