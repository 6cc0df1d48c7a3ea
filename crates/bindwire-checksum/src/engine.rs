use std::borrow::Cow;
use std::fmt;

use crate::error::{ChecksumError, Result};
use crate::params::{Algorithm, ChecksumParameters, InputEncoding};

/// Final register value of a checksum run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecksumResult {
    /// Register value, already masked to the parameter width.
    pub value: u32,
    /// Register width in bits.
    pub width: u32,
}

impl ChecksumResult {
    /// Number of hex digits in the rendered form.
    pub fn hex_width(&self) -> usize {
        self.width.div_ceil(4) as usize
    }
}

/// Renders as `ceil(width / 4)` zero-padded uppercase hex digits.
impl fmt::Display for ChecksumResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$X}", self.value, width = self.hex_width())
    }
}

/// Compute the checksum of a textual payload.
///
/// Hex-digit payloads are decoded first; odd length or a non-hex digit
/// fails with [`ChecksumError::Decode`].
pub fn compute_checksum(payload: &str, params: &ChecksumParameters) -> Result<ChecksumResult> {
    let bytes = payload_bytes(payload, params)?;
    Ok(compute_bytes(&bytes, params))
}

/// Run the register over raw bytes.
pub fn compute_bytes(bytes: &[u8], params: &ChecksumParameters) -> ChecksumResult {
    let mask = params.mask();
    let top = params.top_bit();
    let mut register = params.init();

    match params.algorithm() {
        Algorithm::BitSerial => {
            for &byte in bytes {
                for bit in (0..8).rev() {
                    let data_bit = (byte >> bit) & 1 == 1;
                    let top_bit = register & top != 0;
                    register = (register << 1) & mask;
                    if data_bit ^ top_bit {
                        register ^= params.polynomial();
                    }
                }
            }
        }
        Algorithm::ByteXor => {
            for &byte in bytes {
                register ^= u32::from(byte);
                for _ in 0..8 {
                    let top_bit = register & top != 0;
                    register <<= 1;
                    if top_bit {
                        register ^= params.polynomial();
                    }
                    register &= mask;
                }
            }
        }
    }

    ChecksumResult {
        value: register & mask,
        width: params.width(),
    }
}

/// Append the rendered checksum to the payload.
///
/// When the parameter set asks for it the payload is uppercased too;
/// otherwise only the appended digits are uppercase.
pub fn append_checksum(payload: &str, params: &ChecksumParameters) -> Result<String> {
    let checksum = compute_checksum(payload, params)?;
    if params.uppercase_input() {
        Ok(format!("{}{checksum}", payload.to_uppercase()))
    } else {
        Ok(format!("{payload}{checksum}"))
    }
}

/// Check that the trailing digits of `text` are the checksum of the rest.
///
/// Digits are compared case-insensitively. Returns `Ok(false)` on mismatch.
pub fn verify_checksum(text: &str, params: &ChecksumParameters) -> Result<bool> {
    let needed = params.hex_width();
    if text.len() < needed {
        return Err(ChecksumError::TooShort {
            len: text.len(),
            needed,
        });
    }

    let split = text.len() - needed;
    if !text.is_char_boundary(split) {
        return Ok(false);
    }
    let (payload, digits) = text.split_at(split);
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Ok(false);
    }
    let Ok(expected) = u32::from_str_radix(digits, 16) else {
        return Ok(false);
    };

    let actual = compute_checksum(payload, params)?;
    if actual.value != expected {
        tracing::debug!(
            expected = %digits,
            actual = %actual,
            "checksum mismatch"
        );
        return Ok(false);
    }
    Ok(true)
}

fn payload_bytes<'a>(payload: &'a str, params: &ChecksumParameters) -> Result<Cow<'a, [u8]>> {
    match params.input() {
        InputEncoding::RawBytes => Ok(Cow::Borrowed(payload.as_bytes())),
        InputEncoding::HexDigits => hex::decode(payload)
            .map(Cow::Owned)
            .map_err(|source| ChecksumError::Decode {
                input: payload.to_string(),
                source,
            }),
    }
}
