//! Checksum parameter sets.
//!
//! Parameter sets are plain constants; there is no registry to mutate.

use crate::error::{ChecksumError, Result};

/// How a textual payload is turned into the bytes fed to the register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEncoding {
    /// The text is a sequence of hex digit pairs.
    HexDigits,
    /// The text's own bytes are used as-is.
    RawBytes,
}

/// Register update rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// Each input bit, MSB first, is compared against the register's top bit.
    BitSerial,
    /// Each input byte is XORed into the register, then eight conditional shifts.
    ByteXor,
}

/// Immutable description of one checksum variant.
///
/// Fields are only reachable through [`ChecksumParameters::new`] and
/// [`ChecksumParameters::try_new`], so the width is always in `1..=32` and
/// `polynomial` / `init` never carry bits above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecksumParameters {
    width: u32,
    polynomial: u32,
    init: u32,
    input: InputEncoding,
    algorithm: Algorithm,
    uppercase_input: bool,
}

impl ChecksumParameters {
    pub const MAX_WIDTH: u32 = 32;

    /// Build a parameter set. Panics (at compile time for constants) when
    /// `width` is outside `1..=32`.
    pub const fn new(
        width: u32,
        polynomial: u32,
        init: u32,
        input: InputEncoding,
        algorithm: Algorithm,
        uppercase_input: bool,
    ) -> Self {
        assert!(
            width >= 1 && width <= Self::MAX_WIDTH,
            "checksum width must be in 1..=32"
        );
        let mask = width_mask(width);
        Self {
            width,
            polynomial: polynomial & mask,
            init: init & mask,
            input,
            algorithm,
            uppercase_input,
        }
    }

    /// Fallible [`new`](Self::new) for parameters chosen at runtime.
    pub fn try_new(
        width: u32,
        polynomial: u32,
        init: u32,
        input: InputEncoding,
        algorithm: Algorithm,
        uppercase_input: bool,
    ) -> Result<Self> {
        if width == 0 || width > Self::MAX_WIDTH {
            return Err(ChecksumError::InvalidWidth { width });
        }
        Ok(Self::new(
            width,
            polynomial,
            init,
            input,
            algorithm,
            uppercase_input,
        ))
    }

    /// Register width in bits.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Generator polynomial, without the implicit top bit.
    pub const fn polynomial(&self) -> u32 {
        self.polynomial
    }

    pub const fn init(&self) -> u32 {
        self.init
    }

    pub const fn input(&self) -> InputEncoding {
        self.input
    }

    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Whether [`append_checksum`](crate::append_checksum) uppercases the payload
    /// as well as the checksum digits.
    pub const fn uppercase_input(&self) -> bool {
        self.uppercase_input
    }

    /// Bit mask covering the register width.
    pub const fn mask(&self) -> u32 {
        width_mask(self.width)
    }

    /// Top bit of the register.
    pub const fn top_bit(&self) -> u32 {
        1u32 << (self.width - 1)
    }

    /// Number of hex digits the rendered checksum occupies.
    pub const fn hex_width(&self) -> usize {
        self.width.div_ceil(4) as usize
    }
}

const fn width_mask(width: u32) -> u32 {
    if width >= 32 {
        u32::MAX
    } else {
        (1u32 << width) - 1
    }
}

/// Nikobus primary checksum: CRC16 with the CCITT polynomial over hex-decoded bytes.
pub const NIKOBUS_CRC16: ChecksumParameters = ChecksumParameters::new(
    16,
    0x1021,
    0xFFFF,
    InputEncoding::HexDigits,
    Algorithm::BitSerial,
    true,
);

/// Nikobus secondary checksum over the raw command characters.
pub const NIKOBUS_CRC8: ChecksumParameters = ChecksumParameters::new(
    8,
    0x99,
    0x00,
    InputEncoding::RawBytes,
    Algorithm::ByteXor,
    false,
);
