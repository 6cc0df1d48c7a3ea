/// Errors that can occur while computing or checking a checksum.
#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    /// The payload is not a valid hex digit sequence.
    #[error("invalid hex payload {input:?}: {source}")]
    Decode {
        input: String,
        source: hex::FromHexError,
    },

    /// The text is too short to carry the checksum being verified.
    #[error("text too short for checksum ({len} chars, need at least {needed})")]
    TooShort { len: usize, needed: usize },

    /// The register width is outside `1..=32`.
    #[error("checksum width {width} is outside 1..=32")]
    InvalidWidth { width: u32 },
}

pub type Result<T> = std::result::Result<T, ChecksumError>;
