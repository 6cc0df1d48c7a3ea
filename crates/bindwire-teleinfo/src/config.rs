/// Controls how strictly frames are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseConfig {
    /// When true, every group checksum is checked.
    pub verify_checksums: bool,
    /// When true, the frame must be wrapped in STX/ETX.
    pub require_delimiters: bool,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            verify_checksums: true,
            require_delimiters: false,
        }
    }
}
