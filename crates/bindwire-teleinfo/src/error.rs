/// Errors that can occur while parsing a Teleinfo frame.
#[derive(Debug, thiserror::Error)]
pub enum TeleinfoError {
    /// The frame envelope is broken (missing STX/ETX, EOT interruption).
    #[error("malformed frame: {0}")]
    Framing(&'static str),

    /// An information group does not have the `LABEL SP VALUE SP CHECKSUM` shape.
    #[error("malformed group {line:?}: {reason}")]
    Decode { line: String, reason: &'static str },

    /// The group checksum character does not match its content.
    #[error("checksum mismatch on {label}: expected {expected:?}, got {actual:?}")]
    Checksum {
        label: String,
        expected: char,
        actual: char,
    },

    /// The same label appears twice in one frame.
    #[error("duplicate label {0}")]
    DuplicateLabel(String),

    /// A field the grammar requires is absent.
    #[error("required field {key} missing from {grammar} frame")]
    MissingField {
        key: &'static str,
        grammar: &'static str,
    },

    /// A present field does not match its declared type.
    #[error("field {key}: expected {expected}, got {raw:?}")]
    FieldType {
        key: &'static str,
        expected: &'static str,
        raw: String,
    },
}

pub type Result<T> = std::result::Result<T, TeleinfoError>;
