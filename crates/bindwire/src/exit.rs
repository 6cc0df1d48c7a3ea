use std::fmt;
use std::io;

use bindwire_checksum::ChecksumError;
use bindwire_teleinfo::TeleinfoError;
use bindwire_vbus::VbusError;

pub const SUCCESS: i32 = 0;
/// A checksum was verified and did not match.
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => USAGE,
        io::ErrorKind::InvalidData => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn checksum_error(context: &str, err: ChecksumError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn teleinfo_error(context: &str, err: TeleinfoError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn vbus_error(context: &str, err: VbusError) -> CliError {
    match err {
        VbusError::Io(source) => io_error(context, source),
        VbusError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
        VbusError::Unrepresentable { .. }
        | VbusError::PayloadLength { .. }
        | VbusError::TooManyFrames { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        VbusError::InvalidChecksum { .. }
        | VbusError::MsbSet { .. }
        | VbusError::UnsupportedProtocol(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_by_kind() {
        let err = io_error("read", io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(err.code, USAGE);
        assert!(err.message.starts_with("read: "));

        let err = io_error("read", io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(err.code, PERMISSION_DENIED);

        let err = io_error("read", io::Error::from(io::ErrorKind::BrokenPipe));
        assert_eq!(err.code, INTERNAL);
    }

    #[test]
    fn vbus_errors_split_usage_and_data() {
        let usage = vbus_error(
            "encode",
            VbusError::Unrepresentable {
                field: "source",
                value: 0x80,
            },
        );
        assert_eq!(usage.code, USAGE);

        let data = vbus_error("decode", VbusError::UnsupportedProtocol(0x40));
        assert_eq!(data.code, DATA_INVALID);
        assert_eq!(data.to_string(), "decode: unsupported protocol version 0x40");
    }

    #[test]
    fn teleinfo_and_checksum_errors_are_data_invalid() {
        let err = teleinfo_error("parse", TeleinfoError::DuplicateLabel("ADCO".to_string()));
        assert_eq!(err.code, DATA_INVALID);

        let err = checksum_error("crc", ChecksumError::TooShort { len: 1, needed: 4 });
        assert_eq!(err.code, DATA_INVALID);
    }
}
