//! Teleinfo frame parsing.
//!
//! A frame is a run of information groups, each `LABEL SP VALUE SP CHECKSUM`,
//! optionally wrapped in STX/ETX. Parsing happens in two steps:
//! - [`parse_groups`] tokenizes and checks every group checksum
//! - a static [`Grammar`] turns the groups into a typed [`Record`]
//!
//! Absent fields stay unset; they are never defaulted to zero.
//! [`cbetm`] builds the three-phase meter frames on top of this.

pub mod cbetm;
pub mod config;
pub mod error;
pub mod grammar;
pub mod groups;

pub use cbetm::{parse_frame, parse_frame_with_config, CbetmFrame, CbetmLong, CbetmShort, Ptec};
pub use config::ParseConfig;
pub use error::{Result, TeleinfoError};
pub use grammar::{Field, FieldKind, FieldSpec, Grammar, Record, Value};
pub use groups::{group_checksum, parse_groups, Groups};
