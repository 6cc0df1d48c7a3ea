//! Wire codecs for home-automation bindings.
//!
//! # Crate Structure
//!
//! - [`checksum`]: Nikobus CRC16 / CRC8 checksum engine
//! - [`teleinfo`]: Teleinfo information groups and CBETM frames
//! - [`vbus`]: RESOL VBus live encoding and stream adapters

/// Re-export checksum types.
pub mod checksum {
    pub use bindwire_checksum::*;
}

/// Re-export Teleinfo types.
pub mod teleinfo {
    pub use bindwire_teleinfo::*;
}

/// Re-export VBus types.
pub mod vbus {
    pub use bindwire_vbus::*;
}
