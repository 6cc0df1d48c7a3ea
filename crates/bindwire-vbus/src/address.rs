//! Well-known VBus addresses.
//!
//! Addresses `0x0000`-`0x00FF` are used by displays, loggers and PCs;
//! controllers and modules use their product-specific address.

/// Broadcast destination.
pub const BROADCAST: u16 = 0x0000;

/// Remote display ("Datenfernanzeige").
pub const DFA: u16 = 0x0010;

/// Standard information channel used by controllers for live values.
pub const STANDARD_INFOS: u16 = 0x0015;

/// PC or other host on the bus.
pub const COMPUTER: u16 = 0x0020;

/// First address of the EM extension module range.
pub const EM_BASE: u16 = 0x6650;

/// Valid EM sub-addresses.
pub const EM_IDS: std::ops::RangeInclusive<u8> = 1..=15;

/// Address of the EM extension module with the given sub-address.
///
/// Returns `None` for ids outside [`EM_IDS`].
pub fn em_address(device_id: u8) -> Option<u16> {
    EM_IDS.contains(&device_id).then_some(EM_BASE + u16::from(device_id))
}

/// Returns a human-readable name for a well-known address.
pub fn device_name(address: u16) -> Option<&'static str> {
    match address {
        BROADCAST => Some("Broadcast"),
        DFA => Some("DFA"),
        STANDARD_INFOS => Some("Standard-Infos"),
        COMPUTER => Some("Computer"),
        0x0050 => Some("DL2"),
        0x0053 => Some("DL3"),
        0x6651..=0x665F => Some("EM"),
        0x7E11 => Some("DeltaSol BX Plus"),
        _ => None,
    }
}
