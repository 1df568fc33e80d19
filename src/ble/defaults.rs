//! Static lookup tables for the BLE pipeline: advertising channel
//! frequencies, advertising PDU type names, and BLE SIG company
//! identifiers for manufacturer-specific advertising data.
//!
//! Carried over and extended from `original_source/scripts/processors/ble_processor.py`'s
//! `BLE_CHANNELS`, `ADV_TYPES`, and `COMPANY_IDS` tables.

/// BLE advertising channels: (channel number, center frequency in Hz).
pub const BLE_CHANNELS: &[(u8, u64)] = &[
    (37, 2_402_000_000),
    (38, 2_426_000_000),
    (39, 2_480_000_000),
];

/// Look up the center frequency for a BLE advertising channel number.
pub fn channel_freq_hz(channel: u8) -> Option<u64> {
    BLE_CHANNELS
        .iter()
        .find(|(ch, _)| *ch == channel)
        .map(|(_, freq)| *freq)
}

/// BLE access address used on all three advertising channels.
pub const ACCESS_ADDRESS: u32 = 0x8E89BED6;

/// BLE symbol rate (1 Msym/s for uncoded advertising PHY).
pub const SYMBOL_RATE: u32 = 1_000_000;

/// Advertising channel PDU type names, indexed by the header low nibble.
pub const ADV_TYPES: &[(u8, &str)] = &[
    (0, "ADV_IND"),
    (1, "ADV_DIRECT_IND"),
    (2, "ADV_NONCONN_IND"),
    (3, "SCAN_REQ"),
    (4, "SCAN_RSP"),
    (5, "CONNECT_IND"),
    (6, "ADV_SCAN_IND"),
];

/// Render a PDU type nibble as its advertising type name, or `UNKNOWN_<n>`.
pub fn adv_type_name(pdu_type: u8) -> String {
    ADV_TYPES
        .iter()
        .find(|(t, _)| *t == pdu_type)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("UNKNOWN_{}", pdu_type))
}

/// BLE SIG company identifiers (4-hex-digit little-endian company ID ->
/// vendor name), for the manufacturer-specific AD structure (type 0xFF).
pub const COMPANY_IDS: &[(&str, &str)] = &[
    ("004c", "Apple"),
    ("0006", "Microsoft"),
    ("004f", "Nordic Semiconductor"),
    ("0059", "Nordic Semiconductor"),
    ("0075", "Samsung"),
    ("00e0", "Google"),
    ("0157", "Tile"),
    ("02ff", "Espressif"),
    ("02e5", "Chipolo"),
];

/// Look up a company name by its 4-hex-digit lowercase manufacturer ID,
/// defaulting to `"Unknown"` per spec §4.4.
pub fn company_name(manufacturer_id: &str) -> &'static str {
    COMPANY_IDS
        .iter()
        .find(|(id, _)| *id == manufacturer_id)
        .map(|(_, name)| *name)
        .unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_table_matches_spec() {
        assert_eq!(channel_freq_hz(37), Some(2_402_000_000));
        assert_eq!(channel_freq_hz(38), Some(2_426_000_000));
        assert_eq!(channel_freq_hz(39), Some(2_480_000_000));
        assert_eq!(channel_freq_hz(40), None);
    }

    #[test]
    fn adv_type_name_known_and_unknown() {
        assert_eq!(adv_type_name(0), "ADV_IND");
        assert_eq!(adv_type_name(6), "ADV_SCAN_IND");
        assert_eq!(adv_type_name(9), "UNKNOWN_9");
    }

    #[test]
    fn company_name_known_and_unknown() {
        assert_eq!(company_name("004c"), "Apple");
        assert_eq!(company_name("ffff"), "Unknown");
    }
}
