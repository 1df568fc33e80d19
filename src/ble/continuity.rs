//! Apple Continuity vendor sub-parser (spec §4.4), invoked when an AD
//! structure's `manufacturerId` is `"004c"` (Apple).
//!
//! Not present in `original_source/` (the Python reference never parses
//! manufacturer-specific payloads beyond the company ID) — this module
//! is built directly from spec.md §4.4's sub-type table, in the style of
//! the AD parser it sits beside.

/// Continuity sub-type byte -> documented name (spec §4.4).
const CONTINUITY_TYPES: &[(u8, &str)] = &[
    (0x02, "iBeacon"),
    (0x05, "AirDrop"),
    (0x07, "AirPods"),
    (0x0C, "Handoff"),
    (0x0F, "NearbyAction"),
    (0x10, "NearbyInfo"),
    (0x12, "FindMy"),
];

fn continuity_type_name(sub_type: u8) -> String {
    CONTINUITY_TYPES
        .iter()
        .find(|(t, _)| *t == sub_type)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("Unknown-0x{:02x}", sub_type))
}

/// Fields extracted from an Apple Continuity vendor payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContinuityFields {
    pub continuity_type: String,
    pub ibeacon_uuid: Option<String>,
    pub ibeacon_major: Option<u16>,
    pub ibeacon_minor: Option<u16>,
    pub tx_power: Option<i8>,
    pub activity_level: Option<u8>,
    pub nearby_action: Option<String>,
    /// Set to `"Apple Find My"` when the sub-type is FindMy.
    pub tracker_type: Option<&'static str>,
}

/// Parse `subType(1) ‖ subLength(1) ‖ data` vendor payload (spec §4.4).
/// Returns `None` if the payload is too short to carry a sub-type/length.
pub fn parse(vendor_payload: &[u8]) -> Option<ContinuityFields> {
    if vendor_payload.len() < 2 {
        return None;
    }
    let sub_type = vendor_payload[0];
    let sub_length = vendor_payload[1] as usize;
    let available = &vendor_payload[2..];
    let data = if available.len() >= sub_length {
        &available[..sub_length]
    } else {
        available
    };

    let mut fields = ContinuityFields {
        continuity_type: continuity_type_name(sub_type),
        ..ContinuityFields::default()
    };

    match sub_type {
        0x02 if data.len() >= 20 => {
            fields.ibeacon_uuid = Some(format_uuid(&data[0..16]));
            fields.ibeacon_major = Some(u16::from_be_bytes([data[16], data[17]]));
            fields.ibeacon_minor = Some(u16::from_be_bytes([data[18], data[19]]));
            if data.len() > 20 {
                fields.tx_power = Some(data[20] as i8);
            }
        }
        0x10 if !data.is_empty() => {
            fields.activity_level = Some((data[0] >> 4) & 0x0F);
        }
        0x0F if !data.is_empty() => {
            fields.nearby_action = Some(format!("0x{:02x}", data[0]));
        }
        0x12 => {
            fields.tracker_type = Some("Apple Find My");
        }
        _ => {}
    }

    Some(fields)
}

/// Canonical 8-4-4-4-12 dashed lowercase UUID rendering.
fn format_uuid(bytes: &[u8]) -> String {
    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        bytes[6], bytes[7],
        bytes[8], bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s4_ibeacon_decodes_uuid_major_minor_txpower() {
        // S4: 02 15 <16 bytes UUID> 00 01 00 02 C5
        let uuid = [
            0xE2, 0x0A, 0x39, 0xF4, 0x73, 0xF5, 0x4B, 0xC4, 0xA1, 0x2F, 0x17, 0xD1, 0xAD, 0x07,
            0xA9, 0x61,
        ];
        let mut payload = vec![0x02, 0x15];
        payload.extend_from_slice(&uuid);
        payload.extend_from_slice(&[0x00, 0x01, 0x00, 0x02, 0xC5]);

        let fields = parse(&payload).unwrap();
        assert_eq!(fields.continuity_type, "iBeacon");
        assert_eq!(fields.ibeacon_major, Some(1));
        assert_eq!(fields.ibeacon_minor, Some(2));
        assert_eq!(fields.tx_power, Some(-59));
        assert_eq!(
            fields.ibeacon_uuid.as_deref(),
            Some("e20a39f4-73f5-4bc4-a12f-17d1ad07a961")
        );
    }

    #[test]
    fn nearby_info_extracts_activity_level() {
        let payload = [0x10, 0x01, 0x53];
        let fields = parse(&payload).unwrap();
        assert_eq!(fields.activity_level, Some((0x53 >> 4) & 0x0F));
    }

    #[test]
    fn nearby_action_formats_hex_byte() {
        let payload = [0x0F, 0x01, 0x07];
        let fields = parse(&payload).unwrap();
        assert_eq!(fields.nearby_action.as_deref(), Some("0x07"));
    }

    #[test]
    fn findmy_sets_tracker_type() {
        let payload = [0x12, 0x00];
        let fields = parse(&payload).unwrap();
        assert_eq!(fields.continuity_type, "FindMy");
        assert_eq!(fields.tracker_type, Some("Apple Find My"));
    }

    #[test]
    fn unknown_subtype_formats_as_placeholder() {
        let payload = [0x42, 0x00];
        let fields = parse(&payload).unwrap();
        assert_eq!(fields.continuity_type, "Unknown-0x42");
    }

    #[test]
    fn too_short_payload_returns_none() {
        assert!(parse(&[0x02]).is_none());
    }
}
