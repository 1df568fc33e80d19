//! Advertising-data (AD) TLV parser (spec §4.4).
//!
//! Ported from `original_source/scripts/processors/ble_processor.py`'s
//! `parse_ad_structures`, extended with the 16-bit UUID list and the
//! manufacturer-data raw payload needed by the Apple Continuity
//! sub-parser (per the "Open Question" in spec §9, this pass keeps the
//! raw manufacturer bytes around instead of re-scanning for them later).

use super::defaults::company_name;

/// AD structure type bytes this parser recognizes (spec §4.4 table).
mod ad_type {
    pub const FLAGS: u8 = 0x01;
    pub const UUID16_INCOMPLETE: u8 = 0x02;
    pub const UUID16_COMPLETE: u8 = 0x03;
    pub const LOCAL_NAME_SHORT: u8 = 0x08;
    pub const LOCAL_NAME_COMPLETE: u8 = 0x09;
    pub const TX_POWER: u8 = 0x0A;
    pub const MANUFACTURER_DATA: u8 = 0xFF;
}

/// Fields extracted from one advertising payload's AD structures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdFields {
    pub flags: Option<u8>,
    pub device_name: Option<String>,
    pub tx_power: Option<i8>,
    pub service_uuids: Vec<String>,
    pub manufacturer_id: Option<String>,
    pub manufacturer_name: Option<&'static str>,
    /// The manufacturer-specific payload after the 2-byte company ID,
    /// forwarded to vendor sub-parsers (spec §4.4).
    pub manufacturer_raw: Option<Vec<u8>>,
}

/// Walk the `length‖type‖data` AD structures in `payload` (the bytes of
/// an advertising PDU after the 6-byte advertiser address). Stops on a
/// zero-length record or one that would overrun the buffer.
pub fn parse(payload: &[u8]) -> AdFields {
    let mut fields = AdFields::default();
    let mut i = 0usize;

    while i < payload.len() {
        if i + 1 >= payload.len() {
            break;
        }
        let length = payload[i] as usize;
        if length == 0 || i + 1 + length > payload.len() {
            break;
        }
        let kind = payload[i + 1];
        let data = &payload[i + 2..i + 1 + length];

        match kind {
            ad_type::FLAGS if !data.is_empty() => {
                fields.flags = Some(data[0]);
            }
            ad_type::UUID16_INCOMPLETE | ad_type::UUID16_COMPLETE if data.len() >= 2 => {
                let mut uuids = Vec::new();
                let mut j = 0;
                while j + 1 < data.len() {
                    let uuid16 = u16::from_le_bytes([data[j], data[j + 1]]);
                    uuids.push(format!("{:04x}", uuid16));
                    j += 2;
                }
                fields.service_uuids = uuids;
            }
            ad_type::LOCAL_NAME_SHORT | ad_type::LOCAL_NAME_COMPLETE => {
                fields.device_name = Some(String::from_utf8_lossy(data).into_owned());
            }
            ad_type::TX_POWER if !data.is_empty() => {
                fields.tx_power = Some(data[0] as i8);
            }
            ad_type::MANUFACTURER_DATA if data.len() >= 2 => {
                let id_hex = format!("{:04x}", u16::from_le_bytes([data[0], data[1]]));
                fields.manufacturer_name = Some(company_name(&id_hex));
                fields.manufacturer_id = Some(id_hex);
                fields.manufacturer_raw = Some(data[2..].to_vec());
            }
            _ => {}
        }

        i += 1 + length;
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s3_parses_flags_uuid_and_name() {
        // S3: 02 01 06 03 03 E0 FE 07 09 54 65 73 74 65 72
        let payload = [
            0x02, 0x01, 0x06, // flags = 6
            0x03, 0x03, 0xE0, 0xFE, // complete 16-bit UUID list: fee0
            0x07, 0x09, b'T', b'e', b's', b't', b'e', b'r', // complete local name "Tester"
        ];
        let fields = parse(&payload);
        assert_eq!(fields.flags, Some(6));
        assert_eq!(fields.service_uuids, vec!["fee0".to_string()]);
        assert_eq!(fields.device_name.as_deref(), Some("Tester"));
    }

    #[test]
    fn stops_on_zero_length_record() {
        let payload = [0x00, 0xFF, 0xFF];
        let fields = parse(&payload);
        assert_eq!(fields, AdFields::default());
    }

    #[test]
    fn stops_on_overrunning_length() {
        let payload = [0x05, 0x01, 0x06];
        let fields = parse(&payload);
        assert_eq!(fields.flags, None);
    }

    #[test]
    fn manufacturer_data_extracts_id_name_and_raw() {
        let payload = [0x06, 0xFF, 0x4C, 0x00, 0x02, 0x15, 0xAB];
        let fields = parse(&payload);
        assert_eq!(fields.manufacturer_id.as_deref(), Some("004c"));
        assert_eq!(fields.manufacturer_name, Some("Apple"));
        assert_eq!(fields.manufacturer_raw, Some(vec![0x02, 0x15, 0xAB]));
    }

    #[test]
    fn tx_power_decodes_as_signed_byte() {
        let payload = [0x02, 0x0A, 0xEC]; // -20 as i8
        let fields = parse(&payload);
        assert_eq!(fields.tx_power, Some(-20));
    }
}
