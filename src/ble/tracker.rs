//! Bluetooth tracker classifier (spec §4.4): derives a `trackerType` from
//! manufacturer ID, Apple Continuity sub-type, and advertised service
//! UUIDs. Independent of the AD parser and continuity sub-parser so it
//! can be unit tested against bare inputs.

/// Classify a device as a known tracker product, or `None` if it matches
/// none of the documented signatures.
pub fn classify(
    manufacturer_id: Option<&str>,
    continuity_type: Option<&str>,
    service_uuids: &[String],
) -> Option<&'static str> {
    if manufacturer_id == Some("004c") && continuity_type == Some("FindMy") {
        return Some("Apple Find My");
    }
    if manufacturer_id == Some("0157") || service_uuids.iter().any(|u| u == "fe26") {
        return Some("Tile");
    }
    if manufacturer_id == Some("0075")
        && service_uuids.iter().any(|u| u == "fd5a" || u == "fef5")
    {
        return Some("Samsung SmartTag");
    }
    if manufacturer_id == Some("02e5") {
        return Some("Chipolo");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_apple_find_my() {
        assert_eq!(
            classify(Some("004c"), Some("FindMy"), &[]),
            Some("Apple Find My")
        );
    }

    #[test]
    fn apple_manufacturer_without_findmy_is_not_a_tracker() {
        assert_eq!(classify(Some("004c"), Some("iBeacon"), &[]), None);
    }

    #[test]
    fn classifies_tile_by_manufacturer_or_service_uuid() {
        assert_eq!(classify(Some("0157"), None, &[]), Some("Tile"));
        assert_eq!(
            classify(None, None, &["fe26".to_string()]),
            Some("Tile")
        );
    }

    #[test]
    fn classifies_samsung_smarttag_requires_both_signals() {
        assert_eq!(classify(Some("0075"), None, &[]), None);
        assert_eq!(
            classify(Some("0075"), None, &["fd5a".to_string()]),
            Some("Samsung SmartTag")
        );
        assert_eq!(
            classify(Some("0075"), None, &["fef5".to_string()]),
            Some("Samsung SmartTag")
        );
    }

    #[test]
    fn classifies_chipolo() {
        assert_eq!(classify(Some("02e5"), None, &[]), Some("Chipolo"));
    }

    #[test]
    fn unrecognized_device_has_no_tracker_type() {
        assert_eq!(classify(Some("0006"), None, &[]), None);
    }
}
