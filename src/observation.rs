//! The NDJSON observation record shared by both pipelines, and the
//! `rf-telemetry-v1` signature construction convention.

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// One of the four observation protocols this crate emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    BleEnergy,
    BleAdv,
    SpectrumAnomaly,
    SpectrumBaseline,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::BleEnergy => "ble-energy",
            Protocol::BleAdv => "ble-adv",
            Protocol::SpectrumAnomaly => "spectrum-anomaly",
            Protocol::SpectrumBaseline => "spectrum-baseline",
        }
    }
}

/// `hex(SHA-256("rf-telemetry-v1:" + protocol + ":" + keyParts))`
///
/// `keyParts` is the protocol-specific key string documented in spec §6 —
/// e.g. `channel=37` for `ble-energy`, `macHash=...&advType=...` for `ble-adv`.
pub fn compute_signature(protocol: Protocol, key_parts: &str) -> String {
    let input = format!("rf-telemetry-v1:{}:{}", protocol.as_str(), key_parts);
    let digest = Sha256::digest(input.as_bytes());
    hex_encode(&digest)
}

/// Lowercase hex encoding, used for signatures, macHash, and fingerprintId.
pub fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        write!(s, "{:02x}", b).expect("writing to a String never fails");
    }
    s
}

/// RFC3339 UTC timestamp, second resolution, trailing `Z` — `observedAt`.
pub fn now_iso() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Round a float to one decimal place, matching the Python reference's
/// `round(x, 1)` for all dB-valued fields.
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Round a float to two decimal places (used for `stdPower` and noise
/// baseline stats).
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// The NDJSON observation record (spec §6).
#[derive(Debug, Clone, Serialize)]
pub struct Observation {
    #[serde(rename = "observedAt")]
    pub observed_at: String,
    pub protocol: &'static str,
    #[serde(rename = "frequencyHz")]
    pub frequency_hz: i64,
    pub rssi: f64,
    pub noise: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modulation: Option<&'static str>,
    pub signature: String,
    pub fields: Map<String, Value>,
}

impl Observation {
    /// Serialize to a single NDJSON line (no trailing newline).
    pub fn to_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_matches_documented_construction() {
        let sig = compute_signature(Protocol::BleEnergy, "channel=37");
        let expected = {
            let input = "rf-telemetry-v1:ble-energy:channel=37";
            hex_encode(&Sha256::digest(input.as_bytes()))
        };
        assert_eq!(sig, expected);
        assert_eq!(sig.len(), 64);
    }

    #[test]
    fn signature_varies_with_key_parts() {
        let a = compute_signature(Protocol::BleAdv, "macHash=aaaa&advType=ADV_IND");
        let b = compute_signature(Protocol::BleAdv, "macHash=bbbb&advType=ADV_IND");
        assert_ne!(a, b);
    }

    #[test]
    fn round1_matches_python_round_half_even_approx() {
        assert_eq!(round1(-12.34), -12.3);
        assert_eq!(round1(-12.36), -12.4);
        assert_eq!(round1(0.0), 0.0);
    }

    #[test]
    fn observation_serializes_without_snr_when_none() {
        let obs = Observation {
            observed_at: "2026-01-01T00:00:00Z".to_string(),
            protocol: Protocol::SpectrumAnomaly.as_str(),
            frequency_hz: 915_000_000,
            rssi: -10.0,
            noise: -40.0,
            snr: None,
            modulation: None,
            signature: "deadbeef".to_string(),
            fields: Map::new(),
        };
        let line = obs.to_line().unwrap();
        assert!(!line.contains("\"snr\""));
        assert!(!line.contains("\"modulation\""));
    }
}
