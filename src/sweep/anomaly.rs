//! Anomaly detector (spec §4.9): per-bin consecutive-streak hysteresis,
//! emitting at most one `spectrum-anomaly` observation per streak.
//!
//! Ported from `original_source/scripts/processors/sweep_processor.py`'s
//! `SweepProcessor._check_anomaly`. Per spec §9's "streak reset polarity"
//! design note, the streak only resets when sigma returns within
//! threshold — not on a polarity flip, so a bin oscillating between
//! large positive and negative deviations keeps accumulating streak.

use std::collections::HashMap;

use serde_json::Map;

use crate::observation::{compute_signature, now_iso, round1, Observation, Protocol};

use super::bands::freq_to_band_name;

/// Per-bin hysteresis state: consecutive-anomaly streak counter and
/// whether an observation has already been emitted for the current
/// streak (spec §3).
#[derive(Debug, Default)]
pub struct AnomalyDetector {
    streaks: HashMap<i64, u32>,
    emitted: HashMap<i64, bool>,
}

impl AnomalyDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate one bin reading against its `sigma` deviation. Returns
    /// `Some(Observation)` exactly on the `min_streak`-th consecutive hit
    /// for this streak; `None` otherwise, including every hit after the
    /// first emission for the streak (spec §4.9, §8).
    pub fn check(
        &mut self,
        freq_hz: i64,
        power_db: f64,
        baseline_db: f64,
        sigma: f64,
        anomaly_sigma_threshold: f64,
        min_streak: u32,
    ) -> Option<Observation> {
        if sigma > anomaly_sigma_threshold {
            let streak = self.streaks.entry(freq_hz).or_insert(0);
            *streak += 1;
            let streak = *streak;

            let already_emitted = *self.emitted.get(&freq_hz).unwrap_or(&false);
            if streak >= min_streak && !already_emitted {
                self.emitted.insert(freq_hz, true);
                return Some(build_observation(freq_hz, power_db, baseline_db, sigma));
            }
            None
        } else {
            self.streaks.remove(&freq_hz);
            self.emitted.remove(&freq_hz);
            None
        }
    }
}

fn build_observation(freq_hz: i64, power_db: f64, baseline_db: f64, sigma: f64) -> Observation {
    let band = freq_to_band_name(freq_hz);
    let anomaly_type = if power_db > baseline_db {
        "power-spike"
    } else {
        "power-drop"
    };

    let mut fields = Map::new();
    fields.insert("band".into(), band.clone().into());
    fields.insert("binWidthHz".into(), 1_000_000.into());
    fields.insert("measuredPower".into(), round1(power_db).into());
    fields.insert("baselinePower".into(), round1(baseline_db).into());
    fields.insert("deviationSigma".into(), round1(sigma).into());
    fields.insert("anomalyType".into(), anomaly_type.into());

    let signature = compute_signature(
        Protocol::SpectrumAnomaly,
        &format!("band={}&type={}", band, anomaly_type),
    );

    Observation {
        observed_at: now_iso(),
        protocol: Protocol::SpectrumAnomaly.as_str(),
        frequency_hz: freq_hz,
        rssi: round1(power_db),
        noise: round1(baseline_db),
        snr: None,
        modulation: None,
        signature,
        fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s5_emits_only_on_min_streak_th_hit() {
        let mut detector = AnomalyDetector::new();
        // First anomalous hit: streak 1, min_streak=2 -> no emit.
        assert!(detector
            .check(915_000_000, 20.0, 10.0, 31.6, 3.0, 2)
            .is_none());
        // Second consecutive hit: streak 2 -> emits.
        let obs = detector
            .check(915_000_000, 20.0, 10.0, 31.6, 3.0, 2)
            .expect("should emit on second consecutive hit");
        assert_eq!(obs.protocol, "spectrum-anomaly");
        assert_eq!(obs.fields.get("anomalyType").unwrap(), "power-spike");
    }

    #[test]
    fn does_not_reemit_for_same_streak() {
        let mut detector = AnomalyDetector::new();
        detector.check(915_000_000, 20.0, 10.0, 31.6, 3.0, 2);
        detector.check(915_000_000, 20.0, 10.0, 31.6, 3.0, 2);
        // Third consecutive hit, same streak: already emitted.
        assert!(detector
            .check(915_000_000, 20.0, 10.0, 31.6, 3.0, 2)
            .is_none());
    }

    #[test]
    fn streak_keeps_accumulating_across_a_polarity_flip() {
        // Caller always passes the magnitude of sigma (deviation_sigma's
        // sign only matters for anomalyType at emit time), so a bin that
        // swings from spike to drop and back still counts as one streak.
        let mut detector = AnomalyDetector::new();
        detector.check(915_000_000, 20.0, 10.0, 31.6, 3.0, 3); // spike, streak 1
        detector.check(915_000_000, 0.0, 10.0, 31.6, 3.0, 3); // drop, streak 2
        let obs = detector.check(915_000_000, 20.0, 10.0, 31.6, 3.0, 3); // spike, streak 3
        assert!(obs.is_some());
    }

    #[test]
    fn streak_clears_when_sigma_returns_within_threshold() {
        let mut detector = AnomalyDetector::new();
        detector.check(915_000_000, 20.0, 10.0, 31.6, 3.0, 2);
        // Returns within threshold: streak and emitted flag clear.
        assert!(detector.check(915_000_000, 11.0, 10.0, 1.0, 3.0, 2).is_none());
        // New anomalous reading starts a fresh streak (streak 1, no emit yet).
        assert!(detector
            .check(915_000_000, 20.0, 10.0, 31.6, 3.0, 2)
            .is_none());
    }

    #[test]
    fn anomaly_type_is_power_drop_below_baseline() {
        let mut detector = AnomalyDetector::new();
        let obs = detector
            .check(915_000_000, -40.0, -10.0, 31.6, 3.0, 1)
            .expect("min_streak=1 emits on first hit");
        assert_eq!(obs.fields.get("anomalyType").unwrap(), "power-drop");
    }
}
