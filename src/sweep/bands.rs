//! Named-band table and baseline summarizer (spec §4.10).
//!
//! Ported from `original_source/scripts/processors/sweep_processor.py`'s
//! `NAMED_BANDS` / `freq_to_band_name` and `_emit_baseline_summary`.

use std::collections::HashMap;

use serde_json::Map;

use crate::observation::{compute_signature, now_iso, round1, round2, Observation, Protocol};

use super::stats::{BinStats, MIN_LEARNING_SAMPLES};

/// Named frequency bands, as `(name, low Hz, high Hz)` (spec §4.10).
pub const NAMED_BANDS: &[(&str, f64, f64)] = &[
    ("ISM 315M", 300e6, 330e6),
    ("ISM 433M", 420e6, 450e6),
    ("ISM 868M", 863e6, 870e6),
    ("ISM 915M", 902e6, 928e6),
    ("GPS L1", 1565e6, 1585e6),
    ("WiFi 2.4G", 2400e6, 2500e6),
    ("ISM 5.8G", 5725e6, 5875e6),
];

/// Map a frequency to a named band, or a generic `"<mhz>M"`/`"<g.g>G"`
/// label (spec §4.10).
pub fn freq_to_band_name(freq_hz: i64) -> String {
    let freq = freq_hz as f64;
    for (name, lo, hi) in NAMED_BANDS {
        if freq >= *lo && freq <= *hi {
            return name.to_string();
        }
    }
    let mhz = (freq / 1e6).round();
    if mhz >= 1000.0 {
        format!("{:.1}G", mhz / 1000.0)
    } else {
        format!("{}M", mhz as i64)
    }
}

/// A new sweep cycle is detected when `hz_low < 10 MHz` (spec §4.10).
pub fn is_new_sweep_cycle(hz_low: f64) -> bool {
    hz_low < 10e6
}

/// Emit per-band baseline summaries for every band with at least one
/// promoted bin (spec §4.10). `bins` is the processor's full bin table;
/// only bins with `count >= MIN_LEARNING_SAMPLES` contribute.
pub fn summarize(bins: &HashMap<i64, BinStats>) -> Vec<Observation> {
    let mut band_power: HashMap<String, Vec<f64>> = HashMap::new();

    for (freq_hz, stats) in bins {
        if stats.count() < MIN_LEARNING_SAMPLES {
            continue;
        }
        let band = freq_to_band_name(*freq_hz);
        band_power.entry(band).or_default().push(stats.current_mean());
    }

    // Deterministic iteration order: named bands first (table order),
    // then generic bands sorted lexicographically.
    let mut ordered_bands: Vec<String> = NAMED_BANDS
        .iter()
        .map(|(name, _, _)| name.to_string())
        .filter(|name| band_power.contains_key(name))
        .collect();
    let mut generic: Vec<String> = band_power
        .keys()
        .filter(|name| !NAMED_BANDS.iter().any(|(n, _, _)| n == name.as_str()))
        .cloned()
        .collect();
    generic.sort();
    ordered_bands.extend(generic);

    ordered_bands
        .into_iter()
        .filter_map(|band| {
            let powers = band_power.get(&band)?;
            Some(build_summary(&band, powers))
        })
        .collect()
}

fn band_representative_freq(band: &str) -> i64 {
    NAMED_BANDS
        .iter()
        .find(|(name, _, _)| *name == band)
        .map(|(_, lo, hi)| ((lo + hi) / 2.0) as i64)
        .unwrap_or(0)
}

fn build_summary(band: &str, powers: &[f64]) -> Observation {
    let mean = powers.iter().sum::<f64>() / powers.len() as f64;
    let min = powers.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = powers.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let variance = powers.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / powers.len() as f64;
    let std = variance.sqrt();

    let mut fields = Map::new();
    fields.insert("band".into(), band.into());
    fields.insert("meanPower".into(), round1(mean).into());
    fields.insert("minPower".into(), round1(min).into());
    fields.insert("maxPower".into(), round1(max).into());
    fields.insert("stdPower".into(), round2(std).into());
    fields.insert("binCount".into(), powers.len().into());

    let signature = compute_signature(Protocol::SpectrumBaseline, &format!("band={}", band));

    Observation {
        observed_at: now_iso(),
        protocol: Protocol::SpectrumBaseline.as_str(),
        frequency_hz: band_representative_freq(band),
        rssi: round1(mean),
        noise: round1(min),
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
    fn known_band_maps_by_name() {
        assert_eq!(freq_to_band_name(915_000_000), "ISM 915M");
        assert_eq!(freq_to_band_name(2_450_000_000), "WiFi 2.4G");
    }

    #[test]
    fn unmatched_frequency_formats_generically() {
        assert_eq!(freq_to_band_name(146_000_000), "146M"); // 2m ham band
        assert_eq!(freq_to_band_name(10_400_000_000), "10.4G");
    }

    #[test]
    fn new_sweep_cycle_detected_on_low_hz_low() {
        assert!(is_new_sweep_cycle(5e6));
        assert!(!is_new_sweep_cycle(2.4e9));
    }

    #[test]
    fn summarize_skips_bins_below_min_samples() {
        let mut bins = HashMap::new();
        let mut promoted = BinStats::new();
        for _ in 0..5 {
            promoted.update(-70.0);
        }
        promoted.finalize_learning();
        bins.insert(915_000_000i64, promoted);

        let mut too_few = BinStats::new();
        too_few.update(-70.0);
        bins.insert(916_000_000i64, too_few);

        let summaries = summarize(&bins);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].fields.get("band").unwrap(), "ISM 915M");
        assert_eq!(summaries[0].fields.get("binCount").unwrap(), 1);
    }
}
