//! Energy analyzer (spec §4.2): per-dwell power statistics, burst
//! counting, and a per-channel online noise baseline.

use std::collections::HashMap;

use num_complex::Complex32;
use serde_json::Map;

use crate::observation::{compute_signature, now_iso, round1, round2, Observation, Protocol};

/// Floor added before `log10` to avoid taking the log of zero.
const EPSILON: f64 = 1e-12;

/// Per-dwell power statistics derived from a complex sample buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyStats {
    pub rssi: f64,
    pub noise: f64,
    pub snr: f64,
    pub burst_count: u32,
}

/// Elementwise power, peak/mean dB conversion, and rising-edge burst count
/// (spec §4.2).
pub fn analyze(samples: &[Complex32]) -> EnergyStats {
    let power: Vec<f64> = samples.iter().map(|x| (x.norm_sqr()) as f64).collect();

    let mean_power = if power.is_empty() {
        0.0
    } else {
        power.iter().sum::<f64>() / power.len() as f64
    };
    let peak_power = power.iter().cloned().fold(0.0_f64, f64::max);

    let rssi = 10.0 * (peak_power + EPSILON).log10();
    let noise = 10.0 * (mean_power + EPSILON).log10();
    let snr = (rssi - noise).max(0.0);

    let threshold = mean_power * 2.0;
    let mut burst_count = 0u32;
    let mut prev_above = power.first().is_some_and(|&p| p > threshold);
    for &p in power.iter().skip(1) {
        let above = p > threshold;
        if above && !prev_above {
            burst_count += 1;
        }
        prev_above = above;
    }

    EnergyStats {
        rssi,
        noise,
        snr,
        burst_count,
    }
}

/// Welford running mean/variance of the per-dwell noise reading for one
/// channel (spec §3 "Per-channel noise statistics", §4.2).
#[derive(Debug, Clone, Copy, Default)]
struct NoiseBaseline {
    count: u64,
    mean: f64,
    m2: f64,
}

impl NoiseBaseline {
    /// Update with a new noise (dB) reading and return `(baseline, stddev,
    /// deviation)`, each rounded to two decimals per spec.
    fn update(&mut self, noise_db: f64) -> (f64, f64, f64) {
        self.count += 1;
        let delta = noise_db - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = noise_db - self.mean;
        self.m2 += delta * delta2;

        let stddev = if self.count > 1 {
            (self.m2 / self.count as f64).sqrt()
        } else {
            0.0
        };
        let deviation = if stddev > 0.0 {
            (noise_db - self.mean) / stddev
        } else {
            0.0
        };
        (round2(self.mean), round2(stddev), round2(deviation))
    }
}

/// Energy analyzer state: one noise baseline per BLE advertising channel.
#[derive(Debug, Default)]
pub struct EnergyAnalyzer {
    baselines: HashMap<u8, NoiseBaseline>,
}

impl EnergyAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyze one dwell's samples and build the `ble-energy` observation
    /// (spec §4.2, §6).
    pub fn process(
        &mut self,
        channel: u8,
        freq_hz: u64,
        samples: &[Complex32],
        dwell_ms: u64,
    ) -> Observation {
        let stats = analyze(samples);
        let baseline = self.baselines.entry(channel).or_default();
        let (noise_baseline, noise_stddev, noise_deviation) = baseline.update(stats.noise);

        let mut fields = Map::new();
        fields.insert("channel".into(), channel.into());
        fields.insert("peakPower".into(), round1(stats.rssi).into());
        fields.insert("burstCount".into(), stats.burst_count.into());
        fields.insert("dwellMs".into(), dwell_ms.into());
        fields.insert("noiseBaseline".into(), noise_baseline.into());
        fields.insert("noiseStddev".into(), noise_stddev.into());
        fields.insert("noiseDeviation".into(), noise_deviation.into());

        let signature = compute_signature(Protocol::BleEnergy, &format!("channel={}", channel));

        Observation {
            observed_at: now_iso(),
            protocol: Protocol::BleEnergy.as_str(),
            frequency_hz: freq_hz as i64,
            rssi: round1(stats.rssi),
            noise: round1(stats.noise),
            snr: Some(round1(stats.snr)),
            modulation: Some("GFSK"),
            signature,
            fields,
        }
    }
}
