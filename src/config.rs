//! Process configuration, loaded once from environment variables at startup.
//!
//! Each binary constructs exactly one config record in `main()` and threads
//! it into the processor instance — there is no process-wide mutable
//! configuration state to keep in sync.

use std::env;

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Configuration for the BLE advertising observer.
#[derive(Debug, Clone)]
pub struct BleConfig {
    /// HackRF device serial; empty means auto-detect.
    pub hackrf_serial: String,
    /// LNA gain in dB, 0..40.
    pub lna_gain: u32,
    /// VGA gain in dB, 0..62.
    pub vga_gain: u32,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Dwell time per channel in milliseconds.
    pub channel_dwell_ms: u64,
    /// Per-signature suppression window in seconds.
    pub dedup_seconds: u64,
}

impl BleConfig {
    /// Number of raw I/Q samples captured per dwell.
    pub fn samples_per_dwell(&self) -> usize {
        (self.sample_rate as u64 * self.channel_dwell_ms / 1000) as usize
    }

    pub fn from_env() -> Self {
        Self {
            hackrf_serial: env::var("HACKRF_SERIAL").unwrap_or_default(),
            lna_gain: env_or("HACKRF_LNA_GAIN", 32),
            vga_gain: env_or("HACKRF_VGA_GAIN", 40),
            sample_rate: env_or("BLE_SAMPLE_RATE", 4_000_000),
            channel_dwell_ms: env_or("BLE_CHANNEL_DWELL_MS", 200),
            dedup_seconds: env_or("BLE_DEDUP_SECONDS", 10),
        }
    }
}

impl Default for BleConfig {
    fn default() -> Self {
        Self {
            hackrf_serial: String::new(),
            lna_gain: 32,
            vga_gain: 40,
            sample_rate: 4_000_000,
            channel_dwell_ms: 200,
            dedup_seconds: 10,
        }
    }
}

/// Configuration for the wideband spectrum anomaly detector.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Learning-phase duration, in wall-clock seconds, before bins are
    /// promoted from Welford learning to EMA tracking.
    pub baseline_seconds: u64,
    /// Sigma threshold above which a bin reading is considered anomalous.
    pub anomaly_sigma: f64,
    /// Emit a baseline summary every N sweep cycles (while tracking).
    pub emit_interval: u32,
    /// Consecutive anomalous readings required before emitting.
    pub min_streak: u32,
}

impl SweepConfig {
    pub fn from_env() -> Self {
        Self {
            baseline_seconds: env_or("SWEEP_BASELINE_SECONDS", 300),
            anomaly_sigma: env_or("SWEEP_ANOMALY_SIGMA", 3.0),
            emit_interval: env_or("SWEEP_EMIT_INTERVAL", 10),
            min_streak: env_or("SWEEP_MIN_STREAK", 2),
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            baseline_seconds: 300,
            anomaly_sigma: 3.0,
            emit_interval: 10,
            min_streak: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ble_config_defaults_match_spec() {
        let cfg = BleConfig::default();
        assert_eq!(cfg.lna_gain, 32);
        assert_eq!(cfg.vga_gain, 40);
        assert_eq!(cfg.sample_rate, 4_000_000);
        assert_eq!(cfg.channel_dwell_ms, 200);
        assert_eq!(cfg.dedup_seconds, 10);
        assert_eq!(cfg.samples_per_dwell(), 800_000);
    }

    #[test]
    fn sweep_config_defaults_match_spec() {
        let cfg = SweepConfig::default();
        assert_eq!(cfg.baseline_seconds, 300);
        assert_eq!(cfg.anomaly_sigma, 3.0);
        assert_eq!(cfg.emit_interval, 10);
        assert_eq!(cfg.min_streak, 2);
    }
}
