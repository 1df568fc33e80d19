//! Channel scheduler and observation emitter (spec §4.5, §4.6): round-robins
//! the three BLE advertising channels, running the energy analyzer and PDU
//! recognizer on each dwell and writing NDJSON observations to stdout.
//!
//! Modeled on `original_source/scripts/processors/ble_processor.py`'s
//! `BleProcessor.run` loop — same hop/compaction/progress cadence,
//! reworked into a struct with `tracing` diagnostics instead of a
//! `[ble_processor]`-prefixed stderr print.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::BleConfig;
use crate::observation::Observation;

use super::dedup::Dedup;
use super::defaults::BLE_CHANNELS;
use super::energy::EnergyAnalyzer;
use super::{frontend, pdu};

/// Compact the dedup table every 30 channel hops (spec §4.5).
const COMPACT_EVERY_HOPS: u64 = 30;
/// Emit a diagnostic progress line every 100 channel hops (spec §4.6).
const PROGRESS_EVERY_HOPS: u64 = 100;
/// Backoff after a dwell that yields no data (spec §4.6).
const NO_DATA_BACKOFF: Duration = Duration::from_millis(100);

/// BLE advertising observer: owns all per-process pipeline state
/// (noise baselines, dedup table, hop/emission counters).
pub struct Observer {
    config: BleConfig,
    energy: EnergyAnalyzer,
    dedup: Dedup,
    hop_count: u64,
    energy_count: u64,
    adv_count: u64,
}

impl Observer {
    pub fn new(config: BleConfig) -> Self {
        let dedup = Dedup::new(config.dedup_seconds);
        Self {
            config,
            energy: EnergyAnalyzer::new(),
            dedup,
            hop_count: 0,
            energy_count: 0,
            adv_count: 0,
        }
    }

    /// Run the channel-hopping loop until `running` is cleared (spec §5:
    /// interruption drains in-flight work and prints a final diagnostic
    /// summary; no observation is partially written).
    pub fn run(&mut self, running: &AtomicBool) {
        info!(
            sample_rate = self.config.sample_rate,
            dwell_ms = self.config.channel_dwell_ms,
            dedup_seconds = self.config.dedup_seconds,
            "starting BLE observer"
        );

        while running.load(Ordering::Relaxed) {
            for &(channel, freq_hz) in BLE_CHANNELS {
                if !running.load(Ordering::Relaxed) {
                    break;
                }
                self.run_dwell(channel, freq_hz);
                self.hop_count += 1;
            }

            if self.hop_count > 0 && self.hop_count % COMPACT_EVERY_HOPS == 0 {
                self.dedup.compact();
            }
            if self.hop_count > 0 && self.hop_count % PROGRESS_EVERY_HOPS == 0 {
                info!(
                    hops = self.hop_count,
                    energy = self.energy_count,
                    adv = self.adv_count,
                    "progress"
                );
            }
        }

        info!(
            hops = self.hop_count,
            energy = self.energy_count,
            adv = self.adv_count,
            "stopped"
        );
    }

    fn run_dwell(&mut self, channel: u8, freq_hz: u64) {
        let samples = match frontend::capture_channel(channel, freq_hz, &self.config) {
            Some(samples) => samples,
            None => {
                warn!(channel, freq_hz, "no data from channel");
                thread::sleep(NO_DATA_BACKOFF);
                return;
            }
        };

        let energy_obs = self
            .energy
            .process(channel, freq_hz, &samples, self.config.channel_dwell_ms);
        emit(&energy_obs);
        self.energy_count += 1;

        let candidates = pdu::recognize(&samples, channel, freq_hz, self.config.sample_rate);
        for obs in candidates {
            if self.dedup.should_emit(&obs.signature) {
                emit(&obs);
                self.adv_count += 1;
            }
        }
    }
}

/// Write one NDJSON observation line to stdout, flushed immediately
/// (spec §5: "one observation per line, flushed immediately").
fn emit(obs: &Observation) {
    let line = match obs.to_line() {
        Ok(line) => line,
        Err(e) => {
            warn!(error = %e, "failed to serialize observation");
            return;
        }
    };
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    let _ = writeln!(lock, "{}", line);
    let _ = lock.flush();
}
