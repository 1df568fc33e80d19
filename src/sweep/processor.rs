//! Wideband sweep processor (spec §4.7–§4.10): drives one CSV line
//! through parsing, the learning/tracking state machine, anomaly
//! detection, and periodic band summarization.
//!
//! Ported from `original_source/scripts/processors/sweep_processor.py`'s
//! `SweepProcessor`, reworked into a struct with no process-wide mutable
//! configuration (spec §9 design note).

use std::collections::HashMap;
use std::time::Instant;

use tracing::info;

use crate::config::SweepConfig;
use crate::observation::Observation;

use super::anomaly::AnomalyDetector;
use super::bands::{is_new_sweep_cycle, summarize};
use super::csv;
use super::stats::{BinStats, MIN_LEARNING_SAMPLES};

/// Processor state: the bin table, hysteresis state, and the
/// learning/tracking state machine (spec §3, §4.8).
pub struct SweepProcessor {
    config: SweepConfig,
    bins: HashMap<i64, BinStats>,
    detector: AnomalyDetector,
    start_time: Option<Instant>,
    learning: bool,
    sweep_count: u64,
    anomaly_count: u64,
}

impl SweepProcessor {
    pub fn new(config: SweepConfig) -> Self {
        Self {
            config,
            bins: HashMap::new(),
            detector: AnomalyDetector::new(),
            start_time: None,
            learning: true,
            sweep_count: 0,
            anomaly_count: 0,
        }
    }

    /// Parse and process one input line. Returns the observations it
    /// produced, in ascending bin index followed by any baseline
    /// summaries (spec §5 ordering guarantee). Malformed lines produce
    /// no observations and no error (spec §7).
    pub fn process_line(&mut self, line: &str) -> Vec<Observation> {
        let parsed = match csv::parse_line(line) {
            Some(parsed) => parsed,
            None => return Vec::new(),
        };

        if self.start_time.is_none() {
            self.start_time = Some(Instant::now());
            info!(
                baseline_seconds = self.config.baseline_seconds,
                "baseline learning started"
            );
        }

        if self.learning {
            let elapsed = self.start_time.unwrap().elapsed().as_secs();
            if elapsed >= self.config.baseline_seconds {
                self.finalize_learning();
            }
        }

        let mut observations = Vec::new();
        for (freq_hz, db) in parsed.bins() {
            let stats = self.bins.entry(freq_hz).or_insert_with(BinStats::new);
            stats.update(db);

            if !self.learning {
                let sigma = stats.deviation_sigma(db).abs();
                if let Some(obs) = self.detector.check(
                    freq_hz,
                    db,
                    stats.current_mean(),
                    sigma,
                    self.config.anomaly_sigma,
                    self.config.min_streak,
                ) {
                    self.anomaly_count += 1;
                    observations.push(obs);
                }
            }
        }

        if is_new_sweep_cycle(parsed.hz_low) {
            self.sweep_count += 1;
            if !self.learning && self.sweep_count % self.config.emit_interval as u64 == 0 {
                observations.extend(summarize(&self.bins));
            }
        }

        observations
    }

    fn finalize_learning(&mut self) {
        self.learning = false;
        let mut promoted = 0;
        for stats in self.bins.values_mut() {
            if stats.count() >= MIN_LEARNING_SAMPLES {
                stats.finalize_learning();
                promoted += 1;
            }
        }
        info!(
            promoted,
            total_bins = self.bins.len(),
            "baseline learned"
        );
    }
}
