//! Wideband anomaly detector pipeline (spec §2, §4.7–§4.10).
//!
//! Leaf to root: `csv` parses one `hackrf_sweep`-style CSV line into
//! (bin-center-frequency, power-dB) pairs, `stats` tracks a per-bin
//! Welford/EMA baseline with a learning/tracking state machine,
//! `anomaly` applies streak hysteresis and emits anomaly observations,
//! `bands` groups bins into named frequency bands and periodically
//! summarizes them. `processor` ties the whole per-line pipeline
//! together.

pub mod anomaly;
pub mod bands;
pub mod csv;
pub mod processor;
pub mod stats;
