//! RF telemetry pipeline — shared library for the BLE advertising observer
//! and wideband spectrum anomaly detector binaries.
//!
//! This crate contains all parsing, demodulation, and statistics logic with
//! no process-lifecycle or signal-handling concerns — those are thin
//! consumers in `src/bin/`. The library is organized by pipeline:
//!
//! - `ble` — GFSK demodulation, BLE advertising PDU recognition, dedup,
//!   channel scheduling.
//! - `sweep` — CSV ingestion, online per-bin baseline learning, anomaly
//!   detection, band summarization.
//! - `config` — environment-variable configuration records, loaded once.
//! - `observation` — the NDJSON record shape and signature convention
//!   shared by both pipelines.

pub mod ble;
pub mod config;
pub mod observation;
pub mod sweep;
