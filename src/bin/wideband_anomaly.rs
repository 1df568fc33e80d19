//! `wideband-anomaly` — spectrum sweep anomaly detector.
//!
//! Reads `hackrf_sweep`-style CSV lines from stdin, feeds each one through
//! [`rf_telemetry::sweep::processor::SweepProcessor`], and writes the
//! resulting NDJSON observation records to stdout (spec §6).

use std::io::{self, BufRead, Write};

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rf_telemetry::config::SweepConfig;
use rf_telemetry::sweep::processor::SweepProcessor;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = SweepConfig::from_env();
    let mut processor = SweepProcessor::new(config);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut lines_seen: u64 = 0;
    let mut observations_emitted: u64 = 0;

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        lines_seen += 1;

        for obs in processor.process_line(&line) {
            let rendered = match obs.to_line() {
                Ok(rendered) => rendered,
                Err(e) => {
                    warn!(error = %e, "failed to serialize observation");
                    continue;
                }
            };
            writeln!(out, "{}", rendered)?;
            observations_emitted += 1;
        }
        out.flush()?;
    }

    info!(lines_seen, observations_emitted, "stdin closed, shutting down");

    Ok(())
}
