//! `ble-observer` — BLE advertising-channel receiver.
//!
//! Thin process-lifecycle shell around [`rf_telemetry::ble::observer::Observer`]:
//! loads configuration from the environment (spec §6), installs a SIGINT
//! handler for clean shutdown (spec §5), and runs the channel-hopping
//! loop until interrupted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use rf_telemetry::ble::observer::Observer;
use rf_telemetry::config::BleConfig;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = BleConfig::from_env();

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        handler_flag.store(false, Ordering::Relaxed);
    })
    .context("failed to install SIGINT handler")?;

    let mut observer = Observer::new(config);
    observer.run(&running);

    Ok(())
}
