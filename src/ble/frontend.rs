//! Frontend driver adapter (spec §4.1): spawns `hackrf_transfer` as a child
//! process per channel dwell and converts its raw I/Q stdout into a complex
//! sample buffer.
//!
//! Modeled on the pack's RTL-SDR capture adapter
//! (`services/adsb-capture/src/sdr-capture.rs`), which drives an analogous
//! SDR capture binary as a child process and reads its raw stdout in a
//! dedicated thread so the main loop can still enforce a wall-clock
//! timeout. Never raises: every error path logs to `tracing` and returns
//! `None`.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use num_complex::Complex32;
use tracing::warn;

use super::dsp::SampleBuffer;

/// Kills the child process on drop, guaranteeing release on every exit path
/// (clean read, short read, timeout, or early return).
struct KillOnDrop(Child);

impl Drop for KillOnDrop {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

/// Capture one dwell of I/Q samples from `hackrf_transfer` on the given
/// channel/frequency. Returns `None` on any failure (non-zero exit, short
/// read, timeout, or missing executable) — per spec, this function never
/// raises.
pub fn capture_channel(
    channel: u8,
    freq_hz: u64,
    config: &crate::config::BleConfig,
) -> Option<SampleBuffer> {
    let samples_per_dwell = config.samples_per_dwell();
    let bytes_needed = samples_per_dwell * 2;

    let mut cmd = Command::new("hackrf_transfer");
    cmd.arg("-r")
        .arg("-")
        .arg("-f")
        .arg(freq_hz.to_string())
        .arg("-s")
        .arg(config.sample_rate.to_string())
        .arg("-l")
        .arg(config.lna_gain.to_string())
        .arg("-g")
        .arg(config.vga_gain.to_string())
        .arg("-n")
        .arg(bytes_needed.to_string());
    if !config.hackrf_serial.is_empty() {
        cmd.arg("-d").arg(&config.hackrf_serial);
    }
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    let child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            warn!(channel, %freq_hz, error = %e, "hackrf_transfer spawn failed");
            return None;
        }
    };
    let mut guard = KillOnDrop(child);
    let mut stdout = guard.0.stdout.take()?;

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = vec![0u8; bytes_needed];
        let result = stdout.read_exact(&mut buf).map(|_| buf);
        let _ = tx.send(result);
    });

    let timeout = Duration::from_secs_f64(config.channel_dwell_ms as f64 / 1000.0 + 5.0);
    let raw = match rx.recv_timeout(timeout) {
        Ok(Ok(buf)) => buf,
        Ok(Err(e)) => {
            warn!(channel, %freq_hz, error = %e, "hackrf_transfer short read");
            return None;
        }
        Err(_) => {
            warn!(channel, %freq_hz, "hackrf_transfer timed out");
            return None;
        }
    };

    match guard.0.try_wait() {
        Ok(Some(status)) if !status.success() => {
            warn!(channel, %freq_hz, ?status, "hackrf_transfer exited non-zero");
            return None;
        }
        _ => {}
    }

    Some(raw_to_complex(&raw))
}

/// Interleaved signed 8-bit I/Q bytes -> complex samples, each component
/// divided by 128.0 (spec §3, §4.1).
fn raw_to_complex(raw: &[u8]) -> SampleBuffer {
    raw.chunks_exact(2)
        .map(|pair| {
            let i = pair[0] as i8 as f32 / 128.0;
            let q = pair[1] as i8 as f32 / 128.0;
            Complex32::new(i, q)
        })
        .collect()
}
