//! GFSK demodulation: FM discriminator, integrate-and-dump, and bit slicing
//! (spec §4.3).
//!
//! Deliberately simple: a plain phase-difference discriminator with no
//! phase tracking or matched filter. Sufficient for advertising-channel
//! reception, per spec's design note.

use num_complex::Complex32;

use super::defaults::SYMBOL_RATE;

/// One dwell's worth of complex baseband samples (component range `[-1, 1]`).
pub type SampleBuffer = Vec<Complex32>;

/// Minimum number of raw samples needed to attempt demodulation.
const MIN_SAMPLES: usize = 100;

/// Minimum number of symbols a dwell must yield to bother searching for
/// an access address (preamble + access address + header).
const MIN_SYMBOLS: usize = 64;

/// FM-discriminate a complex buffer into an instantaneous-phase sequence.
///
/// `phi[i] = angle(x[i+1] * conj(x[i]))` — positive phase advance means
/// frequency above the carrier (bit 1), negative means below (bit 0).
pub fn fm_discriminate(x: &[Complex32]) -> Vec<f32> {
    x.windows(2)
        .map(|pair| (pair[1] * pair[0].conj()).arg())
        .collect()
}

/// Integrate-and-dump a phase sequence to one sample per symbol, then slice
/// to bits (positive average -> 1). Returns `None` if fewer than
/// `MIN_SYMBOLS` symbols result — not enough room for preamble, access
/// address, and header.
pub fn slice_symbols(phase: &[f32], samples_per_symbol: usize) -> Option<Vec<u8>> {
    if samples_per_symbol < 1 {
        return None;
    }

    let n_symbols = phase.len() / samples_per_symbol;
    if n_symbols < MIN_SYMBOLS {
        return None;
    }

    let mut bits = Vec::with_capacity(n_symbols);
    for sym in 0..n_symbols {
        let start = sym * samples_per_symbol;
        let avg: f32 =
            phase[start..start + samples_per_symbol].iter().sum::<f32>() / samples_per_symbol as f32;
        bits.push(if avg > 0.0 { 1u8 } else { 0u8 });
    }
    Some(bits)
}

/// FM-discriminate and slice a complex dwell buffer directly to bits.
///
/// Returns `None` if the buffer is too short to reach `MIN_SYMBOLS` symbols.
pub fn demodulate(iq: &[Complex32], sample_rate: u32) -> Option<Vec<u8>> {
    if iq.len() < MIN_SAMPLES {
        return None;
    }
    let phase = fm_discriminate(iq);
    slice_symbols(&phase, samples_per_symbol(sample_rate))
}

/// Samples per symbol for the configured sample rate (1 Msym/s symbol rate).
pub fn samples_per_symbol(sample_rate: u32) -> usize {
    (sample_rate / SYMBOL_RATE) as usize
}
