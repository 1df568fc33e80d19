//! Deduplicator (spec §4.5): suppresses repeated `ble-adv` emissions for
//! the same signature within a configured window, with periodic
//! compaction of stale entries.
//!
//! Modeled on `original_source/scripts/processors/ble_processor.py`'s
//! `last_seen` dict and `cleanup_dedup`, using wall-clock epoch seconds
//! instead of `time.time()`.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Signature -> last-emission epoch-seconds table (spec §3).
#[derive(Debug)]
pub struct Dedup {
    last_seen: HashMap<String, u64>,
    window_seconds: u64,
}

impl Dedup {
    pub fn new(window_seconds: u64) -> Self {
        Self {
            last_seen: HashMap::new(),
            window_seconds,
        }
    }

    /// Returns `true` (and records the current time) if `signature` has
    /// not been emitted within `window_seconds`; `false` to suppress.
    pub fn should_emit(&mut self, signature: &str) -> bool {
        self.should_emit_at(signature, epoch_seconds())
    }

    fn should_emit_at(&mut self, signature: &str, now: u64) -> bool {
        if let Some(&last) = self.last_seen.get(signature) {
            if now.saturating_sub(last) < self.window_seconds {
                return false;
            }
        }
        self.last_seen.insert(signature.to_string(), now);
        true
    }

    /// Drop entries older than `2 * window_seconds` (spec §4.5, run every
    /// 30 channel hops by the scheduler).
    pub fn compact(&mut self) {
        self.compact_at(epoch_seconds());
    }

    fn compact_at(&mut self, now: u64) {
        let cutoff = self.window_seconds.saturating_mul(2);
        self.last_seen
            .retain(|_, &mut ts| now.saturating_sub(ts) <= cutoff);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.last_seen.len()
    }
}

fn epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
