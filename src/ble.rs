//! BLE advertising-channel observer pipeline (spec §2, §4.1–§4.6).
//!
//! Leaf to root: `frontend` captures a dwell of I/Q samples, `energy`
//! characterizes per-dwell power and the per-channel noise baseline,
//! `dsp` demodulates GFSK into a bitstream, `pdu`/`ad`/`continuity`/
//! `tracker` recognize and decode advertising PDUs, `dedup` suppresses
//! repeat emissions, and `observer` ties the whole dwell/hop loop
//! together.

pub mod ad;
pub mod continuity;
pub mod dedup;
pub mod defaults;
pub mod dsp;
pub mod energy;
pub mod frontend;
pub mod observer;
pub mod pdu;
pub mod tracker;
