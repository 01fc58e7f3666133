//! Wall-clock timestamps
//!
//! The wire protocol, the neighbor table, and the liveness horizon all share
//! one unit: microseconds since the Unix epoch, as a signed 64-bit integer.
use chrono::Utc;

/// Current Unix time in microseconds.
pub fn unix_micros() -> i64 {
    Utc::now().timestamp_micros()
}

/// Offset of the peer clock relative to ours at exchange time.
///
/// Positive means the peer's clock is ahead. One-directional and not
/// RTT-compensated.
pub fn clock_delay(t_peer: i64, t_local: i64) -> i64 {
    t_peer - t_local
}
