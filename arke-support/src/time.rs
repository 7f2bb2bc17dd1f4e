//! Epoch-relative timestamp helpers (wire timestamps are `u64` milliseconds since a
//! configurable epoch, default 2015-01-01T00:00:00 UTC).
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds between the Unix epoch and 2015-01-01T00:00:00 UTC.
pub const DEFAULT_EPOCH_MS: u64 = 1_420_070_400_000;

/// `serde(default = ...)` helper for `NodeConfig::epoch_ms`.
pub fn default_epoch_ms_field() -> u64 {
    DEFAULT_EPOCH_MS
}

/// Returns the current unix timestamp in milliseconds.
#[inline]
pub fn unix_millis_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_millis() as u64
}

/// Encode a `SystemTime` relative to `epoch_ms` for the wire.
pub fn encode(instant: SystemTime, epoch_ms: u64) -> u64 {
    let unix_ms = instant
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64;
    unix_ms.saturating_sub(epoch_ms)
}

/// Decode a wire timestamp (ms since `epoch_ms`) back into a `SystemTime`.
pub fn decode(wire_value: u64, epoch_ms: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(epoch_ms.saturating_add(wire_value))
}
