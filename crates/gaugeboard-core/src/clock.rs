use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the unix epoch. Clamps to 0 if the system clock sits
/// before the epoch.
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
