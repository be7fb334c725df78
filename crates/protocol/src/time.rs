//! Client timestamp conversion
//!
//! The client expects 64-bit FILETIME values: 100ns ticks since 1601-01-01.

use std::time::{SystemTime, UNIX_EPOCH};

/// Ticks between 1601-01-01 and 1970-01-01
pub const FILETIME_UNIX_EPOCH: i64 = 116_444_736_000_000_000;

/// Convert milliseconds since the Unix epoch to FILETIME ticks
#[inline]
pub fn unix_to_windows_time(unix_ms: i64) -> i64 {
    unix_ms * 10_000 + FILETIME_UNIX_EPOCH
}

/// Current wall-clock time in Unix milliseconds
pub fn now_unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_conversion() {
        assert_eq!(unix_to_windows_time(0), FILETIME_UNIX_EPOCH);
        assert_eq!(unix_to_windows_time(1), FILETIME_UNIX_EPOCH + 10_000);
    }
}
