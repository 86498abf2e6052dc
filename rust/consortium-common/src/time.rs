//! Time utilities.
//!
//! Credentials carry their validity bounds as whole seconds since the UNIX
//! epoch; these helpers convert between that wire form and [`SystemTime`].

pub use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Returns the current system time.
pub fn now() -> SystemTime {
    SystemTime::now()
}

/// Converts seconds since the UNIX epoch into a [`SystemTime`].
pub fn from_unix_seconds(seconds: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(seconds)
}

/// Converts a [`SystemTime`] into whole seconds since the UNIX epoch.
///
/// Instants before the epoch clamp to zero.
pub fn to_unix_seconds(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
