use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Current wall-clock time in milliseconds since the UNIX epoch.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Read-eligibility and lifetime of a stored object.
///
/// Timestamps are UNIX milliseconds. `-1` is a sentinel in every field:
/// `available_from == -1` means the object is not yet readable (e.g. still
/// being thawed from cold storage), `expired_timestamp == -1` means it never
/// expires, and `proto_size == -1` means the size is unknown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageStatus {
    pub available_from: i64,
    pub expired_timestamp: i64,
    pub proto_size: i64,
}

impl StorageStatus {
    /// Sentinel for "not set" in any field.
    pub const UNSET: i64 = -1;

    /// Status of an object that is always readable and never expires.
    pub const fn permanent(proto_size: i64) -> Self {
        Self {
            available_from: 0,
            expired_timestamp: Self::UNSET,
            proto_size,
        }
    }

    /// Status of an object that exists but cannot be read yet.
    pub const fn pending(proto_size: i64) -> Self {
        Self {
            available_from: Self::UNSET,
            expired_timestamp: Self::UNSET,
            proto_size,
        }
    }

    /// Returns `true` if the availability window has opened at `now`.
    pub fn is_available_at(&self, now: i64) -> bool {
        self.available_from != Self::UNSET && self.available_from <= now
    }

    /// Returns `true` if the object has expired at `now`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expired_timestamp != Self::UNSET && now >= self.expired_timestamp
    }

    /// Readable at `now`: inside the window and not expired.
    pub fn is_readable_at(&self, now: i64) -> bool {
        self.is_available_at(now) && !self.is_expired_at(now)
    }

    /// Size in bytes, if known.
    pub fn size(&self) -> Option<u64> {
        u64::try_from(self.proto_size).ok()
    }
}

impl fmt::Display for StorageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "available_from={} expired_timestamp={} proto_size={}",
            self.available_from, self.expired_timestamp, self.proto_size
        )
    }
}
