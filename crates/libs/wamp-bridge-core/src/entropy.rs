//! Non-deterministic signing inputs: wall clock and nonce.

use rand_core::{OsRng, RngCore};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::error::BridgeError;

/// Largest nonce the bridge accepts (inclusive).
pub const MAX_NONCE: u64 = 1 << 53;

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
);

pub trait Clock: Send + Sync {
    fn now_utc(&self) -> OffsetDateTime;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

pub trait NonceSource: Send + Sync {
    /// Returns a value in `[0, MAX_NONCE]`.
    fn next_nonce(&self) -> Result<u64, BridgeError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct OsNonce;

impl NonceSource for OsNonce {
    fn next_nonce(&self) -> Result<u64, BridgeError> {
        let mut bytes = [0u8; 8];
        OsRng.try_fill_bytes(&mut bytes).map_err(|err| {
            BridgeError::SignatureError(format!("os rng unavailable for nonce: {err}"))
        })?;
        Ok(u64::from_le_bytes(bytes) % (MAX_NONCE + 1))
    }
}

/// Formats an instant as `YYYY-MM-DDTHH:MM:SS.ffffffZ` in UTC.
pub fn format_timestamp(instant: OffsetDateTime) -> Result<String, BridgeError> {
    instant
        .to_offset(time::UtcOffset::UTC)
        .format(TIMESTAMP_FORMAT)
        .map_err(|err| BridgeError::SignatureError(format!("cannot format timestamp: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    #[test]
    fn timestamp_has_microseconds_and_zulu_suffix() {
        let instant = datetime!(2016-05-17 10:00:00.123456 UTC);
        let formatted = format_timestamp(instant).expect("format");
        assert_eq!(formatted, "2016-05-17T10:00:00.123456Z");
    }

    #[test]
    fn timestamp_is_normalized_to_utc() {
        let local = datetime!(2024-01-02 05:04:05 UTC).to_offset(offset!(+2));
        assert_eq!(format_timestamp(local).expect("format"), "2024-01-02T05:04:05.000000Z");
    }

    #[test]
    fn os_nonce_stays_in_range() {
        for _ in 0..64 {
            assert!(OsNonce.next_nonce().expect("os nonce") <= MAX_NONCE);
        }
    }
}
