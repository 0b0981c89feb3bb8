pub mod axum_identity;
pub mod context;
pub mod delivery_hub;
pub mod env;
pub mod error;
pub mod error_log;
pub mod init;
pub mod state;

#[cfg(test)]
pub mod testing;

use chrono::{DateTime, Utc};

/// Timestamps are persisted as unix milliseconds.
pub fn to_datetime(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or(DateTime::UNIX_EPOCH)
}
