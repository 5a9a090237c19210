//! Clock port for obtaining the current time.

use chrono::{DateTime, Utc};

/// Provides the current time.
///
/// Abstracting time access lets tests pin the timestamp half of identity
/// keys with a manual clock.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;

    /// Milliseconds between the Unix epoch and [`Clock::now`].
    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}
