use chrono::{DateTime, TimeZone, Utc};

/// Source of wall-clock time for key derivation.
///
/// Threaded through the app state instead of calling `Utc::now()` inline so
/// timestamp-keyed uploads can be tested deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a fixed Unix timestamp, for tests.
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.0, 0).single().unwrap_or_default()
    }
}
