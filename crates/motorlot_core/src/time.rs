use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Microseconds since the Unix epoch.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

// Last value handed out by `Timestamp::now`, so two calls in the same microsecond still order.
static LAST_TIMESTAMP: Mutex<i64> = Mutex::new(0);

impl Timestamp {
    /// Strictly increasing within this process.
    pub fn now() -> Self {
        let physical = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros() as i64;
        let mut guard = match LAST_TIMESTAMP.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let next = if physical > *guard { physical } else { *guard + 1 };
        *guard = next;
        Timestamp(next)
    }

    pub fn as_micros(self) -> i64 {
        self.0
    }

    pub fn from_micros(value: i64) -> Self {
        Timestamp(value)
    }

    pub fn to_datetime(self) -> DateTime<Utc> {
        Utc.timestamp_micros(self.0)
            .single()
            .unwrap_or_default()
    }

    pub fn from_datetime(value: DateTime<Utc>) -> Self {
        Timestamp(value.timestamp_micros())
    }
}

#[cfg(test)]
mod tests {
    use super::Timestamp;

    #[test]
    fn now_is_strictly_increasing() {
        let mut last = Timestamp::now();
        for _ in 0..1_000 {
            let next = Timestamp::now();
            assert!(next > last);
            last = next;
        }
    }

    #[test]
    fn datetime_conversion_keeps_micros() {
        let ts = Timestamp::from_micros(1_577_836_800_123_456);
        assert_eq!(Timestamp::from_datetime(ts.to_datetime()), ts);
    }
}
