use chrono::{DateTime, NaiveDate, Utc};
use std::sync::RwLock;
use tradeflow_ports::Clock;

/// Clock frozen at a given instant, movable by hand
///
/// Used in tests and replays where the upload date must be deterministic.
pub struct FixedClock {
    current: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            current: RwLock::new(at),
        }
    }

    /// Frozen at midnight UTC of the given date
    pub fn on_date(date: NaiveDate) -> Self {
        Self::new(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }

    /// Move the clock to a new instant
    pub fn set(&self, at: DateTime<Utc>) {
        match self.current.write() {
            Ok(mut guard) => *guard = at,
            Err(poisoned) => *poisoned.into_inner() = at,
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.current.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn name(&self) -> &str {
        "FixedClock"
    }
}
