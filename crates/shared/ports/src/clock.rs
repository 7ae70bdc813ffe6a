use chrono::{DateTime, NaiveDate, Utc};

/// Port for time abstraction
///
/// Uploads are filed under the calendar date reported by this clock, so tests
/// can pin the date while production reads the wall clock.
pub trait Clock: Send + Sync {
    /// Get the current time according to this clock
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date of [`Clock::now`]
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Get the clock's name/identifier for debugging
    fn name(&self) -> &str {
        "Clock"
    }
}
