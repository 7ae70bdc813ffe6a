//! Tradeflow Clock Infrastructure
//!
//! Implementations of the [`Clock`] port:
//!
//! - [`SystemClock`]: wall-clock time, used in production
//! - [`FixedClock`]: frozen time that only moves when told to, used in tests
//!
//! ## Usage
//!
//! ```ignore
//! use tradeflow_clock::{Clock, FixedClock, SystemClock};
//! use chrono::NaiveDate;
//!
//! let clock = SystemClock::new();
//! let upload_day = clock.today();
//!
//! let pinned = FixedClock::on_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
//! assert_eq!(pinned.today().to_string(), "2024-01-15");
//! ```

mod fixed;
mod system;

pub use fixed::FixedClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use tradeflow_ports::Clock;
