//! Tradeflow Core Domain
//!
//! Pure domain types for the trade ingestion pipeline: the validated
//! [`TradeRecord`], the [`IngestMessage`] published to the queue, and the
//! [`StagedRow`] landed in the staging table.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod validation;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{DecodeError, IngestMessage, StagedRow, TradeRecord};
pub use validation::{LineOutcome, MIN_COLUMNS, RejectReason, validate_line};
pub use values::{
    AMOUNT_MAX_INTEGER_DIGITS, AMOUNT_MAX_SCALE, Price, Quantity, TRADE_DATE_PATTERN, TradeDate,
    TradeId, format_trade_date, is_storable_amount, parse_trade_date,
};
