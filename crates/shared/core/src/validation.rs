//! Record validation
//!
//! Turns one raw CSV line into a [`TradeRecord`] or a [`RejectReason`].
//! Column order is fixed: `trade_date, fund, trader, security, quantity, price`.
//! Checks run in that order and stop at the first failure.

use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;
use thiserror::Error;

use crate::entities::TradeRecord;
use crate::values::{AMOUNT_MAX_INTEGER_DIGITS, AMOUNT_MAX_SCALE, parse_trade_date};

/// Minimum number of comma-separated columns in a trade line
pub const MIN_COLUMNS: usize = 6;

/// Why a line was not turned into a trade
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectReason {
    #[error("malformed-columns")]
    MalformedColumns,

    #[error("invalid-date")]
    InvalidDate,

    #[error("invalid-quantity")]
    InvalidQuantity,

    #[error("invalid-price")]
    InvalidPrice,

    #[error("empty-required-field")]
    EmptyRequiredField,
}

impl RejectReason {
    pub const ALL: [RejectReason; 5] = [
        RejectReason::MalformedColumns,
        RejectReason::InvalidDate,
        RejectReason::InvalidQuantity,
        RejectReason::InvalidPrice,
        RejectReason::EmptyRequiredField,
    ];

    /// Stable reason code used in logs and reports
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::MalformedColumns => "malformed-columns",
            RejectReason::InvalidDate => "invalid-date",
            RejectReason::InvalidQuantity => "invalid-quantity",
            RejectReason::InvalidPrice => "invalid-price",
            RejectReason::EmptyRequiredField => "empty-required-field",
        }
    }
}

/// Result of validating a single raw line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Empty after trimming; neither a trade nor a rejection
    Blank,
    Valid(TradeRecord),
    Rejected(RejectReason),
}

/// Validate one raw line.
pub fn validate_line(raw: &str) -> LineOutcome {
    let line = raw.trim();
    if line.is_empty() {
        return LineOutcome::Blank;
    }

    match parse_record(line) {
        Ok(record) => LineOutcome::Valid(record),
        Err(reason) => LineOutcome::Rejected(reason),
    }
}

fn parse_record(line: &str) -> Result<TradeRecord, RejectReason> {
    let mut columns: Vec<&str> = line.split(',').collect();
    // Trailing empty columns do not count towards the minimum
    while columns.last().is_some_and(|c| c.is_empty()) {
        columns.pop();
    }
    if columns.len() < MIN_COLUMNS {
        return Err(RejectReason::MalformedColumns);
    }

    let column = |i: usize| columns[i].trim();
    let (fund, trader, security) = (column(1), column(2), column(3));

    let trade_date = parse_trade_date(column(0)).ok_or(RejectReason::InvalidDate)?;
    let quantity = parse_non_negative(column(4)).ok_or(RejectReason::InvalidQuantity)?;
    let price = parse_non_negative(column(5)).ok_or(RejectReason::InvalidPrice)?;

    if fund.is_empty() || trader.is_empty() || security.is_empty() {
        return Err(RejectReason::EmptyRequiredField);
    }

    Ok(TradeRecord::new(
        trade_date, fund, trader, security, quantity, price,
    ))
}

/// Plain decimal notation only: digits with at most one `.`, no sign, no
/// exponent. At most `AMOUNT_MAX_INTEGER_DIGITS` digits before the point and
/// `AMOUNT_MAX_SCALE` after it, leading and trailing zeros aside.
fn parse_non_negative(text: &str) -> Option<Decimal> {
    let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if whole.is_empty() && fraction.is_empty() || !all_digits(whole) || !all_digits(fraction) {
        return None;
    }

    let whole_digits = whole.trim_start_matches('0').len();
    let fraction_digits = fraction.trim_end_matches('0').len();
    if whole_digits > AMOUNT_MAX_INTEGER_DIGITS as usize
        || fraction_digits > AMOUNT_MAX_SCALE as usize
    {
        return None;
    }

    Decimal::from_str(text).ok()
}
