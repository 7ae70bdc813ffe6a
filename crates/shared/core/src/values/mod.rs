use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Unique identifier assigned to a trade when it is encoded for the queue.
/// Doubles as the partition key and the staging table primary key.
pub type TradeId = Uuid;

/// Price value - uses Decimal for precision
pub type Price = Decimal;

/// Quantity value - uses Decimal so fractional lots survive the round trip
pub type Quantity = Decimal;

/// Most digits kept after the decimal point in a quantity or price
pub const AMOUNT_MAX_SCALE: u32 = 10;

/// Most digits before the decimal point in a quantity or price.
///
/// Together with [`AMOUNT_MAX_SCALE`] this keeps an amount inside `Decimal`'s
/// 28 significant digits and inside the staging table's `DECIMAL(38, 10)`.
pub const AMOUNT_MAX_INTEGER_DIGITS: u32 = 18;

/// Whether an amount can be staged exactly, without rounding or overflow
pub fn is_storable_amount(amount: &Decimal) -> bool {
    let normalized = amount.normalize();
    normalized.scale() <= AMOUNT_MAX_SCALE
        && normalized.abs() < Decimal::from(10u64.pow(AMOUNT_MAX_INTEGER_DIGITS))
}

/// Calendar date of a trade (no time component)
pub type TradeDate = NaiveDate;

/// Human-readable form of the trade date pattern (`M/d/yyyy`).
pub const TRADE_DATE_PATTERN: &str = "M/d/yyyy";

/// chrono format string producing `M/d/yyyy` without zero padding.
const TRADE_DATE_FORMAT: &str = "%-m/%-d/%Y";

/// Parse a trade date under the fixed `M/d/yyyy` pattern.
///
/// Month and day take one or two digits, the year exactly four. The date must
/// exist on the calendar: `2/30/2024` is rejected rather than clamped.
pub fn parse_trade_date(text: &str) -> Option<TradeDate> {
    let mut parts = text.split('/');
    let month = parse_component(parts.next()?, 1, 2)?;
    let day = parse_component(parts.next()?, 1, 2)?;
    let year = parse_component(parts.next()?, 4, 4)?;
    if parts.next().is_some() {
        return None;
    }

    NaiveDate::from_ymd_opt(year as i32, month, day)
}

/// Format a trade date under the fixed `M/d/yyyy` pattern.
///
/// The producer and the consumer both go through this pair of functions, so a
/// formatted date always parses back to the same value.
pub fn format_trade_date(date: TradeDate) -> String {
    date.format(TRADE_DATE_FORMAT).to_string()
}

fn parse_component(text: &str, min_digits: usize, max_digits: usize) -> Option<u32> {
    if text.len() < min_digits
        || text.len() > max_digits
        || !text.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    text.parse().ok()
}
