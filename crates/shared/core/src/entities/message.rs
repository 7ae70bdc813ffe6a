use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::{StagedRow, TradeRecord};
use crate::values::{Price, Quantity, TradeId, format_trade_date, parse_trade_date};

/// Errors raised when a queue payload cannot be turned back into a trade
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Malformed message body: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid trade date [{0}]")]
    InvalidTradeDate(String),
}

/// Wire-level unit published to the `transactions` topic.
///
/// Serialized as a flat JSON object:
/// `{"trade_id", "trade_date" (M/d/yyyy), "fund", "trader", "security", "quantity", "price"}`
/// with `quantity` and `price` written as exact JSON numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestMessage {
    pub trade_id: TradeId,
    pub trade_date: String,
    pub fund: String,
    pub trader: String,
    pub security: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub quantity: Quantity,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub price: Price,
}

impl IngestMessage {
    /// Encode a validated record, assigning it a fresh random trade id.
    pub fn encode(record: &TradeRecord) -> Self {
        Self::encode_with_id(Uuid::new_v4(), record)
    }

    /// Encode with a caller-supplied trade id
    pub fn encode_with_id(trade_id: TradeId, record: &TradeRecord) -> Self {
        Self {
            trade_id,
            trade_date: format_trade_date(record.trade_date()),
            fund: record.fund().to_string(),
            trader: record.trader().to_string(),
            security: record.security().to_string(),
            quantity: record.quantity(),
            price: record.price(),
        }
    }

    /// Partition key for the queue
    pub fn key(&self) -> String {
        self.trade_id.to_string()
    }

    /// Serialize to the JSON wire payload
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode a JSON wire payload
    pub fn from_bytes(payload: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(payload)?)
    }

    /// Re-parse the date string and produce the row handed to the store.
    pub fn into_staged_row(self) -> Result<StagedRow, DecodeError> {
        let trade_date = parse_trade_date(&self.trade_date)
            .ok_or_else(|| DecodeError::InvalidTradeDate(self.trade_date.clone()))?;

        Ok(StagedRow {
            trade_id: self.trade_id,
            trade_date,
            fund: self.fund,
            trader: self.trader,
            security: self.security,
            quantity: self.quantity,
            price: self.price,
        })
    }

    /// True when both messages carry the same trade, ignoring the trade id
    pub fn same_payload(&self, other: &IngestMessage) -> bool {
        self.trade_date == other.trade_date
            && self.fund == other.fund
            && self.trader == other.trader
            && self.security == other.security
            && self.quantity == other.quantity
            && self.price == other.price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{LineOutcome, validate_line};
    use rust_decimal_macros::dec;

    fn record(line: &str) -> TradeRecord {
        match validate_line(line) {
            LineOutcome::Valid(record) => record,
            other => panic!("expected valid line, got {:?}", other),
        }
    }

    #[test]
    fn test_encode_assigns_distinct_ids() {
        let trade = record("1/15/2024,FundA,Alice,AAPL,100,150.25");

        let first = IngestMessage::encode(&trade);
        let second = IngestMessage::encode(&trade);

        assert_ne!(first.trade_id, second.trade_id);
        assert!(first.same_payload(&second));
        assert_eq!(first.quantity, dec!(100));
        assert_eq!(first.price, dec!(150.25));
        assert_eq!(first.trade_date, "1/15/2024");
    }

    #[test]
    fn test_encode_normalizes_date() {
        let trade = record("01/05/2024,FundA,Alice,AAPL,100,150.25");
        let msg = IngestMessage::encode(&trade);
        assert_eq!(msg.trade_date, "1/5/2024");
    }

    #[test]
    fn test_wire_shape() {
        let trade = record("1/15/2024,FundA,Alice,AAPL,100,150.25");
        let id = Uuid::parse_str("6f9619ff-8b86-d011-b42d-00c04fc964ff").unwrap();
        let msg = IngestMessage::encode_with_id(id, &trade);

        let json = String::from_utf8(msg.to_bytes().unwrap()).unwrap();
        assert_eq!(
            json,
            r#"{"trade_id":"6f9619ff-8b86-d011-b42d-00c04fc964ff","trade_date":"1/15/2024","fund":"FundA","trader":"Alice","security":"AAPL","quantity":100,"price":150.25}"#
        );
        assert_eq!(msg.key(), "6f9619ff-8b86-d011-b42d-00c04fc964ff");
    }

    #[test]
    fn test_text_fields_are_escaped() {
        let trade = record(r#"1/15/2024,Fund "A",Ali\ce,AAPL,100,150.25"#);
        let msg = IngestMessage::encode(&trade);

        let decoded = IngestMessage::from_bytes(&msg.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.fund, r#"Fund "A""#);
        assert_eq!(decoded.trader, r"Ali\ce");
    }

    #[test]
    fn test_decode_preserves_fields() {
        let trade = record("12/31/2023,FundB,Bob,MSFT,0.5,0");
        let msg = IngestMessage::encode(&trade);

        let decoded = IngestMessage::from_bytes(&msg.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, msg);

        let row = decoded.into_staged_row().unwrap();
        assert_eq!(row.trade_id, msg.trade_id);
        assert_eq!(row.trade_date, trade.trade_date());
        assert_eq!(row.quantity, dec!(0.5));
        assert_eq!(row.price, dec!(0));
    }

    #[test]
    fn test_decode_rejects_missing_field() {
        let payload = br#"{"trade_id":"6f9619ff-8b86-d011-b42d-00c04fc964ff","trade_date":"1/15/2024","fund":"FundA","trader":"Alice","quantity":100,"price":1}"#;
        assert!(matches!(
            IngestMessage::from_bytes(payload),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(IngestMessage::from_bytes(b"not json").is_err());
        assert!(IngestMessage::from_bytes(b"{}").is_err());
    }

    #[test]
    fn test_staged_row_rejects_foreign_date_format() {
        let payload = br#"{"trade_id":"6f9619ff-8b86-d011-b42d-00c04fc964ff","trade_date":"2024-01-15","fund":"FundA","trader":"Alice","security":"AAPL","quantity":100,"price":1}"#;
        let msg = IngestMessage::from_bytes(payload).unwrap();

        match msg.into_staged_row() {
            Err(DecodeError::InvalidTradeDate(date)) => assert_eq!(date, "2024-01-15"),
            other => panic!("expected invalid date, got {:?}", other),
        }
    }
}
