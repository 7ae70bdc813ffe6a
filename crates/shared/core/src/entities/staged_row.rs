use serde::{Deserialize, Serialize};

use crate::values::{Price, Quantity, TradeDate, TradeId, is_storable_amount};

/// Row landed in the `transactions_staging` table, keyed by `trade_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedRow {
    pub trade_id: TradeId,
    pub trade_date: TradeDate,
    pub fund: String,
    pub trader: String,
    pub security: String,
    pub quantity: Quantity,
    pub price: Price,
}

impl StagedRow {
    /// Name of the first amount column the staging table cannot hold exactly
    pub fn unstorable_amount(&self) -> Option<&'static str> {
        if !is_storable_amount(&self.quantity) {
            Some("quantity")
        } else if !is_storable_amount(&self.price) {
            Some("price")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn row() -> StagedRow {
        StagedRow {
            trade_id: Uuid::new_v4(),
            trade_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            fund: "FundA".to_string(),
            trader: "Alice".to_string(),
            security: "AAPL".to_string(),
            quantity: dec!(100),
            price: dec!(150.25),
        }
    }

    #[test]
    fn test_unstorable_amount() {
        assert_eq!(row().unstorable_amount(), None);

        let staged = StagedRow {
            quantity: dec!(0.12345678901),
            ..row()
        };
        assert_eq!(staged.unstorable_amount(), Some("quantity"));

        let staged = StagedRow {
            price: dec!(1000000000000000000),
            ..row()
        };
        assert_eq!(staged.unstorable_amount(), Some("price"));
    }
}
