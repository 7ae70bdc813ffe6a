use crate::values::{Price, Quantity, TradeDate};

/// A trade line that passed every field-level check.
///
/// Fields are private: the only way to obtain a `TradeRecord` is through
/// [`validate_line`](crate::validation::validate_line), so a partially valid
/// record cannot exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeRecord {
    trade_date: TradeDate,
    fund: String,
    trader: String,
    security: String,
    quantity: Quantity,
    price: Price,
}

impl TradeRecord {
    pub(crate) fn new(
        trade_date: TradeDate,
        fund: &str,
        trader: &str,
        security: &str,
        quantity: Quantity,
        price: Price,
    ) -> Self {
        Self {
            trade_date,
            fund: fund.to_string(),
            trader: trader.to_string(),
            security: security.to_string(),
            quantity,
            price,
        }
    }

    pub fn trade_date(&self) -> TradeDate {
        self.trade_date
    }

    pub fn fund(&self) -> &str {
        &self.fund
    }

    pub fn trader(&self) -> &str {
        &self.trader
    }

    pub fn security(&self) -> &str {
        &self.security
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn price(&self) -> Price {
        self.price
    }
}
