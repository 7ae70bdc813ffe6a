mod message;
mod staged_row;
mod trade;

pub use message::{DecodeError, IngestMessage};
pub use staged_row::StagedRow;
pub use trade::TradeRecord;
