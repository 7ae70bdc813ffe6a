//! Per-file processing summary

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use tradeflow_core::{RejectReason, TradeId};
use tradeflow_ports::PublishError;

/// A data line that was dropped during validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// 1-based line number in the file (the header is line 1)
    pub line_number: usize,
    pub reason: RejectReason,
    pub line: String,
}

/// A message the queue acknowledged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub trade_id: TradeId,
    pub partition: u32,
    pub offset: u64,
}

/// A valid record that never made it onto the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishFailure {
    pub trade_id: TradeId,
    pub error: PublishError,
}

/// What happened to one uploaded file
#[derive(Debug, Clone, Default)]
pub struct FileReport {
    pub path: PathBuf,
    /// Data lines read, header excluded
    pub lines_read: usize,
    pub blank_lines: usize,
    pub rejections: Vec<Rejection>,
    pub deliveries: Vec<Delivery>,
    pub publish_failures: Vec<PublishFailure>,
    /// Set when the file could not be opened or reading stopped early
    pub read_error: Option<String>,
    pub elapsed: Duration,
}

impl FileReport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn published(&self) -> usize {
        self.deliveries.len()
    }

    pub fn rejected(&self) -> usize {
        self.rejections.len()
    }

    /// Lines that turned into a record (acknowledged or not)
    pub fn valid(&self) -> usize {
        self.deliveries.len() + self.publish_failures.len()
    }

    pub fn rejections_by_reason(&self) -> HashMap<RejectReason, usize> {
        let mut counts = HashMap::new();
        for rejection in &self.rejections {
            *counts.entry(rejection.reason).or_insert(0) += 1;
        }
        counts
    }

    /// True when every data line was either blank or published
    pub fn is_clean(&self) -> bool {
        self.read_error.is_none() && self.rejections.is_empty() && self.publish_failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_by_reason() {
        let mut report = FileReport::new("trades.csv");
        for (n, reason) in [
            RejectReason::InvalidDate,
            RejectReason::InvalidPrice,
            RejectReason::InvalidDate,
        ]
        .into_iter()
        .enumerate()
        {
            report.rejections.push(Rejection {
                line_number: n + 2,
                reason,
                line: String::new(),
            });
        }

        let counts = report.rejections_by_reason();
        assert_eq!(counts[&RejectReason::InvalidDate], 2);
        assert_eq!(counts[&RejectReason::InvalidPrice], 1);
        assert!(!counts.contains_key(&RejectReason::MalformedColumns));
        assert_eq!(report.rejected(), 3);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_empty_report_is_clean() {
        let report = FileReport::new("empty.csv");
        assert!(report.is_clean());
        assert_eq!(report.published(), 0);
        assert_eq!(report.valid(), 0);
    }
}
