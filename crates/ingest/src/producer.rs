//! File producer
//!
//! Reads one uploaded CSV, validates each data line, and publishes every
//! valid trade to the queue keyed by a fresh trade id. Sends are
//! fire-and-forget while reading; all acknowledgments are awaited once the
//! file is exhausted so no publish is outstanding when processing ends.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tradeflow_core::{IngestMessage, LineOutcome, TradeId, validate_line};
use tradeflow_ports::{MessageQueue, PendingDelivery, PublishError};

use crate::report::{Delivery, FileReport, PublishFailure, Rejection};

/// Publishes the valid lines of uploaded files
pub struct IngestProducer {
    queue: Arc<dyn MessageQueue>,
    topic: String,
}

impl IngestProducer {
    pub fn new(queue: Arc<dyn MessageQueue>, topic: impl Into<String>) -> Self {
        Self {
            queue,
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Process one file end to end. Never fails: problems end up in the
    /// report and the log.
    pub async fn process_file(&self, path: &Path) -> FileReport {
        log::info!("Processing file {}", path.display());

        match File::open(path).await {
            Ok(file) => self.process_reader(path, BufReader::new(file)).await,
            Err(e) => {
                log::error!("Error processing file {}: {}", path.display(), e);
                let mut report = FileReport::new(path);
                report.read_error = Some(e.to_string());
                report
            }
        }
    }

    /// Process CSV content from any buffered reader. The first line is the
    /// header and is skipped without validation.
    pub async fn process_reader<R>(&self, path: &Path, reader: R) -> FileReport
    where
        R: AsyncBufRead + Unpin,
    {
        let started = Instant::now();
        let mut report = FileReport::new(path);
        let mut pending: Vec<(TradeId, PendingDelivery)> = Vec::new();

        let mut lines = reader.lines();
        let mut line_number = 0usize;
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    log::error!(
                        "Error processing file {} after line {}: {}",
                        path.display(),
                        line_number,
                        e
                    );
                    report.read_error = Some(e.to_string());
                    break;
                }
            };
            line_number += 1;
            if line_number == 1 {
                continue;
            }
            report.lines_read += 1;

            match validate_line(&line) {
                LineOutcome::Blank => report.blank_lines += 1,
                LineOutcome::Rejected(reason) => {
                    log::warn!(
                        "Skipping line {} of {} ({}): {}",
                        line_number,
                        path.display(),
                        reason,
                        line
                    );
                    report.rejections.push(Rejection {
                        line_number,
                        reason,
                        line,
                    });
                }
                LineOutcome::Valid(record) => {
                    let message = IngestMessage::encode(&record);
                    match message.to_bytes() {
                        Ok(payload) => {
                            let delivery = self.queue.send(&self.topic, &message.key(), payload);
                            pending.push((message.trade_id, delivery));
                        }
                        Err(e) => {
                            log::error!("Could not encode trade {}: {}", message.trade_id, e);
                            report.publish_failures.push(PublishFailure {
                                trade_id: message.trade_id,
                                error: PublishError::Serialization(e.to_string()),
                            });
                        }
                    }
                }
            }
        }

        // Drain: nothing may be left in flight once the file is done
        for (trade_id, delivery) in pending {
            match delivery.wait().await {
                Ok(meta) => {
                    log::debug!(
                        "Sent trade {} to {}[{}] at offset {}",
                        trade_id,
                        self.topic,
                        meta.partition,
                        meta.offset
                    );
                    report.deliveries.push(Delivery {
                        trade_id,
                        partition: meta.partition,
                        offset: meta.offset,
                    });
                }
                Err(error) => {
                    log::error!("Queue producer error for trade {}: {}", trade_id, error);
                    report.publish_failures.push(PublishFailure { trade_id, error });
                }
            }
        }

        report.elapsed = started.elapsed();
        log::info!(
            "Finished processing file {}: {} lines, {} published, {} rejected, {} failed in {:?}",
            path.display(),
            report.lines_read,
            report.published(),
            report.rejected(),
            report.publish_failures.len(),
            report.elapsed
        );
        report
    }
}
