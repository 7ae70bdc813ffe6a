//! Bounded worker pool for uploaded files
//!
//! `core_workers` long-lived tasks take paths from a bounded backlog. When
//! the backlog is full an extra worker is started for the overflowing file,
//! up to `max_workers` in total; extra workers exit once the backlog runs
//! dry. With every worker busy and the backlog full, submission is refused.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::error::DispatchError;
use crate::producer::IngestProducer;
use crate::report::FileReport;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Worker pool sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPoolConfig {
    pub core_workers: usize,
    pub max_workers: usize,
    /// Files waiting for a worker before overflow kicks in
    pub backlog: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            core_workers: 4,
            max_workers: 8,
            backlog: 1000,
        }
    }
}

type Backlog = Arc<tokio::sync::Mutex<mpsc::Receiver<PathBuf>>>;

/// Runs [`IngestProducer::process_file`] for submitted paths
pub struct FileDispatcher {
    producer: Arc<IngestProducer>,
    config: WorkerPoolConfig,
    tx: Mutex<Option<mpsc::Sender<PathBuf>>>,
    backlog: Backlog,
    extra_workers: Arc<AtomicUsize>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    reports_tx: mpsc::UnboundedSender<FileReport>,
    reports_rx: Mutex<mpsc::UnboundedReceiver<FileReport>>,
}

impl FileDispatcher {
    /// Start the core workers. Must be called from within a Tokio runtime.
    pub fn start(producer: Arc<IngestProducer>, config: WorkerPoolConfig) -> Self {
        let core_workers = config.core_workers.max(1);
        let config = WorkerPoolConfig {
            core_workers,
            max_workers: config.max_workers.max(core_workers),
            backlog: config.backlog.max(1),
        };

        let (tx, rx) = mpsc::channel(config.backlog);
        let backlog: Backlog = Arc::new(tokio::sync::Mutex::new(rx));
        let (reports_tx, reports_rx) = mpsc::unbounded_channel();

        let handles = (0..config.core_workers)
            .map(|id| {
                tokio::spawn(core_worker(
                    id,
                    Arc::clone(&producer),
                    Arc::clone(&backlog),
                    reports_tx.clone(),
                ))
            })
            .collect();

        log::info!(
            "File dispatcher started: {} core workers, {} max, backlog {}",
            config.core_workers,
            config.max_workers,
            config.backlog
        );

        Self {
            producer,
            config,
            tx: Mutex::new(Some(tx)),
            backlog,
            extra_workers: Arc::new(AtomicUsize::new(0)),
            handles: Mutex::new(handles),
            reports_tx,
            reports_rx: Mutex::new(reports_rx),
        }
    }

    pub fn config(&self) -> WorkerPoolConfig {
        self.config
    }

    /// Queue a file for processing without waiting for it
    pub fn submit(&self, path: PathBuf) -> Result<(), DispatchError> {
        let tx = lock(&self.tx).clone().ok_or(DispatchError::ShutDown)?;
        match tx.try_send(path) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(path)) => self.overflow(path),
            Err(TrySendError::Closed(_)) => Err(DispatchError::ShutDown),
        }
    }

    fn overflow(&self, path: PathBuf) -> Result<(), DispatchError> {
        let limit = self.config.max_workers - self.config.core_workers;
        let claimed = self
            .extra_workers
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < limit).then_some(n + 1)
            });
        if claimed.is_err() {
            log::warn!(
                "Worker pool saturated ({} workers, backlog {}), rejecting {}",
                self.config.max_workers,
                self.config.backlog,
                path.display()
            );
            return Err(DispatchError::Rejected(path));
        }

        let handle = tokio::spawn(extra_worker(
            path,
            Arc::clone(&self.producer),
            Arc::clone(&self.backlog),
            self.reports_tx.clone(),
            Arc::clone(&self.extra_workers),
        ));
        let mut handles = lock(&self.handles);
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
        Ok(())
    }

    /// Number of overflow workers currently running
    pub fn extra_workers(&self) -> usize {
        self.extra_workers.load(Ordering::SeqCst)
    }

    /// Reports of files finished so far, without waiting
    pub fn drain_reports(&self) -> Vec<FileReport> {
        let mut rx = lock(&self.reports_rx);
        let mut reports = Vec::new();
        while let Ok(report) = rx.try_recv() {
            reports.push(report);
        }
        reports
    }

    /// Stop accepting files, finish everything already accepted, and return
    /// the reports not yet drained.
    pub async fn shutdown(&self) -> Vec<FileReport> {
        drop(lock(&self.tx).take());

        loop {
            let handle = lock(&self.handles).pop();
            let Some(handle) = handle else { break };
            if let Err(e) = handle.await {
                log::error!("File worker failed: {}", e);
            }
        }

        let reports = self.drain_reports();
        log::info!("File dispatcher stopped after {} files", reports.len());
        reports
    }
}

async fn core_worker(
    id: usize,
    producer: Arc<IngestProducer>,
    backlog: Backlog,
    reports: mpsc::UnboundedSender<FileReport>,
) {
    loop {
        // Lock only while waiting for the next path, not while processing it
        let next = backlog.lock().await.recv().await;
        let Some(path) = next else { break };
        let _ = reports.send(producer.process_file(&path).await);
    }
    log::debug!("File worker {} stopped", id);
}

async fn extra_worker(
    first: PathBuf,
    producer: Arc<IngestProducer>,
    backlog: Backlog,
    reports: mpsc::UnboundedSender<FileReport>,
    running: Arc<AtomicUsize>,
) {
    let mut next = Some(first);
    while let Some(path) = next {
        let _ = reports.send(producer.process_file(&path).await);
        // A core worker holding the lock is idle and will take what is left
        next = match backlog.try_lock() {
            Ok(mut rx) => rx.try_recv().ok(),
            Err(_) => None,
        };
    }
    running.fetch_sub(1, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tradeflow_ports::{MessageQueue, PendingDelivery, PublishError, RecordMetadata};
    use tradeflow_queue::Topics;

    /// Acknowledges after a fixed delay so files stay in flight
    struct SlowQueue {
        delay: std::time::Duration,
    }

    impl MessageQueue for SlowQueue {
        fn send(&self, _topic: &str, _key: &str, _payload: Vec<u8>) -> PendingDelivery {
            let (tx, pending) = PendingDelivery::channel();
            let delay = self.delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = tx.send(Ok::<_, PublishError>(RecordMetadata {
                    partition: 0,
                    offset: 0,
                }));
            });
            pending
        }
    }

    fn csv_file(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "trade_date,fund,trader,security,quantity,price").unwrap();
        writeln!(file, "1/15/2024,FundA,Alice,AAPL,100,150.25").unwrap();
        path
    }

    fn producer(delay_ms: u64) -> Arc<IngestProducer> {
        Arc::new(IngestProducer::new(
            Arc::new(SlowQueue {
                delay: std::time::Duration::from_millis(delay_ms),
            }),
            Topics::TRANSACTIONS,
        ))
    }

    #[tokio::test]
    async fn test_processes_submitted_files() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = FileDispatcher::start(producer(1), WorkerPoolConfig::default());

        for i in 0..10 {
            dispatcher
                .submit(csv_file(&dir, &format!("f{}.csv", i)))
                .unwrap();
        }

        let reports = dispatcher.shutdown().await;
        assert_eq!(reports.len(), 10);
        assert!(reports.iter().all(|r| r.published() == 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overflow_then_rejection() {
        let dir = tempfile::tempdir().unwrap();
        let config = WorkerPoolConfig {
            core_workers: 1,
            max_workers: 2,
            backlog: 1,
        };
        let dispatcher = FileDispatcher::start(producer(1_000), config);

        // First file occupies the core worker
        dispatcher.submit(csv_file(&dir, "a.csv")).unwrap();
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        // Second waits in the backlog, third overflows to an extra worker
        dispatcher.submit(csv_file(&dir, "b.csv")).unwrap();
        dispatcher.submit(csv_file(&dir, "c.csv")).unwrap();
        assert_eq!(dispatcher.extra_workers(), 1);

        let rejected = csv_file(&dir, "d.csv");
        assert_eq!(
            dispatcher.submit(rejected.clone()),
            Err(DispatchError::Rejected(rejected))
        );

        let reports = dispatcher.shutdown().await;
        assert_eq!(reports.len(), 3);
        assert_eq!(dispatcher.extra_workers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_overflow_workers_are_released() {
        let dir = tempfile::tempdir().unwrap();
        let config = WorkerPoolConfig {
            core_workers: 1,
            max_workers: 2,
            backlog: 1,
        };
        let dispatcher = FileDispatcher::start(producer(1_000), config);

        for round in 0..5 {
            dispatcher
                .submit(csv_file(&dir, &format!("a{}.csv", round)))
                .unwrap();
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
            dispatcher
                .submit(csv_file(&dir, &format!("b{}.csv", round)))
                .unwrap();
            dispatcher
                .submit(csv_file(&dir, &format!("c{}.csv", round)))
                .unwrap();
            assert_eq!(dispatcher.extra_workers(), 1);
            assert_eq!(lock(&dispatcher.handles).len(), 2, "round {}", round);

            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            assert_eq!(dispatcher.extra_workers(), 0);
        }

        let reports = dispatcher.shutdown().await;
        assert_eq!(reports.len(), 15);
    }

    #[tokio::test]
    async fn test_submit_after_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = FileDispatcher::start(producer(1), WorkerPoolConfig::default());
        assert!(dispatcher.shutdown().await.is_empty());

        assert_eq!(
            dispatcher.submit(csv_file(&dir, "late.csv")),
            Err(DispatchError::ShutDown)
        );
    }
}
