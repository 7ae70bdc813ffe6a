//! Bootstrap - pipeline wiring and shutdown
//!
//! Builds one of each long-lived component from a [`PipelineConfig`] and
//! shares them by `Arc`:
//! - the broker and its `transactions` topic
//! - the staging store (DuckDB or in-memory)
//! - the consumer group, one task per partition
//! - the file worker pool and the upload store in front of it

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tradeflow_ingest::{
    ConsumerGroup, ConsumerStatsSnapshot, FileDispatcher, FileReport, IngestConsumer,
    IngestProducer, StoreWriter, UploadStore,
};
use tradeflow_ports::{Clock, StagingStore};
use tradeflow_queue::InMemoryBroker;
use tradeflow_warehouse::{DuckDbStagingStore, InMemoryStagingStore};

use crate::config::{PipelineConfig, StoreBackend};
use crate::error::RunnerError;

/// The staging store actually opened, kept concrete for verification reads
#[derive(Clone)]
pub enum StagingBackend {
    DuckDb(DuckDbStagingStore),
    Memory(Arc<InMemoryStagingStore>),
}

impl StagingBackend {
    pub fn open(config: &PipelineConfig) -> Result<Self, RunnerError> {
        Ok(match config.store.backend {
            StoreBackend::DuckDb => {
                StagingBackend::DuckDb(DuckDbStagingStore::open(config.store.warehouse_config())?)
            }
            StoreBackend::Memory => StagingBackend::Memory(Arc::new(InMemoryStagingStore::new())),
        })
    }

    pub fn as_store(&self) -> Arc<dyn StagingStore> {
        match self {
            StagingBackend::DuckDb(store) => Arc::new(store.clone()),
            StagingBackend::Memory(store) => Arc::clone(store) as Arc<dyn StagingStore>,
        }
    }

    /// Rows currently in `transactions_staging`
    pub fn row_count(&self) -> Result<u64, RunnerError> {
        Ok(match self {
            StagingBackend::DuckDb(store) => store.row_count()?,
            StagingBackend::Memory(store) => store.row_count() as u64,
        })
    }
}

/// Totals reported once the pipeline has drained
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub files: Vec<FileReport>,
    pub consumer: ConsumerStatsSnapshot,
    pub staged_rows: u64,
}

impl PipelineSummary {
    pub fn lines_read(&self) -> usize {
        self.files.iter().map(|f| f.lines_read).sum()
    }

    pub fn published(&self) -> usize {
        self.files.iter().map(FileReport::published).sum()
    }

    pub fn rejected(&self) -> usize {
        self.files.iter().map(FileReport::rejected).sum()
    }

    pub fn publish_failures(&self) -> usize {
        self.files.iter().map(|f| f.publish_failures.len()).sum()
    }

    pub fn log(&self) {
        log::info!(
            "Pipeline drained: {} files, {} lines, {} published, {} rejected, {} publish failures",
            self.files.len(),
            self.lines_read(),
            self.published(),
            self.rejected(),
            self.publish_failures()
        );
        log::info!(
            "Consumer: {} received, {} stored, {} duplicates, {} decode failures, {} store failures; {} rows staged",
            self.consumer.received,
            self.consumer.stored,
            self.consumer.duplicates,
            self.consumer.decode_failures,
            self.consumer.store_failures,
            self.staged_rows
        );
    }
}

/// A running pipeline
pub struct Pipeline {
    config: PipelineConfig,
    broker: Arc<InMemoryBroker>,
    backend: StagingBackend,
    dispatcher: Arc<FileDispatcher>,
    uploads: UploadStore,
    consumers: ConsumerGroup,
}

impl Pipeline {
    /// Validate the config and start every component. Must be called from
    /// within a Tokio runtime.
    pub fn start(config: PipelineConfig, clock: Arc<dyn Clock>) -> Result<Self, RunnerError> {
        config.validate()?;

        let backend = StagingBackend::open(&config)?;

        let broker = Arc::new(InMemoryBroker::new());
        broker.create_topic(&config.queue.topic, config.queue.topic_config())?;
        let receivers = broker.subscribe(&config.queue.topic, &config.queue.group_id)?;

        let consumer = Arc::new(IngestConsumer::new(StoreWriter::new(backend.as_store())));
        let consumers = consumer.spawn(receivers);

        let producer = Arc::new(IngestProducer::new(
            broker.clone(),
            config.queue.topic.clone(),
        ));
        let dispatcher = Arc::new(FileDispatcher::start(producer, config.workers.pool_config()));
        let uploads = UploadStore::new(
            config.upload.root_dir.clone(),
            clock,
            Arc::clone(&dispatcher),
        );

        log::info!(
            "Pipeline started: uploads in {}, topic '{}' ({} partitions), store {:?}",
            config.upload.root_dir.display(),
            config.queue.topic,
            consumers.partitions(),
            config.store.backend
        );

        Ok(Self {
            config,
            broker,
            backend,
            dispatcher,
            uploads,
            consumers,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn uploads(&self) -> &UploadStore {
        &self.uploads
    }

    pub fn backend(&self) -> &StagingBackend {
        &self.backend
    }

    pub fn broker(&self) -> &Arc<InMemoryBroker> {
        &self.broker
    }

    /// Upload a local file under its own name
    pub async fn upload_file(&self, source: &Path) -> Result<PathBuf, RunnerError> {
        let read_failed = |source_err| RunnerError::Read {
            path: source.to_path_buf(),
            source: source_err,
        };
        let mut file = tokio::fs::File::open(source).await.map_err(read_failed)?;
        let filename = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(self.uploads.store_stream(&filename, &mut file).await?)
    }

    /// Finish every accepted file, drain the queue into the store, and stop.
    pub async fn shutdown(self) -> Result<PipelineSummary, RunnerError> {
        let files = self.dispatcher.shutdown().await;
        self.broker.close_all();
        let consumer = self.consumers.join().await;
        let staged_rows = self.backend.row_count()?;

        let summary = PipelineSummary {
            files,
            consumer,
            staged_rows,
        };
        summary.log();
        Ok(summary)
    }
}
