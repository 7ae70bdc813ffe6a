//! Upload store
//!
//! Lands an uploaded CSV under `<root>/<year>/<month>/<day>/<filename>`
//! (no zero padding, dated by the injected clock) and hands the stored path
//! to the worker pool. The caller gets the path back as soon as the file is
//! written; processing continues in the background.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use tokio::fs::{self, File};
use tokio::io::{AsyncRead, AsyncWriteExt};
use tradeflow_ports::Clock;

use crate::dispatcher::FileDispatcher;
use crate::error::UploadError;

pub struct UploadStore {
    root: PathBuf,
    clock: Arc<dyn Clock>,
    dispatcher: Arc<FileDispatcher>,
}

impl UploadStore {
    pub fn new(
        root: impl Into<PathBuf>,
        clock: Arc<dyn Clock>,
        dispatcher: Arc<FileDispatcher>,
    ) -> Self {
        Self {
            root: root.into(),
            clock,
            dispatcher,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory uploads received on `date` are written to
    pub fn dated_folder(&self, date: NaiveDate) -> PathBuf {
        self.root
            .join(date.year().to_string())
            .join(date.month().to_string())
            .join(date.day().to_string())
    }

    /// Store an in-memory upload
    pub async fn store(&self, filename: &str, contents: &[u8]) -> Result<PathBuf, UploadError> {
        let mut reader = contents;
        self.store_stream(filename, &mut reader).await
    }

    /// Stream an upload to disk, then schedule it for processing
    pub async fn store_stream<R>(&self, filename: &str, reader: &mut R) -> Result<PathBuf, UploadError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let name = sanitize_filename(filename)?;
        let folder = self.dated_folder(self.clock.today());
        fs::create_dir_all(&folder)
            .await
            .map_err(|source| UploadError::CreateDir {
                path: folder.clone(),
                source,
            })?;

        let destination = folder.join(name);
        let write_failed = |source| UploadError::Write {
            path: destination.clone(),
            source,
        };
        let mut file = File::create(&destination).await.map_err(write_failed)?;
        let bytes = tokio::io::copy(reader, &mut file)
            .await
            .map_err(write_failed)?;
        file.flush().await.map_err(write_failed)?;
        drop(file);

        log::info!("Stored upload {} ({} bytes)", destination.display(), bytes);

        if let Err(e) = self.dispatcher.submit(destination.clone()) {
            log::error!("Upload {} not scheduled: {}", destination.display(), e);
            return Err(e.into());
        }
        Ok(destination)
    }
}

/// Keep only the final path component of a client-supplied name
fn sanitize_filename(filename: &str) -> Result<&str, UploadError> {
    Path::new(filename.trim())
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| UploadError::InvalidFilename(filename.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::WorkerPoolConfig;
    use crate::error::DispatchError;
    use crate::producer::IngestProducer;
    use tradeflow_clock::FixedClock;
    use tradeflow_queue::{InMemoryBroker, TopicConfig, Topics};

    fn upload_store(root: &Path, date: NaiveDate) -> (Arc<FileDispatcher>, UploadStore) {
        let broker = Arc::new(InMemoryBroker::new());
        broker
            .create_topic(Topics::TRANSACTIONS, TopicConfig::default())
            .unwrap();
        let producer = Arc::new(IngestProducer::new(broker, Topics::TRANSACTIONS));
        let dispatcher = Arc::new(FileDispatcher::start(
            producer,
            WorkerPoolConfig::default(),
        ));
        let store = UploadStore::new(
            root,
            Arc::new(FixedClock::on_date(date)),
            Arc::clone(&dispatcher),
        );
        (dispatcher, store)
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("trades.csv").unwrap(), "trades.csv");
        assert_eq!(sanitize_filename("../../etc/trades.csv").unwrap(), "trades.csv");
        assert_eq!(sanitize_filename("/abs/path/t.csv").unwrap(), "t.csv");
        for bad in ["", "   ", "..", "/", "dir/.."] {
            assert!(
                matches!(sanitize_filename(bad), Err(UploadError::InvalidFilename(_))),
                "{:?}",
                bad
            );
        }
    }

    #[tokio::test]
    async fn test_store_writes_to_unpadded_dated_folder() {
        let temp = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let (dispatcher, store) = upload_store(temp.path(), date);

        let contents = b"trade_date,fund,trader,security,quantity,price\n1/15/2024,FundA,Alice,AAPL,100,150.25\n";
        let path = store.store("trades.csv", contents).await.unwrap();

        assert_eq!(path, temp.path().join("2024").join("3").join("5").join("trades.csv"));
        assert_eq!(std::fs::read(&path).unwrap(), contents);

        let reports = dispatcher.shutdown().await;
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].path, path);
        assert_eq!(reports[0].published(), 1);
    }

    #[tokio::test]
    async fn test_same_name_same_day_overwrites() {
        let temp = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let (dispatcher, store) = upload_store(temp.path(), date);

        let first = store.store("t.csv", b"header\n").await.unwrap();
        let second = store.store("t.csv", b"header\nagain\n").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(std::fs::read(&second).unwrap(), b"header\nagain\n");

        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn test_store_after_shutdown_keeps_file_but_fails() {
        let temp = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let (dispatcher, store) = upload_store(temp.path(), date);
        dispatcher.shutdown().await;

        let err = store.store("late.csv", b"header\n").await.unwrap_err();
        assert!(matches!(err, UploadError::Dispatch(DispatchError::ShutDown)));
        assert!(store.dated_folder(date).join("late.csv").exists());
    }

    #[tokio::test]
    async fn test_invalid_filename_writes_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let (dispatcher, store) =
            upload_store(temp.path(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());

        assert!(store.store("..", b"x").await.is_err());
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
        dispatcher.shutdown().await;
    }
}
