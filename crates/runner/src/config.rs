//! Pipeline configuration
//!
//! Loaded from a JSON file where every section and field is optional, then
//! adjusted from `TRADEFLOW_*` environment variables.
//!
//! ```json
//! {
//!   "upload":  { "root_dir": "data" },
//!   "queue":   { "topic": "transactions", "group_id": "tradeflow-staging", "partitions": 4 },
//!   "store":   { "backend": "duckdb", "db_path": "data/warehouse.duckdb" },
//!   "workers": { "core_workers": 4, "max_workers": 8, "backlog": 1000 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tradeflow_ingest::WorkerPoolConfig;
use tradeflow_queue::{TopicConfig, Topics};
use tradeflow_warehouse::WarehouseConfig;

pub const ENV_DATA_DIR: &str = "TRADEFLOW_DATA_DIR";
pub const ENV_TOPIC: &str = "TRADEFLOW_TOPIC";
pub const ENV_GROUP_ID: &str = "TRADEFLOW_GROUP_ID";
pub const ENV_DB_PATH: &str = "TRADEFLOW_DB_PATH";
pub const ENV_STORE_BACKEND: &str = "TRADEFLOW_STORE_BACKEND";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown store backend '{0}' (expected 'duckdb' or 'memory')")]
    UnknownBackend(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub upload: UploadSettings,
    pub queue: QueueSettings,
    pub store: StoreSettings,
    pub workers: WorkerSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    /// Uploads land under `<root_dir>/<year>/<month>/<day>/`
    pub root_dir: PathBuf,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    pub topic: String,
    pub group_id: String,
    pub partitions: u32,
    /// Delay before sends are acknowledged; unset acknowledges on enqueue
    pub ack_delay_ms: Option<u64>,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            topic: Topics::TRANSACTIONS.to_string(),
            group_id: "tradeflow-staging".to_string(),
            partitions: 4,
            ack_delay_ms: None,
        }
    }
}

impl QueueSettings {
    pub fn topic_config(&self) -> TopicConfig {
        let config = TopicConfig::default().with_partitions(self.partitions);
        match self.ack_delay_ms {
            Some(ms) => config.with_ack_delay(Duration::from_millis(ms)),
            None => config,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    DuckDb,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "duckdb" => Ok(StoreBackend::DuckDb),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::UnknownBackend(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub db_path: PathBuf,
    pub disable_extension_autoload: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::DuckDb,
            db_path: PathBuf::from("data").join("warehouse.duckdb"),
            disable_extension_autoload: true,
        }
    }
}

impl StoreSettings {
    pub fn warehouse_config(&self) -> WarehouseConfig {
        WarehouseConfig {
            db_path: Some(self.db_path.clone()),
            disable_extension_autoload: self.disable_extension_autoload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    pub core_workers: usize,
    pub max_workers: usize,
    pub backlog: usize,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        let pool = WorkerPoolConfig::default();
        Self {
            core_workers: pool.core_workers,
            max_workers: pool.max_workers,
            backlog: pool.backlog,
        }
    }
}

impl WorkerSettings {
    pub fn pool_config(&self) -> WorkerPoolConfig {
        WorkerPoolConfig {
            core_workers: self.core_workers,
            max_workers: self.max_workers,
            backlog: self.backlog,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Io {
                path: path.as_ref().display().to_string(),
                source,
            })?;

        Self::from_json(&content)
    }

    /// Parse configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Apply `TRADEFLOW_*` variables from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.upload.root_dir = PathBuf::from(dir);
        }
        if let Some(topic) = lookup(ENV_TOPIC) {
            self.queue.topic = topic;
        }
        if let Some(group_id) = lookup(ENV_GROUP_ID) {
            self.queue.group_id = group_id;
        }
        if let Some(path) = lookup(ENV_DB_PATH) {
            self.store.db_path = PathBuf::from(path);
        }
        if let Some(backend) = lookup(ENV_STORE_BACKEND) {
            self.store.backend = backend.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.queue.topic.trim().is_empty() {
            return invalid("queue.topic must not be empty");
        }
        if self.queue.group_id.trim().is_empty() {
            return invalid("queue.group_id must not be empty");
        }
        if self.queue.partitions == 0 {
            return invalid("queue.partitions must be at least 1");
        }
        if self.workers.core_workers == 0 {
            return invalid("workers.core_workers must be at least 1");
        }
        if self.workers.max_workers < self.workers.core_workers {
            return invalid("workers.max_workers must not be below workers.core_workers");
        }
        if self.workers.backlog == 0 {
            return invalid("workers.backlog must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.upload.root_dir, PathBuf::from("data"));
        assert_eq!(config.queue.topic, "transactions");
        assert_eq!(config.queue.group_id, "tradeflow-staging");
        assert_eq!(config.queue.partitions, 4);
        assert_eq!(config.store.backend, StoreBackend::DuckDb);
        assert!(config.store.disable_extension_autoload);
        assert_eq!(config.workers.core_workers, 4);
        assert_eq!(config.workers.max_workers, 8);
        assert_eq!(config.workers.backlog, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = PipelineConfig::from_json(
            r#"{ "store": { "backend": "memory" }, "workers": { "max_workers": 16 } }"#,
        )
        .unwrap();

        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.db_path, PathBuf::from("data/warehouse.duckdb"));
        assert_eq!(config.workers.max_workers, 16);
        assert_eq!(config.workers.core_workers, 4);
        assert_eq!(config.queue.topic, "transactions");

        assert_eq!(PipelineConfig::from_json("{}").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            PipelineConfig::from_json(r#"{ "store": { "backend": "postgres" } }"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            PipelineConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_missing_file() {
        assert!(matches!(
            PipelineConfig::from_file("/no/such/tradeflow.json"),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_DATA_DIR, "/srv/uploads"),
            (ENV_TOPIC, "trades-test"),
            (ENV_GROUP_ID, "staging-2"),
            (ENV_DB_PATH, "/srv/wh.duckdb"),
            (ENV_STORE_BACKEND, "Memory"),
        ]
        .into_iter()
        .collect();

        let mut config = PipelineConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.upload.root_dir, PathBuf::from("/srv/uploads"));
        assert_eq!(config.queue.topic, "trades-test");
        assert_eq!(config.queue.group_id, "staging-2");
        assert_eq!(config.store.db_path, PathBuf::from("/srv/wh.duckdb"));
        assert_eq!(config.store.backend, StoreBackend::Memory);

        let err = config
            .apply_overrides(|key| (key == ENV_STORE_BACKEND).then(|| "sqlite".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownBackend(_)));
    }

    #[test]
    fn test_validate() {
        let cases: [(&str, fn(&mut PipelineConfig)); 6] = [
            ("topic", |c: &mut PipelineConfig| c.queue.topic = " ".into()),
            ("group", |c: &mut PipelineConfig| c.queue.group_id = String::new()),
            ("partitions", |c: &mut PipelineConfig| c.queue.partitions = 0),
            ("core", |c: &mut PipelineConfig| c.workers.core_workers = 0),
            ("max", |c: &mut PipelineConfig| c.workers.max_workers = 2),
            ("backlog", |c: &mut PipelineConfig| c.workers.backlog = 0),
        ];

        for (name, mutate) in cases {
            let mut config = PipelineConfig::default();
            mutate(&mut config);
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid(_))),
                "{}",
                name
            );
        }
    }

    #[test]
    fn test_topic_config_from_settings() {
        let mut queue = QueueSettings::default();
        assert_eq!(queue.topic_config().ack_delay, None);

        queue.ack_delay_ms = Some(5);
        queue.partitions = 2;
        let topic = queue.topic_config();
        assert_eq!(topic.partitions, 2);
        assert_eq!(topic.ack_delay, Some(Duration::from_millis(5)));
    }
}
