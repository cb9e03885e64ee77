//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for an
//! application built on the framework. All types derive Serde traits for
//! deserialization from config files.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppSettings {
    /// Process-level settings (environment, HTTP bind, timeouts).
    pub server: ServerSettings,

    /// Logging sink configuration.
    pub logs: LogSettings,

    /// Relational database (master plus read replicas).
    pub database: DatabaseSettings,

    /// Analytical column-store nodes.
    pub clickhouse: ClickHouseSettings,

    /// Single-node cache client.
    pub redis: RedisSettings,

    /// Optional clustered cache client.
    pub redis_cluster: Option<RedisClusterSettings>,

    /// Optional S3-compatible object storage.
    pub storage: Option<StorageSettings>,

    /// Prometheus exposition settings.
    pub metrics: MetricsSettings,
}

/// Deployment environment. Drives log verbosity and how much detail
/// error responses expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Local,
    Test,
    #[default]
    Production,
}

static CURRENT_ENV: OnceLock<Environment> = OnceLock::new();

impl Environment {
    /// Record the process-wide environment. First call wins.
    pub fn make_current(self) {
        let _ = CURRENT_ENV.set(self);
    }

    /// The recorded environment, defaulting to production so error
    /// responses never leak detail by accident.
    pub fn current() -> Environment {
        CURRENT_ENV.get().copied().unwrap_or(Environment::Production)
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// Process-level settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Deployment environment.
    pub env: Environment,

    /// HTTP bind host.
    pub host: String,

    /// HTTP bind port.
    pub port: u16,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Drain budget for the HTTP server's own graceful shutdown.
    pub graceful_timeout_secs: u64,

    /// Budget shared by the whole component stop sweep.
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            env: Environment::Production,
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            graceful_timeout_secs: 5,
            shutdown_timeout_secs: 30,
        }
    }
}

impl ServerSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn graceful_timeout(&self) -> Duration {
        Duration::from_secs(self.graceful_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Logging sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogSettings {
    /// Log level or tracing filter directive (trace, debug, info, warn, error).
    pub level: String,

    /// Mirror log output to stdout.
    pub stdout: bool,

    /// Write JSON log lines to a daily-rotated file.
    pub file: bool,

    /// Directory for rotated log files.
    pub directory: String,

    /// Base file name for rotated log files.
    pub file_name: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            stdout: true,
            file: true,
            directory: "logs".to_string(),
            file_name: "app.log".to_string(),
        }
    }
}

/// One relational database endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DbEndpoint {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for DbEndpoint {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            database: String::new(),
        }
    }
}

/// Relational database configuration: one master, any number of read
/// replicas sharing the pool settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub master: DbEndpoint,

    pub replicas: Vec<DbEndpoint>,

    /// Connection character set.
    pub charset: String,

    /// Maximum pool size per endpoint.
    pub max_connections: u32,

    /// Connections each pool keeps warm.
    pub min_connections: u32,

    /// Maximum connection lifetime in seconds.
    pub conn_max_lifetime_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            master: DbEndpoint::default(),
            replicas: Vec::new(),
            charset: "utf8mb4".to_string(),
            max_connections: 100,
            min_connections: 10,
            conn_max_lifetime_secs: 3600,
        }
    }
}

impl DatabaseSettings {
    pub fn conn_max_lifetime(&self) -> Duration {
        Duration::from_secs(self.conn_max_lifetime_secs)
    }
}

/// Analytical column-store configuration (ClickHouse HTTP interface).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClickHouseSettings {
    /// Node URLs. More than one enables round-robin dispatch.
    pub urls: Vec<String>,

    pub database: String,
    pub username: String,
    pub password: String,

    /// Per-query timeout in seconds.
    pub timeout_secs: u64,

    /// Ask nodes for compressed responses.
    pub compression: bool,
}

impl Default for ClickHouseSettings {
    fn default() -> Self {
        Self {
            urls: vec!["http://localhost:8123".to_string()],
            database: "default".to_string(),
            username: "default".to_string(),
            password: String::new(),
            timeout_secs: 10,
            compression: true,
        }
    }
}

impl ClickHouseSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Single-node cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedisSettings {
    /// Address as host:port.
    pub addr: String,

    pub password: String,

    /// Logical database index.
    pub db: i64,

    /// Connection pool size.
    pub pool_size: u32,

    /// Connections the pool keeps warm.
    pub min_idle: u32,

    /// Wait budget for checking a connection out of the pool.
    pub pool_timeout_secs: u64,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            addr: "localhost:6379".to_string(),
            password: String::new(),
            db: 0,
            pool_size: 10,
            min_idle: 10,
            pool_timeout_secs: 5,
        }
    }
}

/// Clustered cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedisClusterSettings {
    /// Cluster node addresses as host:port.
    pub nodes: Vec<String>,

    pub password: String,

    /// Serve reads from replica nodes.
    pub read_from_replicas: bool,

    /// Redirect/retry budget per command.
    pub max_retries: u32,
}

impl Default for RedisClusterSettings {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            password: String::new(),
            read_from_replicas: false,
            max_retries: 3,
        }
    }
}

/// S3-compatible object storage (Cloudflare R2).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageSettings {
    pub account_id: String,
    pub access_key_id: String,
    pub access_key_secret: String,
    pub bucket: String,

    /// R2 accepts "auto"; kept configurable for other S3-compatible stores.
    pub region: String,

    /// Explicit endpoint override. Defaults to the R2 endpoint derived
    /// from the account ID.
    pub endpoint: Option<String>,

    /// Public domain used when building object URLs.
    pub custom_domain: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            access_key_id: String::new(),
            access_key_secret: String::new(),
            bucket: String::new(),
            region: "auto".to_string(),
            endpoint: None,
            custom_domain: None,
        }
    }
}

/// Prometheus exposition settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsSettings {
    /// Serve a Prometheus scrape endpoint.
    pub enabled: bool,

    /// Exporter bind address.
    pub address: String,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            address: "0.0.0.0:9090".to_string(),
        }
    }
}
