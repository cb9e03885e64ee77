//! Cache components over Redis, single-node and clustered.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use bb8::Pool;
use bb8_redis::RedisConnectionManager;
use rand::Rng;
use redis::cluster::ClusterClientBuilder;
use redis::cluster_async::ClusterConnection;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::components::ComponentError;
use crate::config::schema::{RedisClusterSettings, RedisSettings};
use crate::lifecycle::{BoxError, Component};

/// Single-node Redis client behind a bb8 connection pool.
pub struct CacheComponent {
    settings: RedisSettings,
    pool: ArcSwapOption<Pool<RedisConnectionManager>>,
}

impl CacheComponent {
    pub fn new(settings: RedisSettings) -> Self {
        Self {
            settings,
            pool: ArcSwapOption::empty(),
        }
    }

    /// The connection pool. Cloning is cheap; all clones share the pool.
    pub fn pool(&self) -> Result<Pool<RedisConnectionManager>, ComponentError> {
        self.pool
            .load_full()
            .map(|pool| (*pool).clone())
            .ok_or(ComponentError::NotStarted { component: "cache" })
    }

    fn connection_url(&self) -> Result<Url, BoxError> {
        let mut url = Url::parse(&format!(
            "redis://{}/{}",
            self.settings.addr, self.settings.db
        ))?;
        if !self.settings.password.is_empty() {
            url.set_password(Some(&self.settings.password))
                .map_err(|_| "invalid redis password")?;
        }
        Ok(url)
    }
}

#[async_trait::async_trait]
impl Component for CacheComponent {
    async fn start(&self, _ctx: CancellationToken) -> Result<(), BoxError> {
        let url = self.connection_url()?;
        let manager = RedisConnectionManager::new(url.as_str())?;

        let pool = Pool::builder()
            .max_size(self.settings.pool_size)
            .min_idle(Some(self.settings.min_idle))
            .connection_timeout(Duration::from_secs(self.settings.pool_timeout_secs))
            .build(manager)
            .await
            .map_err(|error| format!("failed to build redis pool: {error}"))?;

        // bb8 connects lazily; ping now so a dead server fails startup.
        {
            let mut connection = pool
                .get()
                .await
                .map_err(|error| format!("failed to connect to redis: {error}"))?;
            let _: String = redis::cmd("PING").query_async(&mut *connection).await?;
        }

        self.pool.store(Some(Arc::new(pool)));
        tracing::info!(addr = %self.settings.addr, db = self.settings.db, "redis connected");
        Ok(())
    }

    async fn stop(&self, _ctx: CancellationToken) -> Result<(), BoxError> {
        // Pooled connections close when the last clone of the pool drops.
        self.pool.store(None);
        tracing::info!("redis pool released");
        Ok(())
    }
}

/// Clustered Redis client.
pub struct ClusterCacheComponent {
    settings: RedisClusterSettings,
    connection: ArcSwapOption<ClusterConnection>,
}

impl ClusterCacheComponent {
    pub fn new(settings: RedisClusterSettings) -> Self {
        Self {
            settings,
            connection: ArcSwapOption::empty(),
        }
    }

    pub fn connection(&self) -> Result<ClusterConnection, ComponentError> {
        self.connection
            .load_full()
            .map(|connection| (*connection).clone())
            .ok_or(ComponentError::NotStarted {
                component: "cache cluster",
            })
    }
}

#[async_trait::async_trait]
impl Component for ClusterCacheComponent {
    async fn start(&self, _ctx: CancellationToken) -> Result<(), BoxError> {
        let nodes: Vec<String> = self
            .settings
            .nodes
            .iter()
            .map(|node| format!("redis://{node}"))
            .collect();

        let mut builder = ClusterClientBuilder::new(nodes).retries(self.settings.max_retries);
        if !self.settings.password.is_empty() {
            builder = builder.password(self.settings.password.clone());
        }
        if self.settings.read_from_replicas {
            builder = builder.read_from_replicas();
        }

        let client = builder.build()?;
        let mut connection = client
            .get_async_connection()
            .await
            .map_err(|error| format!("failed to connect to redis cluster: {error}"))?;

        let _: String = redis::cmd("PING").query_async(&mut connection).await?;
        self.connection.store(Some(Arc::new(connection)));

        tracing::info!(nodes = self.settings.nodes.len(), "redis cluster connected");
        Ok(())
    }

    async fn stop(&self, _ctx: CancellationToken) -> Result<(), BoxError> {
        self.connection.store(None);
        tracing::info!("redis cluster connection released");
        Ok(())
    }
}

/// A TTL with up to 10% random slack, so keys written together do not
/// expire together.
pub fn jittered_ttl(base: Duration) -> Duration {
    let slack = base.as_secs() / 10;
    if slack == 0 {
        return base;
    }
    base + Duration::from_secs(rand::thread_rng().gen_range(0..=slack))
}
