//! Relational database component: one MySQL master plus read replicas.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::components::ComponentError;
use crate::config::schema::{DatabaseSettings, DbEndpoint};
use crate::lifecycle::{BoxError, Component};

/// Connection pools for a master/replica MySQL deployment.
///
/// Writes go to [`DatabaseComponent::master`]; reads rotate over the
/// replicas via [`DatabaseComponent::replica`], falling back to the
/// master when none are configured.
pub struct DatabaseComponent {
    settings: DatabaseSettings,
    master: ArcSwapOption<MySqlPool>,
    replicas: ArcSwapOption<Vec<MySqlPool>>,
    cursor: AtomicUsize,
}

impl DatabaseComponent {
    pub fn new(settings: DatabaseSettings) -> Self {
        Self {
            settings,
            master: ArcSwapOption::empty(),
            replicas: ArcSwapOption::empty(),
            cursor: AtomicUsize::new(0),
        }
    }

    /// The write pool.
    pub fn master(&self) -> Result<MySqlPool, ComponentError> {
        self.master
            .load_full()
            .map(|pool| (*pool).clone())
            .ok_or(ComponentError::NotStarted {
                component: "database",
            })
    }

    /// A read pool, chosen round-robin over the replicas.
    pub fn replica(&self) -> Result<MySqlPool, ComponentError> {
        let replicas = self
            .replicas
            .load_full()
            .ok_or(ComponentError::NotStarted {
                component: "database",
            })?;
        if replicas.is_empty() {
            return self.master();
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % replicas.len();
        Ok(replicas[index].clone())
    }

    fn pool_options(&self) -> MySqlPoolOptions {
        MySqlPoolOptions::new()
            .max_connections(self.settings.max_connections)
            .min_connections(self.settings.min_connections)
            .max_lifetime(self.settings.conn_max_lifetime())
    }

    async fn connect(&self, endpoint: &DbEndpoint) -> Result<MySqlPool, BoxError> {
        let url = connection_url(endpoint, &self.settings.charset)?;
        let pool = self.pool_options().connect(url.as_str()).await?;
        // Verify the endpoint actually answers before declaring it up.
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(pool)
    }
}

#[async_trait::async_trait]
impl Component for DatabaseComponent {
    async fn start(&self, _ctx: CancellationToken) -> Result<(), BoxError> {
        let master = self
            .connect(&self.settings.master)
            .await
            .map_err(|error| format!("failed to connect to master: {error}"))?;
        self.master.store(Some(Arc::new(master)));

        let mut replicas = Vec::with_capacity(self.settings.replicas.len());
        for (index, endpoint) in self.settings.replicas.iter().enumerate() {
            let pool = self.connect(endpoint).await.map_err(|error| {
                format!(
                    "failed to connect to replica {index} ({}:{}): {error}",
                    endpoint.host, endpoint.port
                )
            })?;
            replicas.push(pool);
        }
        self.replicas.store(Some(Arc::new(replicas)));

        tracing::info!(
            database = %self.settings.master.database,
            replicas = self.settings.replicas.len(),
            "database connected"
        );
        Ok(())
    }

    async fn stop(&self, _ctx: CancellationToken) -> Result<(), BoxError> {
        if let Some(master) = self.master.swap(None) {
            master.close().await;
        }
        if let Some(replicas) = self.replicas.swap(None) {
            for pool in replicas.iter() {
                pool.close().await;
            }
        }
        tracing::info!("database connections closed");
        Ok(())
    }
}

/// Build a `mysql://` connection URL with escaped credentials.
fn connection_url(endpoint: &DbEndpoint, charset: &str) -> Result<Url, BoxError> {
    let mut url = Url::parse(&format!(
        "mysql://{}:{}/{}",
        endpoint.host, endpoint.port, endpoint.database
    ))?;
    url.set_username(&endpoint.user)
        .map_err(|_| "invalid database user")?;
    if !endpoint.password.is_empty() {
        url.set_password(Some(&endpoint.password))
            .map_err(|_| "invalid database password")?;
    }
    url.query_pairs_mut().append_pair("charset", charset);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> DbEndpoint {
        DbEndpoint {
            host: "db1.internal".into(),
            port: 3307,
            user: "app".into(),
            password: "p@ss:word/яя".into(),
            database: "main".into(),
        }
    }

    #[test]
    fn connection_url_escapes_credentials() {
        let url = connection_url(&endpoint(), "utf8mb4").unwrap();
        assert_eq!(url.host_str(), Some("db1.internal"));
        assert_eq!(url.port(), Some(3307));
        assert_eq!(url.path(), "/main");
        assert_eq!(url.query(), Some("charset=utf8mb4"));
        // The raw password must not survive unescaped.
        assert!(!url.as_str().contains("p@ss:word"));
    }

    #[test]
    fn accessors_fail_before_start() {
        let component = DatabaseComponent::new(DatabaseSettings::default());
        assert_eq!(
            component.master().unwrap_err(),
            ComponentError::NotStarted {
                component: "database"
            }
        );
        assert!(component.replica().is_err());
    }
}
