//! Demo composition root.
//!
//! Loads settings, initializes logging and metrics, registers the
//! infrastructure components in dependency order (database, cache,
//! column-store, HTTP server last so traffic only arrives once the rest
//! is up), and hands control to the lifecycle orchestrator.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Router};
use clap::Parser;

use chassis::components::{
    jittered_ttl, CacheComponent, ClickHouseComponent, ClusterCacheComponent, DatabaseComponent,
    HttpServerComponent,
};
use chassis::config;
use chassis::http::{success, ApiError};
use chassis::lifecycle::{App, AppConfig};
use chassis::observability::{logging, metrics};
use chassis::registry::Registry;
use chassis::storage::ObjectStorage;

#[derive(Parser)]
#[command(name = "chassis", about = "Demo service built on the scaffolding framework")]
struct Cli {
    /// Path to the TOML settings file.
    #[arg(long, default_value = "config/chassis.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match config::load_settings(&cli.config) {
        Ok(settings) => settings,
        Err(error) => {
            eprintln!("failed to load configuration: {error}");
            return ExitCode::FAILURE;
        }
    };
    settings.server.env.make_current();

    if let Err(error) = logging::init(&settings.logs) {
        eprintln!("failed to initialize logging: {error}");
        return ExitCode::FAILURE;
    }

    if settings.metrics.enabled {
        // The address was validated at load time.
        match settings.metrics.address.parse() {
            Ok(addr) => {
                if let Err(error) = metrics::init(addr) {
                    tracing::error!(%error, "failed to start metrics exporter");
                }
            }
            Err(error) => tracing::error!(%error, "invalid metrics address"),
        }
    }

    tracing::info!(env = ?settings.server.env, "chassis starting");

    let registry = Registry::new();
    let mut app = App::new(AppConfig {
        shutdown_timeout: settings.server.shutdown_timeout(),
    });

    let database = Arc::new(DatabaseComponent::new(settings.database.clone()));
    registry.insert("database", database.clone());
    app.register_component(database);

    let cache = Arc::new(CacheComponent::new(settings.redis.clone()));
    registry.insert("cache", cache.clone());
    app.register_component(cache);

    if let Some(cluster_settings) = settings.redis_cluster.clone() {
        let cluster = Arc::new(ClusterCacheComponent::new(cluster_settings));
        registry.insert("cache-cluster", cluster.clone());
        app.register_component(cluster);
    }

    let clickhouse = Arc::new(ClickHouseComponent::new(settings.clickhouse.clone()));
    registry.insert("clickhouse", clickhouse.clone());
    app.register_component(clickhouse);

    if let Some(storage_settings) = &settings.storage {
        match ObjectStorage::new(storage_settings) {
            Ok(storage) => registry.insert("storage", Arc::new(storage)),
            Err(error) => {
                eprintln!("failed to configure object storage: {error}");
                return ExitCode::FAILURE;
            }
        }
    }

    let server = Arc::new(HttpServerComponent::new(settings.server.clone(), {
        let registry = registry.clone();
        move |router| demo_routes(router, registry)
    }));
    app.register_component(server);

    app.after_start(|_ctx| async {
        tracing::info!("ready to serve");
        Ok(())
    })
    .before_stop(|_ctx| async {
        tracing::info!("draining");
        Ok(())
    });

    if let Err(error) = app.run().await {
        tracing::error!(%error, "application failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn demo_routes(router: Router, registry: Registry) -> Router {
    router
        .route("/health", get(health))
        .layer(Extension(registry))
}

/// Round-trips a value through the cache to prove the wiring.
async fn health(
    Extension(registry): Extension<Registry>,
) -> Result<impl IntoResponse, ApiError> {
    let cache: Arc<CacheComponent> = registry
        .get("cache")
        .map_err(|error| ApiError::server(error.to_string()))?;
    let pool = cache
        .pool()
        .map_err(|error| ApiError::server(error.to_string()))?;
    let mut connection = pool
        .get()
        .await
        .map_err(|error| ApiError::client(error.to_string()))?;

    let ttl = jittered_ttl(Duration::from_secs(600));
    let _: () = redis::cmd("SET")
        .arg("chassis:health")
        .arg("ok")
        .arg("EX")
        .arg(ttl.as_secs())
        .query_async(&mut *connection)
        .await
        .map_err(|error| ApiError::client(error.to_string()))?;
    let value: String = redis::cmd("GET")
        .arg("chassis:health")
        .query_async(&mut *connection)
        .await
        .map_err(|error| ApiError::client(error.to_string()))?;

    Ok(success(serde_json::json!({ "status": value })))
}
