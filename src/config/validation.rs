//! Configuration validation.
//!
//! Semantic checks on top of what serde already guarantees. Returns all
//! violations, not just the first, so a bad config file can be fixed in
//! one pass.

use std::net::SocketAddr;

use crate::config::schema::{AppSettings, DbEndpoint};

/// A single semantic violation in the configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("server.shutdown_timeout_secs must be greater than zero")]
    ZeroShutdownTimeout,

    #[error("server.request_timeout_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("database.{endpoint}.{field} must not be empty")]
    MissingDatabaseField {
        endpoint: String,
        field: &'static str,
    },

    #[error("clickhouse.urls must not be empty")]
    NoClickHouseNodes,

    #[error("clickhouse url {url:?} is not a valid http(s) URL")]
    BadClickHouseUrl { url: String },

    #[error("redis.addr {addr:?} is not host:port")]
    BadRedisAddr { addr: String },

    #[error("redis_cluster.nodes must not be empty when the section is present")]
    NoClusterNodes,

    #[error("metrics.address {address:?} is not a valid socket address")]
    BadMetricsAddress { address: String },

    #[error("storage.{field} must not be empty")]
    MissingStorageField { field: &'static str },
}

/// Validate the full settings tree, collecting every violation.
pub fn validate_settings(settings: &AppSettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.server.shutdown_timeout_secs == 0 {
        errors.push(ValidationError::ZeroShutdownTimeout);
    }
    if settings.server.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    check_endpoint(&settings.database.master, "master", &mut errors);
    for (i, replica) in settings.database.replicas.iter().enumerate() {
        check_endpoint(replica, &format!("replicas[{i}]"), &mut errors);
    }

    if settings.clickhouse.urls.is_empty() {
        errors.push(ValidationError::NoClickHouseNodes);
    }
    for url in &settings.clickhouse.urls {
        match url::Url::parse(url) {
            Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {}
            _ => errors.push(ValidationError::BadClickHouseUrl { url: url.clone() }),
        }
    }

    if !is_host_port(&settings.redis.addr) {
        errors.push(ValidationError::BadRedisAddr {
            addr: settings.redis.addr.clone(),
        });
    }

    if let Some(cluster) = &settings.redis_cluster {
        if cluster.nodes.is_empty() {
            errors.push(ValidationError::NoClusterNodes);
        }
        for node in &cluster.nodes {
            if !is_host_port(node) {
                errors.push(ValidationError::BadRedisAddr { addr: node.clone() });
            }
        }
    }

    if settings.metrics.enabled && settings.metrics.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BadMetricsAddress {
            address: settings.metrics.address.clone(),
        });
    }

    if let Some(storage) = &settings.storage {
        for (value, field) in [
            (&storage.account_id, "account_id"),
            (&storage.access_key_id, "access_key_id"),
            (&storage.access_key_secret, "access_key_secret"),
            (&storage.bucket, "bucket"),
        ] {
            if value.is_empty() {
                errors.push(ValidationError::MissingStorageField { field });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_endpoint(endpoint: &DbEndpoint, name: &str, errors: &mut Vec<ValidationError>) {
    for (value, field) in [
        (&endpoint.host, "host"),
        (&endpoint.user, "user"),
        (&endpoint.database, "database"),
    ] {
        if value.is_empty() {
            errors.push(ValidationError::MissingDatabaseField {
                endpoint: name.to_string(),
                field,
            });
        }
    }
}

fn is_host_port(addr: &str) -> bool {
    match addr.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}
