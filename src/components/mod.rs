//! Infrastructure component wrappers.
//!
//! Each wrapper adapts one client library to the [`Component`] lifecycle
//! contract: configuration in, connect-and-verify on start, graceful
//! teardown on stop. Live connection handles sit behind accessors that
//! fail explicitly when the component has not started.
//!
//! [`Component`]: crate::lifecycle::Component

pub mod analytics;
pub mod cache;
pub mod database;
pub mod http;

pub use analytics::{AnalyticsError, ClickHouseComponent};
pub use cache::{jittered_ttl, CacheComponent, ClusterCacheComponent};
pub use database::DatabaseComponent;
pub use http::HttpServerComponent;

/// Errors from component accessors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ComponentError {
    #[error("{component} component is not started")]
    NotStarted { component: &'static str },
}
