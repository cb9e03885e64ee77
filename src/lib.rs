//! Application scaffolding framework.
//!
//! Wires infrastructure components (HTTP server, relational database
//! with read replicas, column-store, cache, logger, configuration)
//! behind a uniform start/stop lifecycle, and provides unified
//! error-response conventions for the HTTP layer.

pub mod components;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod registry;
pub mod storage;

pub use config::{AppSettings, Environment};
pub use lifecycle::{App, AppConfig, BoxError, Component, Shutdown};
pub use registry::Registry;
