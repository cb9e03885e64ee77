//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, all errors collected)
//!     → AppSettings (validated, immutable)
//!     → sliced per component by the composition root
//! ```
//!
//! # Design Decisions
//! - Settings are immutable once loaded
//! - Every field has a default so minimal configs work
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_settings, ConfigError};
pub use schema::{AppSettings, Environment};
