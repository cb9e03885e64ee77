//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Composition root:
//!     App::new(config) → register_component() × N → after_start()/before_stop()
//!
//! Run (app.rs):
//!     start components in registration order
//!     → after-start hooks (first failure is fatal, no rollback)
//!     → block on SIGINT/SIGTERM (signals.rs) or Shutdown::trigger (shutdown.rs)
//!     → before-stop hooks (failures logged, never fatal)
//!     → stop components in reverse order, bounded by the shutdown timeout
//!
//! Startup failure:
//!     component i fails → components i-1..0 stopped in reverse (best effort)
//!     → error naming index i returned to the embedder
//! ```
//!
//! # Design Decisions
//! - Start order is registration order; stop order is the exact reverse
//! - A component that never started is never stopped
//! - Registration borrows mutably and `run` consumes the app, so the
//!   component and hook lists cannot change once execution begins
//! - Shutdown shares one deadline across the whole reverse sweep; a stop
//!   that outlives it is abandoned, not killed

pub mod app;
pub mod component;
pub mod shutdown;
pub mod signals;

pub use app::{App, AppConfig, LifecycleError};
pub use component::{BoxError, Component};
pub use shutdown::Shutdown;
