//! OS signal handling.
//!
//! # Responsibilities
//! - Register handlers for interrupt and terminate
//! - Translate the first received signal into a shutdown event
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Handlers are installed once and live for the process lifetime
//! - Only SIGINT and SIGTERM are handled; everything else keeps its
//!   default disposition

use tokio::sync::broadcast;

/// Block until an interrupt/terminate signal arrives or `trigger` fires.
///
/// Returns a short description of what woke us, for logging.
pub async fn wait_for_shutdown(mut trigger: broadcast::Receiver<()>) -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(sig) => Some(sig),
            Err(error) => {
                tracing::warn!(%error, "failed to install SIGTERM handler, interrupt only");
                None
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => "interrupt",
            _ = async {
                match terminate.as_mut() {
                    Some(sig) => { sig.recv().await; }
                    None => std::future::pending::<()>().await,
                }
            } => "terminate",
            _ = trigger.recv() => "shutdown trigger",
        }
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => "interrupt",
            _ = trigger.recv() => "shutdown trigger",
        }
    }
}
