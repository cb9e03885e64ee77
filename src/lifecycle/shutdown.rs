//! Programmatic shutdown trigger.

use tokio::sync::broadcast;

/// Handle for requesting application shutdown without an OS signal.
///
/// `App::run` waits on a receiver alongside the process signal handlers,
/// so embedders (and tests) can tear the application down by calling
/// [`Shutdown::trigger`]. Cloning the handle is cheap; all clones feed
/// the same channel.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown handle.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Request shutdown. A no-op if nothing is listening yet.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
