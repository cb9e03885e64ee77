//! Shared test doubles for lifecycle tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chassis::lifecycle::{BoxError, Component};
use tokio_util::sync::CancellationToken;

/// Shared, ordered record of lifecycle calls.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    #[allow(dead_code)]
    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }
}

/// Scriptable component that records its lifecycle calls.
pub struct Probe {
    name: &'static str,
    log: EventLog,
    start_error: Option<String>,
    stop_error: Option<String>,
    stop_delay: Option<Duration>,
}

impl Probe {
    pub fn new(name: &'static str, log: &EventLog) -> Self {
        Self {
            name,
            log: log.clone(),
            start_error: None,
            stop_error: None,
            stop_delay: None,
        }
    }

    /// Make `start` fail with the given message.
    #[allow(dead_code)]
    pub fn fail_start(mut self, message: &str) -> Self {
        self.start_error = Some(message.to_string());
        self
    }

    /// Make `stop` fail with the given message.
    #[allow(dead_code)]
    pub fn fail_stop(mut self, message: &str) -> Self {
        self.stop_error = Some(message.to_string());
        self
    }

    /// Make `stop` sleep before completing, ignoring cancellation.
    #[allow(dead_code)]
    pub fn slow_stop(mut self, delay: Duration) -> Self {
        self.stop_delay = Some(delay);
        self
    }
}

#[async_trait::async_trait]
impl Component for Probe {
    async fn start(&self, _ctx: CancellationToken) -> Result<(), BoxError> {
        self.log.push(format!("{}.start", self.name));
        match &self.start_error {
            Some(message) => Err(message.clone().into()),
            None => Ok(()),
        }
    }

    async fn stop(&self, _ctx: CancellationToken) -> Result<(), BoxError> {
        if let Some(delay) = self.stop_delay {
            tokio::time::sleep(delay).await;
        }
        self.log.push(format!("{}.stop", self.name));
        match &self.stop_error {
            Some(message) => Err(message.clone().into()),
            None => Ok(()),
        }
    }
}
