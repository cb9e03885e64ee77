//! The component lifecycle orchestrator.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::lifecycle::component::{into_hook, BoxError, Component, Hook};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals;

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Budget shared by the whole reverse stop sweep. Components that
    /// have not finished stopping when it elapses are abandoned.
    pub shutdown_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Errors surfaced by the orchestrator.
///
/// `run` returning any of these is the embedder's cue for a non-zero
/// process exit. Intermediate failures (rollback stops, before-stop
/// hooks, all but the last stop error) are logged, not returned.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("component {index} failed to start: {cause}")]
    StartFailed { index: usize, cause: BoxError },

    #[error("after-start hook {index} failed: {cause}")]
    AfterStartHook { index: usize, cause: BoxError },

    #[error("component {index} failed to stop: {cause}")]
    StopFailed { index: usize, cause: BoxError },

    #[error("component {index} did not stop within {timeout:?}")]
    StopTimedOut { index: usize, timeout: Duration },
}

/// Sequences component startup and shutdown.
///
/// Components start in registration order and stop in the exact reverse
/// order. A startup failure rolls back every already-started component
/// before the error is returned; shutdown is best-effort and bounded by
/// [`AppConfig::shutdown_timeout`].
///
/// The orchestrator is configured once, executed once via [`App::run`],
/// and discarded. `run` consumes the app, so the registered lists are
/// frozen for the whole execution.
pub struct App {
    config: AppConfig,
    components: Vec<Arc<dyn Component>>,
    after_start: Vec<Hook>,
    before_stop: Vec<Hook>,
    shutdown: Shutdown,
}

impl App {
    /// Create an orchestrator with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            components: Vec::new(),
            after_start: Vec::new(),
            before_stop: Vec::new(),
            shutdown: Shutdown::new(),
        }
    }

    /// Append a component. Insertion order is start order.
    pub fn register_component(&mut self, component: Arc<dyn Component>) {
        self.components.push(component);
    }

    /// Append a hook to run after all components have started.
    pub fn after_start<F, Fut>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.after_start.push(into_hook(hook));
        self
    }

    /// Append a hook to run once shutdown begins, before any component stops.
    pub fn before_stop<F, Fut>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.before_stop.push(into_hook(hook));
        self
    }

    /// Handle that requests shutdown as if a signal had arrived.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Start every component in registration order.
    ///
    /// On failure at index `i`, components `i-1..0` are stopped in
    /// reverse order as a best-effort rollback; rollback stop errors are
    /// logged and swallowed. The component that failed is never stopped.
    pub async fn start(&self, ctx: CancellationToken) -> Result<(), LifecycleError> {
        for (index, component) in self.components.iter().enumerate() {
            if let Err(cause) = component.start(ctx.clone()).await {
                for (rolled_back, started) in self.components[..index].iter().enumerate().rev() {
                    if let Err(error) = started.stop(ctx.clone()).await {
                        tracing::error!(
                            component = rolled_back,
                            %error,
                            "error stopping component during startup rollback"
                        );
                    }
                }
                return Err(LifecycleError::StartFailed { index, cause });
            }
        }
        Ok(())
    }

    /// Stop every component in reverse registration order.
    ///
    /// All components are attempted regardless of individual failures.
    /// The whole sweep shares one deadline; a component still stopping
    /// when it elapses is recorded as timed out and the sweep moves on.
    /// Returns the last error encountered, if any.
    pub async fn stop(&self, ctx: CancellationToken) -> Result<(), LifecycleError> {
        let timeout = self.config.shutdown_timeout;
        let deadline = Instant::now() + timeout;

        // Cancelled once the budget is spent, so cooperative components
        // can abort cleanup early.
        let stop_ctx = ctx.child_token();
        let deadline_ctx = stop_ctx.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            deadline_ctx.cancel();
        });

        let mut last_error = None;
        for (index, component) in self.components.iter().enumerate().rev() {
            match tokio::time::timeout_at(deadline, component.stop(stop_ctx.clone())).await {
                Ok(Ok(())) => {}
                Ok(Err(cause)) => {
                    tracing::error!(component = index, error = %cause, "error stopping component");
                    last_error = Some(LifecycleError::StopFailed { index, cause });
                }
                Err(_) => {
                    tracing::error!(component = index, ?timeout, "component did not stop in time");
                    last_error = Some(LifecycleError::StopTimedOut { index, timeout });
                }
            }
        }

        timer.abort();
        match last_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Drive the full lifecycle: start, wait for a shutdown signal, stop.
    ///
    /// Returns immediately with the startup error if any component fails
    /// to start (rollback already performed), or with the first
    /// after-start hook error (no rollback in that path). Otherwise
    /// blocks until SIGINT/SIGTERM or [`Shutdown::trigger`], then tears
    /// down and returns the result of [`App::stop`].
    pub async fn run(self) -> Result<(), LifecycleError> {
        let root = CancellationToken::new();
        let _cancel_on_exit = root.clone().drop_guard();

        // Subscribe before starting so a trigger fired during startup is
        // buffered rather than lost.
        let trigger = self.shutdown.subscribe();

        self.start(root.clone()).await?;
        tracing::info!(components = self.components.len(), "application started");

        for (index, hook) in self.after_start.iter().enumerate() {
            if let Err(cause) = hook(root.clone()).await {
                tracing::error!(hook = index, error = %cause, "after-start hook failed");
                return Err(LifecycleError::AfterStartHook { index, cause });
            }
        }

        let reason = signals::wait_for_shutdown(trigger).await;
        tracing::info!(%reason, "shutting down");

        for (index, hook) in self.before_stop.iter().enumerate() {
            if let Err(error) = hook(root.clone()).await {
                // Remaining hooks still run.
                tracing::error!(hook = index, %error, "before-stop hook failed");
            }
        }

        let result = self.stop(root.clone()).await;
        match &result {
            Ok(()) => tracing::info!("application stopped gracefully"),
            Err(error) => tracing::error!(%error, "shutdown finished with errors"),
        }
        result
    }
}
