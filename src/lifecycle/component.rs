//! The contract between the orchestrator and the units it manages.

use futures_util::future::BoxFuture;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Error type carried across the component boundary.
///
/// Components wrap whatever their underlying client library returns; the
/// orchestrator never inspects it beyond logging and display.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A unit of infrastructure with a two-phase lifecycle.
///
/// The orchestrator only ever calls these two operations. It performs no
/// health-checking, no retries, and no introspection of component state.
///
/// The token handed to `start` is cancelled when the application is torn
/// down; background tasks spawned by the component should exit when it
/// fires. The token handed to `stop` is cancelled once the shutdown
/// deadline has elapsed, so a cooperative component can cut its cleanup
/// short instead of being abandoned mid-flight.
#[async_trait::async_trait]
pub trait Component: Send + Sync {
    /// Bring the component up. Must return promptly; long-running work
    /// (accept loops, pollers) belongs on a spawned task.
    async fn start(&self, ctx: CancellationToken) -> Result<(), BoxError>;

    /// Tear the component down, honoring cancellation of `ctx`.
    async fn stop(&self, ctx: CancellationToken) -> Result<(), BoxError>;
}

/// A single callable run at a fixed lifecycle point.
pub(crate) type Hook = Box<dyn Fn(CancellationToken) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

/// Box an async closure into the stored hook shape.
pub(crate) fn into_hook<F, Fut>(hook: F) -> Hook
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    Box::new(move |ctx| Box::pin(hook(ctx)))
}
