//! HTTP server component.
//!
//! # Responsibilities
//! - Build the Axum router with the framework middleware stack
//! - Bind the listener during `start`; serve on a background task
//! - Drain connections on `stop` within the component's own budget
//!
//! # Design Decisions
//! - Binding happens inside `start` so a bad address fails startup
//!   (and triggers rollback) instead of dying on a detached task
//! - `start` returns as soon as the listener is bound; the accept loop
//!   never blocks the orchestrator

use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::schema::ServerSettings;
use crate::http::request::capture_context;
use crate::http::response::panic_response;
use crate::lifecycle::{BoxError, Component};
use crate::observability::metrics;

/// Serves the application router over HTTP.
///
/// Routes are attached by the caller through a registrar closure; the
/// component owns everything else (middleware, binding, draining).
pub struct HttpServerComponent {
    settings: ServerSettings,
    router: Mutex<Option<Router>>,
    serving: Mutex<Option<Serving>>,
    bound: Mutex<Option<SocketAddr>>,
}

struct Serving {
    handle: JoinHandle<Result<(), std::io::Error>>,
    token: CancellationToken,
}

impl HttpServerComponent {
    /// Create the component, letting `register_routes` attach the
    /// application's handlers before the middleware stack is applied.
    pub fn new<F>(settings: ServerSettings, register_routes: F) -> Self
    where
        F: FnOnce(Router) -> Router,
    {
        let router = Self::apply_middleware(&settings, register_routes(Router::new()));
        Self {
            settings,
            router: Mutex::new(Some(router)),
            serving: Mutex::new(None),
            bound: Mutex::new(None),
        }
    }

    /// Framework middleware, outermost first: request ID assignment and
    /// propagation, tracing, request capture (which also finalizes error
    /// envelopes), metrics, timeout, panic recovery.
    fn apply_middleware(settings: &ServerSettings, routes: Router) -> Router {
        routes.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(capture_context))
                .layer(middleware::from_fn(track_requests))
                .layer(TimeoutLayer::new(settings.request_timeout()))
                .layer(CatchPanicLayer::custom(panic_response)),
        )
    }

    /// Address the listener actually bound to. `None` before `start`.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.bound.lock().expect("http server mutex poisoned")
    }
}

#[async_trait::async_trait]
impl Component for HttpServerComponent {
    async fn start(&self, ctx: CancellationToken) -> Result<(), BoxError> {
        let router = self
            .router
            .lock()
            .expect("http server mutex poisoned")
            .take()
            .ok_or("http server already started")?;

        let addr = format!("{}:{}", self.settings.host, self.settings.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|error| format!("failed to bind {addr}: {error}"))?;
        let local = listener.local_addr()?;
        *self.bound.lock().expect("http server mutex poisoned") = Some(local);

        tracing::info!(address = %local, "http server listening");

        let token = ctx.child_token();
        let shutdown = token.clone().cancelled_owned();
        let handle = tokio::spawn(async move {
            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(shutdown)
            .await
        });

        *self.serving.lock().expect("http server mutex poisoned") = Some(Serving { handle, token });
        Ok(())
    }

    async fn stop(&self, _ctx: CancellationToken) -> Result<(), BoxError> {
        let serving = self.serving.lock().expect("http server mutex poisoned").take();
        let Some(serving) = serving else {
            return Ok(());
        };

        serving.token.cancel();
        match tokio::time::timeout(self.settings.graceful_timeout(), serving.handle).await {
            Ok(Ok(Ok(()))) => {
                tracing::info!("http server stopped");
                Ok(())
            }
            Ok(Ok(Err(error))) => Err(error.into()),
            Ok(Err(join_error)) => Err(join_error.into()),
            Err(_) => Err(format!(
                "http server did not drain within {:?}",
                self.settings.graceful_timeout()
            )
            .into()),
        }
    }
}

/// Record counter and latency for every handled request.
async fn track_requests(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;
    metrics::record_request(&method, &path, response.status().as_u16(), started);
    response
}
