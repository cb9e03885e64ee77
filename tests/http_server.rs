//! HTTP server component end-to-end tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use chassis::components::HttpServerComponent;
use chassis::config::schema::ServerSettings;
use chassis::http::{success, ApiError, ApiResponse};
use chassis::lifecycle::{App, AppConfig};

fn test_settings() -> ServerSettings {
    ServerSettings {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..ServerSettings::default()
    }
}

async fn ok_handler() -> impl IntoResponse {
    success(serde_json::json!({ "ping": "pong" }))
}

async fn fail_handler() -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    Err(ApiError::business("quota exceeded"))
}

async fn panic_handler() -> &'static str {
    panic!("boom");
}

async fn wait_for_addr(server: &HttpServerComponent) -> SocketAddr {
    for _ in 0..50 {
        if let Some(addr) = server.local_addr() {
            return addr;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("server did not start");
}

#[tokio::test]
async fn serves_envelopes_and_recovers_from_panics() {
    let server = Arc::new(HttpServerComponent::new(test_settings(), |router| {
        router
            .route("/ok", get(ok_handler))
            .route("/fail", get(fail_handler))
            .route("/panic", get(panic_handler))
    }));

    let mut app = App::new(AppConfig::default());
    app.register_component(server.clone());
    let shutdown = app.shutdown_handle();
    let running = tokio::spawn(app.run());

    let addr = wait_for_addr(&server).await;
    let client = reqwest::Client::new();

    // Success envelope.
    let response = client
        .get(format!("http://{addr}/ok"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(
        response.headers().get("x-request-id").is_some(),
        "request id should be propagated to the response"
    );
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], 0);
    assert_eq!(body["message"], "success");
    assert_eq!(body["data"]["ping"], "pong");

    // Application errors keep a 200 transport status; the business code
    // carries the outcome.
    let response = client
        .get(format!("http://{addr}/fail?debug=1"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], 4000);
    assert_eq!(body["message"], "quota exceeded");
    // Default environment is production: no detail, no request echo.
    assert!(body.get("error_location").is_none());
    assert!(body.get("request").is_none());

    // A panicking handler is recovered into a server-error envelope with
    // the canonical (redacted) message.
    let response = client
        .get(format!("http://{addr}/panic"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], 5000);
    assert_eq!(body["message"], "Internal Server Error");

    // Graceful teardown.
    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("run did not finish")
        .unwrap()
        .unwrap();

    // The listener is gone after shutdown.
    assert!(client
        .get(format!("http://{addr}/ok"))
        .timeout(Duration::from_secs(1))
        .send()
        .await
        .is_err());
}

#[tokio::test]
async fn binding_an_occupied_port_fails_startup() {
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = taken.local_addr().unwrap();

    let settings = ServerSettings {
        host: addr.ip().to_string(),
        port: addr.port(),
        ..ServerSettings::default()
    };
    let server = Arc::new(HttpServerComponent::new(settings, |router| router));

    let mut app = App::new(AppConfig::default());
    app.register_component(server);

    let error = app.run().await.unwrap_err();
    assert!(error.to_string().contains("failed to bind"));
}
