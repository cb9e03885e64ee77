//! Request capture.
//!
//! # Responsibilities
//! - Record client IP, method, path, query, and body for each request
//! - Make the capture available to handlers and to error rendering
//! - Re-render error responses with the captured request attached
//!
//! # Design Decisions
//! - Bodies are only buffered when a Content-Length within the capture
//!   limit is present; streaming uploads pass through untouched
//! - The capture rides request extensions, so handlers can extract it
//!   without a dedicated state type

use axum::body::{to_bytes, Body};
use axum::extract::{ConnectInfo, Request};
use axum::http::header::CONTENT_LENGTH;
use axum::middleware::Next;
use axum::response::Response;
use serde::Serialize;
use serde_json::Value;
use std::net::SocketAddr;

use crate::http::error::ApiError;
use crate::http::response;
use crate::observability::metrics;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Bodies larger than this are not captured.
const BODY_CAPTURE_LIMIT: usize = 1024 * 1024;

/// Snapshot of an incoming request, attached to error envelopes outside
/// production.
#[derive(Debug, Clone, Serialize)]
pub struct RequestInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    pub method: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Middleware capturing the request and enriching error responses.
///
/// Runs outside the panic-recovery layer so that both handler errors and
/// recovered panics are re-rendered with the captured request attached.
pub async fn capture_context(request: Request, next: Next) -> Response {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string());
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let query = request.uri().query().map(parse_query);

    let (request, body) = buffer_body(request).await;

    let info = RequestInfo {
        ip,
        method,
        path,
        query,
        body,
        request_id,
    };
    let mut request = request;
    request.extensions_mut().insert(info.clone());

    let mut response = next.run(request).await;
    if let Some(error) = response.extensions_mut().remove::<ApiError>() {
        tracing::error!(
            code = error.code().value(),
            %error,
            location = error.location().unwrap_or(""),
            path = %info.path,
            "request failed"
        );
        metrics::record_api_error(&info.path, error.code().value());
        return response::render_error(&error, Some(&info));
    }
    response
}

/// Buffer the body for capture when it is small enough, handing the
/// request back intact either way.
async fn buffer_body(request: Request) -> (Request, Option<Value>) {
    let capturable = request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok())
        .is_some_and(|length| length > 0 && length <= BODY_CAPTURE_LIMIT);
    if !capturable {
        return (request, None);
    }

    let (parts, body) = request.into_parts();
    match to_bytes(body, BODY_CAPTURE_LIMIT).await {
        Ok(bytes) => {
            let captured = parse_body(&bytes);
            let request = Request::from_parts(parts, Body::from(bytes));
            (request, captured)
        }
        Err(_) => (Request::from_parts(parts, Body::empty()), None),
    }
}

fn parse_query(query: &str) -> Value {
    let map: serde_json::Map<String, Value> = url::form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
        .collect();
    Value::Object(map)
}

fn parse_body(bytes: &[u8]) -> Option<Value> {
    if bytes.is_empty() {
        return None;
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(
            String::from_utf8_lossy(bytes).into_owned(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_parses_to_object() {
        let value = parse_query("page=2&q=abc");
        assert_eq!(value["page"], "2");
        assert_eq!(value["q"], "abc");
    }

    #[test]
    fn body_falls_back_to_string() {
        assert_eq!(parse_body(b""), None);
        assert_eq!(parse_body(br#"{"a":1}"#), Some(serde_json::json!({"a": 1})));
        assert_eq!(parse_body(b"plain"), Some(Value::String("plain".into())));
    }
}
