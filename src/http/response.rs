//! Unified response envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;

use crate::config::Environment;
use crate::http::code::ApiCode;
use crate::http::error::{ApiError, FieldError};
use crate::http::request::RequestInfo;

/// The envelope every endpoint answers with.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T = Value> {
    pub code: i32,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_location: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub error_fields: Vec<FieldError>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestInfo>,
}

/// Successful envelope around `data`.
pub fn success<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code: ApiCode::Success.value(),
        message: ApiCode::Success.message().to_string(),
        data: Some(data),
        error_detail: None,
        error_location: None,
        error_fields: Vec::new(),
        request: None,
    })
}

/// Initial rendering of an error, before the capture middleware has had
/// a chance to attach the request. The error itself rides the response
/// extensions so the middleware can re-render with full context.
pub(crate) fn error_response(error: ApiError) -> Response {
    let mut response = render_error(&error, None);
    response.extensions_mut().insert(error);
    response
}

/// Render an error envelope, attaching request context and error origin
/// outside production.
pub(crate) fn render_error(error: &ApiError, request: Option<&RequestInfo>) -> Response {
    let env = Environment::current();

    let mut body = ApiResponse::<Value> {
        code: error.code().value(),
        message: error.public_message(env).to_string(),
        data: None,
        error_detail: None,
        error_location: None,
        error_fields: error.fields().to_vec(),
        request: None,
    };
    if !env.is_production() {
        body.error_detail = error.detail().map(str::to_owned);
        body.error_location = error.location().map(str::to_owned);
        body.request = request.cloned();
    }

    // Application-level failures keep a 200 transport status; the
    // business code carries the outcome.
    (StatusCode::OK, Json(body)).into_response()
}

/// Recovery handler for panicking request handlers.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(%message, "handler panicked");

    ApiError::server(format!("panic error: {message}")).into_response()
}
