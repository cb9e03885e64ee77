//! Application error taxonomy for the HTTP layer.

use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::panic::Location;

use crate::config::Environment;
use crate::http::code::ApiCode;
use crate::http::response;

/// One field that failed request validation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub rule: String,
}

/// An application-level error rendered through the unified envelope.
///
/// Constructors capture the caller's source location, which is exposed
/// in the envelope outside production to point at where the error was
/// raised.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    code: ApiCode,
    message: String,
    /// Underlying cause, shown only outside production.
    detail: Option<String>,
    /// file:line where the error was constructed.
    location: Option<String>,
    fields: Vec<FieldError>,
}

impl ApiError {
    #[track_caller]
    fn at(code: ApiCode, message: String) -> Self {
        let location = Location::caller();
        Self {
            code,
            message,
            detail: None,
            location: Some(format!("{}:{}", location.file(), location.line())),
            fields: Vec::new(),
        }
    }

    /// A business rule violation, reported as a bad request.
    #[track_caller]
    pub fn business(message: impl Into<String>) -> Self {
        Self::at(ApiCode::BadRequest, message.into())
    }

    /// An error with an explicit business code.
    #[track_caller]
    pub fn custom(code: ApiCode, message: impl Into<String>) -> Self {
        Self::at(code, message.into())
    }

    /// Request validation failure with the offending fields.
    #[track_caller]
    pub fn validation(message: impl Into<String>, fields: Vec<FieldError>) -> Self {
        let mut error = Self::at(ApiCode::BadRequestValidation, message.into());
        error.fields = fields;
        error
    }

    /// A downstream service call failed.
    #[track_caller]
    pub fn client(message: impl Into<String>) -> Self {
        Self::at(ApiCode::NetworkRequestError, message.into())
    }

    #[track_caller]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::at(ApiCode::NotFound, message.into())
    }

    #[track_caller]
    pub fn unauthorized() -> Self {
        Self::at(
            ApiCode::Unauthorized,
            ApiCode::Unauthorized.message().to_string(),
        )
    }

    #[track_caller]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::at(ApiCode::Forbidden, message.into())
    }

    #[track_caller]
    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::at(ApiCode::TooManyRequests, message.into())
    }

    /// An internal failure. The message is replaced by the canonical one
    /// in production.
    #[track_caller]
    pub fn server(message: impl Into<String>) -> Self {
        Self::at(ApiCode::ServerError, message.into())
    }

    pub fn code(&self) -> ApiCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub(crate) fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub(crate) fn fields(&self) -> &[FieldError] {
        &self.fields
    }

    /// Message as rendered for the given environment: internal causes
    /// are collapsed to their canonical message in production.
    pub(crate) fn public_message(&self, env: Environment) -> &str {
        if env.is_production() && self.redact_in_production() {
            self.code.message()
        } else {
            &self.message
        }
    }

    fn redact_in_production(&self) -> bool {
        matches!(
            self.code,
            ApiCode::SqlError | ApiCode::ServerError | ApiCode::ServiceUnavailable
        )
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        Self {
            code: ApiCode::SqlError,
            message: error.to_string(),
            detail: std::error::Error::source(&error).map(ToString::to_string),
            location: None,
            fields: Vec::new(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        response::error_response(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_capture_location() {
        let error = ApiError::business("quota exceeded");
        assert_eq!(error.code(), ApiCode::BadRequest);
        assert!(error.location().unwrap().contains("error.rs"));
    }

    #[test]
    fn production_redacts_internal_causes() {
        let error = ApiError::server("replica 2 unreachable");
        assert_eq!(error.public_message(Environment::Local), "replica 2 unreachable");
        assert_eq!(
            error.public_message(Environment::Production),
            "Internal Server Error"
        );

        // Business messages are user-facing and pass through everywhere.
        let error = ApiError::business("quota exceeded");
        assert_eq!(error.public_message(Environment::Production), "quota exceeded");
    }
}
