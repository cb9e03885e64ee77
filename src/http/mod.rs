//! HTTP layer conventions.
//!
//! # Data Flow
//! ```text
//! request
//!     → request.rs (request ID, capture method/path/query/body)
//!     → application handlers
//!     → response.rs (unified envelope: code + message + data)
//!
//! handler error / panic
//!     → error.rs (ApiError taxonomy, business code from code.rs)
//!     → response.rs (error envelope, detail redacted in production)
//! ```
//!
//! # Design Decisions
//! - The business code inside the envelope signals the outcome; the
//!   transport status stays 200 for application-level errors
//! - Error detail, origin location, and the captured request are only
//!   serialized outside production

pub mod code;
pub mod error;
pub mod pagination;
pub mod request;
pub mod response;

pub use code::ApiCode;
pub use error::{ApiError, FieldError};
pub use request::{RequestInfo, X_REQUEST_ID};
pub use response::{success, ApiResponse};
