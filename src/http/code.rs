//! Business response codes.
//!
//! Four-digit codes carried inside the response envelope. They follow
//! the HTTP status families (4xxx client, 5xxx server) but are distinct
//! from the transport status, which stays 200 for application errors.

/// Business outcome code with its canonical message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiCode {
    Success,
    MovedPermanently,
    Found,
    SeeOther,
    NotModified,
    TemporaryRedirect,
    BadRequest,
    BadRequestValidation,
    Unauthorized,
    TimestampExpired,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    Gone,
    UnsupportedMediaType,
    UnprocessableEntity,
    TooManyRequests,
    ServerError,
    NotImplemented,
    BadGateway,
    ServiceUnavailable,
    GatewayTimeout,
    HttpVersionNotSupported,
    VariantAlsoNegotiates,
    InsufficientStorage,
    LoopDetected,
    SqlError,
    NotExtended,
    NetworkAuthenticationRequired,
    NetworkConnectTimeout,
    NetworkRequestError,
}

impl ApiCode {
    /// Numeric code serialized into the envelope.
    pub const fn value(self) -> i32 {
        match self {
            ApiCode::Success => 0,
            ApiCode::MovedPermanently => 3010,
            ApiCode::Found => 3020,
            ApiCode::SeeOther => 3030,
            ApiCode::NotModified => 3040,
            ApiCode::TemporaryRedirect => 3070,
            ApiCode::BadRequest => 4000,
            ApiCode::BadRequestValidation => 4001,
            ApiCode::Unauthorized => 4010,
            ApiCode::TimestampExpired => 4011,
            ApiCode::Forbidden => 4030,
            ApiCode::NotFound => 4040,
            ApiCode::MethodNotAllowed => 4050,
            ApiCode::Gone => 4100,
            ApiCode::UnsupportedMediaType => 4150,
            ApiCode::UnprocessableEntity => 4220,
            ApiCode::TooManyRequests => 4290,
            ApiCode::ServerError => 5000,
            ApiCode::NotImplemented => 5010,
            ApiCode::BadGateway => 5020,
            ApiCode::ServiceUnavailable => 5030,
            ApiCode::GatewayTimeout => 5040,
            ApiCode::HttpVersionNotSupported => 5050,
            ApiCode::VariantAlsoNegotiates => 5060,
            ApiCode::InsufficientStorage => 5070,
            ApiCode::LoopDetected => 5080,
            ApiCode::SqlError => 5090,
            ApiCode::NotExtended => 5100,
            ApiCode::NetworkAuthenticationRequired => 5110,
            ApiCode::NetworkConnectTimeout => 5990,
            ApiCode::NetworkRequestError => 5991,
        }
    }

    /// Canonical message for the code.
    pub const fn message(self) -> &'static str {
        match self {
            ApiCode::Success => "success",
            ApiCode::MovedPermanently => "Moved Permanently",
            ApiCode::Found => "Found",
            ApiCode::SeeOther => "See Other",
            ApiCode::NotModified => "Not Modified",
            ApiCode::TemporaryRedirect => "Temporary Redirect",
            ApiCode::BadRequest => "Bad Request",
            ApiCode::BadRequestValidation => "Bad Request",
            ApiCode::Unauthorized => "Unauthorized",
            ApiCode::TimestampExpired => "The request has expired",
            ApiCode::Forbidden => "Forbidden",
            ApiCode::NotFound => "Not Found",
            ApiCode::MethodNotAllowed => "Method Not Allowed",
            ApiCode::Gone => "Gone",
            ApiCode::UnsupportedMediaType => "Unsupported Media Type",
            ApiCode::UnprocessableEntity => "Unprocessable Entity",
            ApiCode::TooManyRequests => "Too Many Requests",
            ApiCode::ServerError => "Internal Server Error",
            ApiCode::NotImplemented => "Not Implemented",
            ApiCode::BadGateway => "Bad Gateway",
            ApiCode::ServiceUnavailable => "Service Unavailable",
            ApiCode::GatewayTimeout => "Gateway Timeout",
            ApiCode::HttpVersionNotSupported => "HTTP Version Not Supported",
            ApiCode::VariantAlsoNegotiates => "Variant Also Negotiates",
            ApiCode::InsufficientStorage => "Insufficient Storage",
            ApiCode::LoopDetected => "Loop Detected",
            ApiCode::SqlError => "Sql Error",
            ApiCode::NotExtended => "Not Extended",
            ApiCode::NetworkAuthenticationRequired => "Network Authentication Required",
            ApiCode::NetworkConnectTimeout => "Network Connect Timeout Error",
            ApiCode::NetworkRequestError => "Network Request Error",
        }
    }
}
