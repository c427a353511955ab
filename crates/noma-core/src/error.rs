//! Error types for the NoMa API.
//!
//! Every failure that can reach a client is an [`ApiError`]: an immutable
//! value made of an [`ErrorKind`] (which fixes the HTTP status), a
//! client-visible message and optional response headers such as `Allow`.
//!
//! Stages never turn errors into responses themselves. They return
//! `Err(ApiError)` and the error boundary renders the envelope:
//!
//! ```json
//! { "message": "The given identifier is not a valid UUID" }
//! ```

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`ApiError`].
pub type ApiResult<T> = Result<T, ApiError>;

/// Kinds of errors the API distinguishes.
///
/// Each kind maps to exactly one HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed request, disallowed body/query combination, bad JSON.
    BadRequest,
    /// Missing or invalid credentials.
    Unauthorized,
    /// Unknown endpoint or resource.
    NotFound,
    /// Unsupported verb or verb outside the endpoint's allow-list.
    MethodNotAllowed,
    /// Resource state conflict (e.g. duplicate identifier).
    Conflict,
    /// Request body exceeds the configured limit.
    PayloadTooLarge,
    /// Request content type is not accepted by the endpoint.
    UnsupportedMediaType,
    /// Syntactically valid request with invalid content.
    UnprocessableEntity,
    /// Unhandled failure inside a stage or handler.
    Internal,
    /// The request deadline elapsed before a response was produced.
    Timeout,
}

impl ErrorKind {
    /// Returns the HTTP status code for this error kind.
    #[must_use]
    pub const fn status_code(self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Conflict => StatusCode::CONFLICT,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Returns `true` for kinds that indicate a server-side failure.
    #[must_use]
    pub const fn is_server_error(self) -> bool {
        matches!(self, Self::Internal | Self::Timeout)
    }
}

/// Standard error type for the NoMa API.
///
/// # Example
///
/// ```
/// use noma_core::{ApiError, ErrorKind};
///
/// fn require_identifier(identifier: Option<&str>) -> Result<&str, ApiError> {
///     identifier.ok_or_else(|| ApiError::bad_request("Invalid request: Identifier is required"))
/// }
///
/// let err = require_identifier(None).unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::BadRequest);
/// assert_eq!(err.status_code().as_u16(), 400);
/// ```
#[derive(Error, Debug)]
#[error("{message}")]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
    headers: HeaderMap,
    /// The underlying failure. Logged, never sent to clients.
    #[source]
    source: Option<anyhow::Error>,
}

impl ApiError {
    /// Creates an error of the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            headers: HeaderMap::new(),
            source: None,
        }
    }

    /// Creates a 400 error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    /// Creates a 401 error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    /// Creates a 404 error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Creates a 405 error without an `Allow` header.
    ///
    /// Use [`ApiError::with_allow`] once the permitted methods are known.
    #[must_use]
    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MethodNotAllowed, message)
    }

    /// Creates a 409 error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Creates a 413 error.
    #[must_use]
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PayloadTooLarge, message)
    }

    /// Creates a 415 error.
    #[must_use]
    pub fn unsupported_media_type(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedMediaType, message)
    }

    /// Creates a 422 error.
    #[must_use]
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnprocessableEntity, message)
    }

    /// Creates a 500 error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Creates a 500 error wrapping the failure that caused it.
    ///
    /// `message` is what the client sees; `source` only reaches the logs.
    pub fn internal_with_source(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::internal(message).with_source(source)
    }

    /// Creates a 504 error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Returns a copy of this error with an additional response header.
    ///
    /// Invalid header values are dropped rather than failing the error path.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Returns a copy of this error with an `Allow` header listing `methods`.
    #[must_use]
    pub fn with_allow(self, methods: &[crate::HttpMethod]) -> Self {
        let allow = crate::HttpMethod::allow_header(methods);
        self.with_header(http::header::ALLOW, &allow)
    }

    /// Attaches the underlying failure.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }

    /// Returns the client-visible message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the headers to merge into the error response.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the underlying failure, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.source.as_ref()
    }

    /// Converts this error to the serializable response envelope.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            message: self.message.clone(),
        }
    }
}

/// Serializable error envelope for HTTP responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Human-readable error message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HttpMethod;

    #[test]
    fn test_kind_status_codes() {
        let cases = [
            (ErrorKind::BadRequest, 400),
            (ErrorKind::Unauthorized, 401),
            (ErrorKind::NotFound, 404),
            (ErrorKind::MethodNotAllowed, 405),
            (ErrorKind::Conflict, 409),
            (ErrorKind::PayloadTooLarge, 413),
            (ErrorKind::UnsupportedMediaType, 415),
            (ErrorKind::UnprocessableEntity, 422),
            (ErrorKind::Internal, 500),
            (ErrorKind::Timeout, 504),
        ];

        for (kind, status) in cases {
            assert_eq!(kind.status_code().as_u16(), status, "{kind:?}");
        }
    }

    #[test]
    fn test_only_internal_and_timeout_are_server_errors() {
        assert!(ErrorKind::Internal.is_server_error());
        assert!(ErrorKind::Timeout.is_server_error());
        assert!(!ErrorKind::BadRequest.is_server_error());
        assert!(!ErrorKind::UnprocessableEntity.is_server_error());
    }

    #[test]
    fn test_display_is_message() {
        let error = ApiError::not_found("Endpoint bogus not found");
        assert_eq!(error.to_string(), "Endpoint bogus not found");
        assert_eq!(error.message(), "Endpoint bogus not found");
    }

    #[test]
    fn test_with_allow_sets_header() {
        let error = ApiError::method_not_allowed("nope")
            .with_allow(&[HttpMethod::Get, HttpMethod::Post]);

        assert_eq!(error.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(error.headers().get(http::header::ALLOW).unwrap(), "GET, POST");
    }

    #[test]
    fn test_source_is_not_part_of_envelope() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let error = ApiError::internal_with_source("An internal error occurred", io);

        assert!(error.cause().is_some());
        let envelope = error.to_envelope();
        assert_eq!(envelope.message, "An internal error occurred");

        let json = serde_json::to_string(&envelope).unwrap();
        assert!(!json.contains("disk on fire"));
    }

    #[test]
    fn test_std_error_source_chain() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::Other, "socket closed");
        let error = ApiError::internal("An internal error occurred").with_source(io);
        let source = error.source().expect("source should be exposed");
        assert_eq!(source.to_string(), "socket closed");
    }
}
