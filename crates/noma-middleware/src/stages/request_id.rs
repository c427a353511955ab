//! Request ID middleware.
//!
//! Assigns every request a correlation ID used in server logs and echoed
//! to the client in the `X-Request-ID` response header.
//!
//! ## Request ID Sources
//!
//! 1. **Request attribute**: set by a host that needs the ID before the
//!    pipeline runs (e.g. to answer a body-read failure)
//! 2. **X-Request-ID header**: used when incoming IDs are trusted and the
//!    value is a valid UUID
//! 3. **Generated UUID v7**: otherwise
//!
//! UUID v7 is time-ordered, so IDs sort by arrival in log searches.

use http::{HeaderMap, HeaderValue};
use noma_core::{ApiRequest, ApiResult, BoxFuture, Response};
use uuid::Uuid;

use crate::middleware::{Middleware, Next};

/// The header name for request ID propagation.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Middleware that generates or extracts request IDs.
///
/// # Behavior
///
/// 1. Check for `X-Request-ID` header (only when trusted)
/// 2. If absent or invalid, generate a new UUID v7
/// 3. Store the ID in the request attributes
/// 4. Add the ID to the response, or to the error's headers
#[derive(Debug, Clone, Default)]
pub struct RequestIdMiddleware {
    /// Whether to trust incoming request ID headers.
    trust_incoming: bool,
}

impl RequestIdMiddleware {
    /// Creates a middleware that always generates a fresh ID.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a middleware that reuses valid incoming `X-Request-ID` headers.
    #[must_use]
    pub fn trust_incoming() -> Self {
        Self { trust_incoming: true }
    }

    /// Returns the ID for `request`, preferring one already attached.
    pub fn request_id_for(&self, request: &ApiRequest) -> Uuid {
        request
            .request_id()
            .unwrap_or_else(|| resolve_request_id(request.headers(), self.trust_incoming))
    }
}

/// Returns the incoming `X-Request-ID` if trusted and a valid UUID,
/// otherwise a fresh UUID v7.
pub fn resolve_request_id(headers: &HeaderMap, trust_incoming: bool) -> Uuid {
    headers
        .get(REQUEST_ID_HEADER)
        .filter(|_| trust_incoming)
        .and_then(|value| value.to_str().ok())
        .and_then(|s| Uuid::try_parse(s).ok())
        .unwrap_or_else(Uuid::now_v7)
}

impl Middleware for RequestIdMiddleware {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn process<'a>(
        &'a self,
        request: ApiRequest,
        next: Next<'a>,
    ) -> BoxFuture<'a, ApiResult<Response>> {
        Box::pin(async move {
            let request_id = self.request_id_for(&request);
            let id = request_id.hyphenated().to_string();

            match next.run(request.with_request_id(request_id)).await {
                Ok(mut response) => {
                    if let Ok(value) = HeaderValue::from_str(&id) {
                        response.headers_mut().insert(REQUEST_ID_HEADER, value);
                    }
                    Ok(response)
                }
                Err(error) => Err(error.with_header(http::HeaderName::from_static(REQUEST_ID_HEADER), &id)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::Terminal;
    use http::StatusCode;
    use noma_core::{ApiError, ResponseExt};
    use std::sync::Arc;

    fn request_with_id(request_id: Option<&str>) -> ApiRequest {
        let mut builder = http::Request::builder().uri("/test");
        if let Some(id) = request_id {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        ApiRequest::from_http(builder.body(bytes::Bytes::new()).unwrap())
    }

    /// Echoes the request ID attribute back in the body.
    fn echo_terminal() -> Terminal {
        Arc::new(|req: ApiRequest| -> BoxFuture<'static, ApiResult<Response>> {
            let id = req.request_id().map(|id| id.to_string()).unwrap_or_default();
            Box::pin(async move { Ok(Response::message(StatusCode::OK, &id)) })
        })
    }

    fn header(response: &Response) -> &str {
        response.headers().get(REQUEST_ID_HEADER).unwrap().to_str().unwrap()
    }

    #[tokio::test]
    async fn test_generates_request_id_when_missing() {
        let middleware = RequestIdMiddleware::new();
        let terminal = echo_terminal();

        let response = middleware
            .process(request_with_id(None), Next::terminal(&terminal))
            .await
            .unwrap();

        let id = Uuid::parse_str(header(&response)).unwrap();
        assert_eq!(id.get_version_num(), 7);

        let body = noma_core::read_body(response).await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], id.to_string());
    }

    #[tokio::test]
    async fn test_ignores_incoming_id_when_not_trusted() {
        let middleware = RequestIdMiddleware::new();
        let terminal = echo_terminal();
        let incoming = "01234567-89ab-7def-8123-456789abcdef";

        let response = middleware
            .process(request_with_id(Some(incoming)), Next::terminal(&terminal))
            .await
            .unwrap();

        assert_ne!(header(&response), incoming);
    }

    #[tokio::test]
    async fn test_uses_incoming_id_when_trusted() {
        let middleware = RequestIdMiddleware::trust_incoming();
        let terminal = echo_terminal();
        let incoming = "01234567-89ab-7def-8123-456789abcdef";

        let response = middleware
            .process(request_with_id(Some(incoming)), Next::terminal(&terminal))
            .await
            .unwrap();

        assert_eq!(header(&response), incoming);
    }

    #[tokio::test]
    async fn test_ignores_invalid_incoming_id() {
        let middleware = RequestIdMiddleware::trust_incoming();
        let terminal = echo_terminal();

        let response = middleware
            .process(request_with_id(Some("not-a-valid-uuid")), Next::terminal(&terminal))
            .await
            .unwrap();

        assert_ne!(header(&response), "not-a-valid-uuid");
        assert!(Uuid::parse_str(header(&response)).is_ok());
    }

    #[tokio::test]
    async fn test_header_is_attached_to_errors() {
        let middleware = RequestIdMiddleware::new();
        let terminal: Terminal = Arc::new(|_req: ApiRequest| -> BoxFuture<'static, ApiResult<Response>> {
            Box::pin(async { Err(ApiError::not_found("Not Found")) })
        });

        let err = middleware
            .process(request_with_id(None), Next::terminal(&terminal))
            .await
            .unwrap_err();

        assert!(err.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_keeps_host_assigned_id() {
        let middleware = RequestIdMiddleware::new();
        let terminal = echo_terminal();
        let assigned = Uuid::now_v7();

        let response = middleware
            .process(request_with_id(None).with_request_id(assigned), Next::terminal(&terminal))
            .await
            .unwrap();

        assert_eq!(header(&response), assigned.to_string());
    }

    #[test]
    fn test_resolve_request_id() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("01234567-89ab-7def-8123-456789abcdef"));

        assert_eq!(
            resolve_request_id(&headers, true).to_string(),
            "01234567-89ab-7def-8123-456789abcdef"
        );
        assert_eq!(resolve_request_id(&headers, false).get_version_num(), 7);
        assert_eq!(resolve_request_id(&HeaderMap::new(), true).get_version_num(), 7);
    }

    #[test]
    fn test_middleware_name() {
        assert_eq!(RequestIdMiddleware::new().name(), "request_id");
        assert!(RequestIdMiddleware::trust_incoming().trust_incoming);
    }
}
