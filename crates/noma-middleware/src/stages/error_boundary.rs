//! Error boundary middleware.
//!
//! The boundary is the single place where failures become wire responses.
//! Everything inside it either succeeds or returns `Err(ApiError)`; the
//! boundary renders that error as
//!
//! ```json
//! { "message": "Invalid request: Identifier is required" }
//! ```
//!
//! with the error's status code and headers (e.g. `Allow` on 405).
//!
//! Two more failure modes are closed here:
//!
//! - **Panics** in a stage or handler are caught and answered with a 500
//!   carrying only the configured generic message. The panic payload goes
//!   to the server log.
//! - **Deadlines**: if the request carries a deadline, the inner pipeline
//!   runs under [`tokio::time::timeout_at`]. When it elapses the inner future
//!   is dropped and the client gets 504 `Request timed out`.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use noma_core::{ApiError, ApiRequest, ApiResult, BoxFuture, Response, ResponseExt};

use crate::middleware::{Middleware, Next};

/// Message returned when the request deadline elapses.
pub const TIMEOUT_MESSAGE: &str = "Request timed out";

/// Middleware that converts every failure into a JSON error response.
#[derive(Debug, Clone)]
pub struct ErrorBoundaryMiddleware {
    /// Message sent to clients when the pipeline panics.
    internal_error_message: String,
}

impl Default for ErrorBoundaryMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorBoundaryMiddleware {
    /// Creates a boundary with the default generic message.
    #[must_use]
    pub fn new() -> Self {
        Self {
            internal_error_message: "An internal error occurred".to_string(),
        }
    }

    /// Sets the generic message for panics.
    #[must_use]
    pub fn internal_error_message(mut self, message: &str) -> Self {
        self.internal_error_message = message.to_string();
        self
    }

    fn render(&self, error: &ApiError, ctx: &LogContext) -> Response {
        let status = error.status_code().as_u16();

        if error.kind().is_server_error() {
            match error.cause() {
                Some(cause) => tracing::error!(
                    request_id = %ctx.request_id,
                    http.method = %ctx.method,
                    http.path = %ctx.path,
                    http.status_code = status,
                    error = %error,
                    cause = ?cause,
                    "Request failed"
                ),
                None => tracing::error!(
                    request_id = %ctx.request_id,
                    http.method = %ctx.method,
                    http.path = %ctx.path,
                    http.status_code = status,
                    error = %error,
                    "Request failed"
                ),
            }
        } else {
            tracing::debug!(
                request_id = %ctx.request_id,
                http.method = %ctx.method,
                http.path = %ctx.path,
                http.status_code = status,
                error = %error,
                "Request rejected"
            );
        }

        Response::from_error(error)
    }

    fn render_panic(&self, payload: &(dyn Any + Send), ctx: &LogContext) -> Response {
        tracing::error!(
            request_id = %ctx.request_id,
            http.method = %ctx.method,
            http.path = %ctx.path,
            panic = panic_message(payload),
            "Request handler panicked"
        );

        Response::from_error(&ApiError::internal(self.internal_error_message.as_str()))
    }
}

/// Request details captured before the request moves inwards.
struct LogContext {
    request_id: String,
    method: http::Method,
    path: String,
}

impl LogContext {
    fn capture(request: &ApiRequest) -> Self {
        Self {
            request_id: request
                .request_id()
                .map(|id| id.to_string())
                .unwrap_or_default(),
            method: request.method().clone(),
            path: request.path().to_string(),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

impl Middleware for ErrorBoundaryMiddleware {
    fn name(&self) -> &'static str {
        "error_boundary"
    }

    fn process<'a>(
        &'a self,
        request: ApiRequest,
        next: Next<'a>,
    ) -> BoxFuture<'a, ApiResult<Response>> {
        Box::pin(async move {
            let ctx = LogContext::capture(&request);
            let deadline = request.deadline();
            let inner = AssertUnwindSafe(next.run(request)).catch_unwind();

            let outcome = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, inner).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        tracing::warn!(
                            request_id = %ctx.request_id,
                            http.method = %ctx.method,
                            http.path = %ctx.path,
                            "Request deadline elapsed"
                        );
                        return Ok(Response::from_error(&ApiError::timeout(TIMEOUT_MESSAGE)));
                    }
                },
                None => inner.await,
            };

            let response = match outcome {
                Ok(Ok(response)) => response,
                Ok(Err(error)) => self.render(&error, &ctx),
                Err(payload) => self.render_panic(payload.as_ref(), &ctx),
            };

            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::Terminal;
    use http::StatusCode;
    use noma_core::{read_body, HttpMethod};
    use std::sync::Arc;
    use std::time::Duration;

    fn request() -> ApiRequest {
        ApiRequest::new(http::Method::GET, http::Uri::from_static("/api/v1/contacts"))
    }

    fn terminal<F>(f: F) -> Terminal
    where
        F: Fn(ApiRequest) -> BoxFuture<'static, ApiResult<Response>> + Send + Sync + 'static,
    {
        Arc::new(f)
    }

    async fn explode() -> ApiResult<Response> {
        panic!("index out of bounds: secret")
    }

    async fn body_json(response: Response) -> serde_json::Value {
        serde_json::from_slice(&read_body(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_passes_success_through() {
        let boundary = ErrorBoundaryMiddleware::new();
        let t = terminal(|_| Box::pin(async { Ok(Response::empty(StatusCode::NO_CONTENT)) }));

        let response = boundary.process(request(), Next::terminal(&t)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_renders_typed_error_with_headers() {
        let boundary = ErrorBoundaryMiddleware::new();
        let t = terminal(|_| {
            Box::pin(async {
                Err(ApiError::method_not_allowed("Method PATCH is not allowed for endpoint contacts")
                    .with_allow(&HttpMethod::ALL))
            })
        });

        let response = boundary.process(request(), Next::terminal(&t)).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            response.headers().get(http::header::ALLOW).unwrap(),
            "GET, POST, PUT, DELETE"
        );
        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "message": "Method PATCH is not allowed for endpoint contacts" })
        );
    }

    #[tokio::test]
    async fn test_internal_error_source_is_not_exposed() {
        let boundary = ErrorBoundaryMiddleware::new();
        let t = terminal(|_| {
            Box::pin(async {
                let io = std::io::Error::new(std::io::ErrorKind::Other, "secret stack detail");
                Err(ApiError::internal_with_source("An internal error occurred", io))
            })
        });

        let response = boundary.process(request(), Next::terminal(&t)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_body(response).await;
        assert!(!String::from_utf8_lossy(&body).contains("secret stack detail"));
    }

    #[tokio::test]
    async fn test_panic_becomes_generic_500() {
        let boundary = ErrorBoundaryMiddleware::new().internal_error_message("Something broke");
        let t = terminal(|_| Box::pin(explode()));

        let response = boundary.process(request(), Next::terminal(&t)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "message": "Something broke" })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_elapsed_is_504() {
        let boundary = ErrorBoundaryMiddleware::new();
        let t = terminal(|_| {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(Response::empty(StatusCode::OK))
            })
        });

        let deadline = tokio::time::Instant::now() + Duration::from_millis(100);
        let response = boundary
            .process(request().with_deadline(deadline), Next::terminal(&t))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "message": TIMEOUT_MESSAGE })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_not_reached() {
        let boundary = ErrorBoundaryMiddleware::new();
        let t = terminal(|_| {
            Box::pin(async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(Response::empty(StatusCode::OK))
            })
        });

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        let response = boundary
            .process(request().with_deadline(deadline), Next::terminal(&t))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_panic_message_extraction() {
        let literal: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(literal.as_ref()), "boom");

        let owned: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(owned.as_ref()), "bang");

        let other: Box<dyn Any + Send> = Box::new(42_u32);
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }
}
