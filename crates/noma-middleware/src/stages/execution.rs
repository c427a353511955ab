//! Endpoint execution.
//!
//! Invokes the handler attached by dispatch. Requests without a handler
//! pass through to the next stage unchanged, which lets the pipeline run
//! with or without per-request dispatch.

use noma_core::{ApiRequest, ApiResult, BoxFuture, Response};

use crate::middleware::{Middleware, Next};

/// Runs the resolved endpoint handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionMiddleware;

impl Middleware for ExecutionMiddleware {
    fn name(&self) -> &'static str {
        "execution"
    }

    fn process<'a>(
        &'a self,
        request: ApiRequest,
        next: Next<'a>,
    ) -> BoxFuture<'a, ApiResult<Response>> {
        Box::pin(async move {
            match request.handler().cloned() {
                Some(handler) => handler.handle(request).await,
                None => next.run(request).await,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::Terminal;
    use http::StatusCode;
    use noma_core::{ApiError, EndpointHandler, HttpMethod, ResponseExt};
    use std::sync::Arc;

    struct Created;

    impl EndpointHandler for Created {
        fn endpoint(&self) -> &str {
            "contacts"
        }

        fn allowed_methods(&self) -> &[HttpMethod] {
            &HttpMethod::ALL
        }

        fn handle<'a>(&'a self, _request: ApiRequest) -> BoxFuture<'a, ApiResult<Response>> {
            Box::pin(async { Ok(Response::empty(StatusCode::CREATED)) })
        }
    }

    fn probe_terminal() -> Terminal {
        Arc::new(|_req: ApiRequest| -> BoxFuture<'static, ApiResult<Response>> {
            Box::pin(async { Err(ApiError::conflict("terminal reached")) })
        })
    }

    fn request() -> ApiRequest {
        ApiRequest::new(http::Method::POST, http::Uri::from_static("/api/v1/contacts"))
    }

    #[tokio::test]
    async fn test_invokes_handler_without_calling_next() {
        let terminal = probe_terminal();
        let response = ExecutionMiddleware
            .process(request().with_handler(Arc::new(Created)), Next::terminal(&terminal))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_passes_through_without_handler() {
        let terminal = probe_terminal();
        let err = ExecutionMiddleware
            .process(request(), Next::terminal(&terminal))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "terminal reached");
    }
}
