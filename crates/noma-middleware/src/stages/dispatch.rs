//! Endpoint dispatch.
//!
//! Resolves the `(version, endpoint)` attributes against the startup-time
//! [`EndpointRegistry`] and attaches the handler. Unknown pairs fail closed
//! with 404.

use std::sync::Arc;

use noma_core::{ApiError, ApiRequest, ApiResult, BoxFuture, EndpointRegistry, Response};

use crate::middleware::{Middleware, Next};

/// Resolves and attaches the endpoint handler.
#[derive(Debug, Clone)]
pub struct DispatchMiddleware {
    registry: Arc<EndpointRegistry>,
}

impl DispatchMiddleware {
    /// Creates the stage over a read-only registry.
    #[must_use]
    pub fn new(registry: Arc<EndpointRegistry>) -> Self {
        Self { registry }
    }

    /// Returns `request` with its handler attached.
    pub fn dispatch(&self, request: ApiRequest) -> ApiResult<ApiRequest> {
        let Some(endpoint) = request.endpoint() else {
            return Err(ApiError::not_found("Endpoint not found"));
        };

        let handler = self
            .registry
            .resolve(request.version().unwrap_or_default(), endpoint)
            .ok_or_else(|| {
                // Report the name the client sent, not the registry form
                let raw = request
                    .route_params()
                    .and_then(|params| params.endpoint.as_deref())
                    .unwrap_or(endpoint);
                ApiError::not_found(format!("Endpoint {raw} not found"))
            })?;

        Ok(request.with_handler(handler))
    }
}

impl Middleware for DispatchMiddleware {
    fn name(&self) -> &'static str {
        "dispatch"
    }

    fn process<'a>(
        &'a self,
        request: ApiRequest,
        next: Next<'a>,
    ) -> BoxFuture<'a, ApiResult<Response>> {
        Box::pin(async move {
            let request = self.dispatch(request)?;
            tracing::debug!(
                version = request.version().unwrap_or_default(),
                endpoint = request.endpoint().unwrap_or_default(),
                "Resolved endpoint handler"
            );
            next.run(request).await
        })
    }
}
