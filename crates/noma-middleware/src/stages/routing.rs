//! Routing attribute extraction.
//!
//! Reads the route params attached during adaptation and re-emits them as
//! normalized `version`, `endpoint` and `identifier` attributes. Missing
//! params stay absent; later stages decide what absence means.

use noma_core::{normalize_route_segment, ApiRequest, ApiResult, BoxFuture, Response};

use crate::middleware::{Middleware, Next};

/// Normalizes route params into request attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutingMiddleware;

impl RoutingMiddleware {
    /// Returns `request` with the normalized routing attributes set.
    #[must_use]
    pub fn route(request: ApiRequest) -> ApiRequest {
        let Some(params) = request.route_params().cloned() else {
            return request;
        };

        let mut request = request;
        if let Some(version) = params.version.as_deref() {
            request = request.with_version(normalize_route_segment(version));
        }
        if let Some(endpoint) = params.endpoint.as_deref() {
            request = request.with_endpoint(normalize_route_segment(endpoint));
        }
        if let Some(identifier) = params.identifier.as_deref() {
            request = request.with_identifier(identifier.to_lowercase());
        }
        request
    }
}

impl Middleware for RoutingMiddleware {
    fn name(&self) -> &'static str {
        "routing"
    }

    fn process<'a>(
        &'a self,
        request: ApiRequest,
        next: Next<'a>,
    ) -> BoxFuture<'a, ApiResult<Response>> {
        Box::pin(async move { next.run(Self::route(request)).await })
    }
}
