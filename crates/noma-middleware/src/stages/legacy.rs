//! Legacy request adaptation.
//!
//! The host framework in front of the API attaches a
//! [`LegacyRequest`](noma_core::LegacyRequest) carrying the placeholders its
//! URL router extracted. This stage is the only place that looks at it:
//!
//! - requests the host did not flag as API requests are rejected unless
//!   they target a static endpoint
//! - the route placeholders become [`RouteParams`]
//! - a body on anything but POST/PUT is rejected
//! - a JSON body on POST/PUT is decoded; malformed JSON is a 400

use noma_core::{ApiError, ApiRequest, ApiResult, BoxFuture, HttpMethod, Response, RouteParams};
use serde_json::Value;

use crate::middleware::{Middleware, Next};

/// Message for a body sent with a method that does not allow one.
pub const BODY_NOT_ALLOWED: &str = "Invalid request: Body is only allowed for POST and PUT requests";

/// Adapts the host request into pipeline attributes.
#[derive(Debug, Clone, Default)]
pub struct LegacyAdaptationMiddleware {
    static_endpoints: Vec<String>,
}

impl LegacyAdaptationMiddleware {
    /// Creates the stage with the endpoint names that bypass the API flag.
    #[must_use]
    pub fn new(static_endpoints: Vec<String>) -> Self {
        Self { static_endpoints }
    }

    fn is_static_endpoint(&self, endpoint: Option<&str>) -> bool {
        endpoint.is_some_and(|endpoint| {
            self.static_endpoints
                .iter()
                .any(|name| name.eq_ignore_ascii_case(endpoint))
        })
    }

    /// Applies the adaptation rules, returning the enriched request.
    pub fn adapt(&self, request: ApiRequest) -> ApiResult<ApiRequest> {
        let legacy = request
            .legacy()
            .cloned()
            .ok_or_else(|| ApiError::bad_request("Invalid request: No host request to adapt"))?;

        if !legacy.is_api_request() && !self.is_static_endpoint(legacy.param("endpoint")) {
            return Err(ApiError::bad_request("Invalid request: Not an API request"));
        }

        let params = RouteParams {
            version: legacy.param("version").map(str::to_string),
            endpoint: legacy.param("endpoint").map(str::to_string),
            identifier: legacy.param("identifier").map(str::to_string),
        };
        let request = request.with_route_params(params);

        if !request.has_body() {
            return Ok(request);
        }

        let body_allowed = HttpMethod::try_from(request.method()).is_ok_and(HttpMethod::allows_body);
        if !body_allowed {
            return Err(ApiError::bad_request(BODY_NOT_ALLOWED));
        }

        if !request.has_json_content_type() {
            return Ok(request);
        }

        let body: Value = serde_json::from_slice(request.body()).map_err(|e| {
            ApiError::bad_request(format!("Invalid request: Failed to parse JSON body: {e}"))
        })?;

        Ok(request.with_parsed_body(body))
    }
}

impl Middleware for LegacyAdaptationMiddleware {
    fn name(&self) -> &'static str {
        "legacy_adaptation"
    }

    fn process<'a>(
        &'a self,
        request: ApiRequest,
        next: Next<'a>,
    ) -> BoxFuture<'a, ApiResult<Response>> {
        Box::pin(async move {
            let request = self.adapt(request)?;
            tracing::debug!(
                route = ?request.route_params(),
                json_body = request.parsed_body().is_some(),
                "Adapted host request"
            );
            next.run(request).await
        })
    }
}
