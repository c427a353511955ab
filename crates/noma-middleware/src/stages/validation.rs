//! Request validation middleware.
//!
//! Enforces the method, query, body and identifier rules against the
//! resolved endpoint handler before anything executes. Rules are checked
//! in order and the first violation wins:
//!
//! | # | Rule | Status |
//! |---|------|--------|
//! | 1 | Method parses as a supported verb | 405 + `Allow` |
//! | 2 | Method is in the endpoint's allow-list | 405 + `Allow` |
//! | 3 | Only GET carries a query string | 400 |
//! | 4 | GET does not combine identifier and query string | 400 |
//! | 5 | Only POST and PUT carry a body | 400 |
//! | 6 | PUT and DELETE name an identifier | 400 |
//! | 7 | A present identifier is a valid UUID | 422 |
//!
//! Validation is a pure predicate over the request, so running it twice
//! yields the same outcome.

use noma_core::{
    identifier, ApiError, ApiRequest, ApiResult, BoxFuture, EndpointHandler, HttpMethod, Response,
};

use crate::middleware::{Middleware, Next};
use crate::stages::legacy::BODY_NOT_ALLOWED;

/// Message for an identifier that fails the UUID grammar.
pub const INVALID_IDENTIFIER: &str = "The given identifier is not a valid UUID";

/// Validates requests against the resolved endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationMiddleware;

impl ValidationMiddleware {
    /// Checks `request` against `handler`, returning the validated method.
    pub fn validate(request: &ApiRequest, handler: &dyn EndpointHandler) -> ApiResult<HttpMethod> {
        let allowed = handler.allowed_methods();
        let not_allowed = || {
            ApiError::method_not_allowed(format!(
                "Method {} is not allowed for endpoint {}",
                request.method(),
                handler.endpoint()
            ))
            .with_allow(allowed)
        };

        let method = HttpMethod::try_from(request.method()).map_err(|_| not_allowed())?;
        if !handler.allows(method) {
            return Err(not_allowed());
        }

        let has_query = !request.query().is_empty();
        let resource_id = request.identifier();

        if method != HttpMethod::Get && has_query {
            return Err(ApiError::bad_request(
                "Invalid request: Query parameters are only allowed for GET requests",
            ));
        }

        if method == HttpMethod::Get && resource_id.is_some() && has_query {
            return Err(ApiError::bad_request(
                "Invalid request: Identifier and query parameters are mutually exclusive",
            ));
        }

        if !method.allows_body() && request.has_body() {
            return Err(ApiError::bad_request(BODY_NOT_ALLOWED));
        }

        if method.requires_identifier() && resource_id.is_none() {
            return Err(ApiError::bad_request("Invalid request: Identifier is required"));
        }

        if resource_id.is_some_and(|id| !identifier::is_valid(id)) {
            return Err(ApiError::unprocessable(INVALID_IDENTIFIER));
        }

        Ok(method)
    }
}

impl Middleware for ValidationMiddleware {
    fn name(&self) -> &'static str {
        "validation"
    }

    fn process<'a>(
        &'a self,
        request: ApiRequest,
        next: Next<'a>,
    ) -> BoxFuture<'a, ApiResult<Response>> {
        Box::pin(async move {
            // Nothing to validate against; execution falls through to the terminal
            let Some(handler) = request.handler().cloned() else {
                return next.run(request).await;
            };

            let method = Self::validate(&request, handler.as_ref())?;
            next.run(request.with_http_method(method)).await
        })
    }
}
