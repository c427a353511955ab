//! Endpoint capability and the startup-time endpoint registry.
//!
//! Handlers are registered once under a `(version, endpoint)` pair while the
//! application is wired together. After [`RegistryBuilder::build`] the
//! registry is read-only and can be shared between requests without
//! synchronization.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::ApiResult;
use crate::method::HttpMethod;
use crate::request::ApiRequest;
use crate::response::Response;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A resource collection served under an API version.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use noma_core::{ApiRequest, ApiResult, BoxFuture, EndpointHandler, HttpMethod, Response, ResponseExt};
///
/// struct Ping;
///
/// impl EndpointHandler for Ping {
///     fn endpoint(&self) -> &str {
///         "ping"
///     }
///
///     fn allowed_methods(&self) -> &[HttpMethod] {
///         &[HttpMethod::Get]
///     }
///
///     fn handle<'a>(&'a self, _request: ApiRequest) -> BoxFuture<'a, ApiResult<Response>> {
///         Box::pin(async { Response::data(StatusCode::OK, &"pong") })
///     }
/// }
/// ```
pub trait EndpointHandler: Send + Sync + 'static {
    /// Returns the endpoint name as it appears in the URL, e.g. `contacts`.
    fn endpoint(&self) -> &str;

    /// Returns the methods this endpoint accepts, in `Allow` header order.
    fn allowed_methods(&self) -> &[HttpMethod];

    /// Handles a request that has passed validation.
    fn handle<'a>(&'a self, request: ApiRequest) -> BoxFuture<'a, ApiResult<Response>>;

    /// Returns `true` if `method` is in [`EndpointHandler::allowed_methods`].
    fn allows(&self, method: HttpMethod) -> bool {
        self.allowed_methods().contains(&method)
    }
}

/// Normalizes a version or endpoint route segment to its registry form.
///
/// The first character is uppercased and the rest lowercased, so `v1` and
/// `V1` both map to `V1`, and `contactGroups` maps to
/// `Contactgroups`.
#[must_use]
pub fn normalize_route_segment(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Maps `(version, endpoint)` pairs to endpoint handlers.
#[derive(Clone, Default)]
pub struct EndpointRegistry {
    handlers: HashMap<(String, String), Arc<dyn EndpointHandler>>,
}

impl EndpointRegistry {
    /// Creates a registry builder.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Looks up the handler for a version and endpoint.
    ///
    /// Both segments are normalized first, so callers may pass either raw
    /// or already normalized names.
    #[must_use]
    pub fn resolve(&self, version: &str, endpoint: &str) -> Option<Arc<dyn EndpointHandler>> {
        let key = (normalize_route_segment(version), normalize_route_segment(endpoint));
        self.handlers.get(&key).cloned()
    }

    /// Returns the registered `(version, endpoint)` keys, sorted.
    #[must_use]
    pub fn routes(&self) -> Vec<(&str, &str)> {
        let mut routes: Vec<_> = self
            .handlers
            .keys()
            .map(|(v, e)| (v.as_str(), e.as_str()))
            .collect();
        routes.sort_unstable();
        routes
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for EndpointRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointRegistry")
            .field("routes", &self.routes())
            .finish()
    }
}

/// Builder for [`EndpointRegistry`].
#[derive(Default)]
pub struct RegistryBuilder {
    handlers: HashMap<(String, String), Arc<dyn EndpointHandler>>,
}

impl RegistryBuilder {
    /// Registers `handler` under `version` and the handler's endpoint name.
    ///
    /// A later registration for the same pair replaces the earlier one.
    #[must_use]
    pub fn register<H: EndpointHandler>(self, version: &str, handler: H) -> Self {
        self.register_arc(version, Arc::new(handler))
    }

    /// Registers an already shared handler.
    #[must_use]
    pub fn register_arc(mut self, version: &str, handler: Arc<dyn EndpointHandler>) -> Self {
        let key = (
            normalize_route_segment(version),
            normalize_route_segment(handler.endpoint()),
        );
        self.handlers.insert(key, handler);
        self
    }

    /// Freezes the registry.
    #[must_use]
    pub fn build(self) -> EndpointRegistry {
        EndpointRegistry {
            handlers: self.handlers,
        }
    }
}
