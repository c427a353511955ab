//! The request value threaded through the pipeline.
//!
//! An [`ApiRequest`] is created once per inbound call and moved from stage
//! to stage. Stages never mutate a request in place: every `with_*` method
//! consumes the request and returns a new value carrying one more
//! attribute, so a stage only ever observes the attributes set by the
//! stages in front of it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use serde_json::Value;
use tokio::time::Instant;
use uuid::Uuid;

use crate::endpoint::EndpointHandler;
use crate::error::{ApiError, ApiResult};
use crate::method::HttpMethod;

/// Route placeholders extracted by the host's URL router.
///
/// Values are kept exactly as the client sent them; normalization is the
/// routing stage's job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    /// API version segment, e.g. `v1`.
    pub version: Option<String>,
    /// Endpoint segment, e.g. `contacts`.
    pub endpoint: Option<String>,
    /// Resource identifier segment.
    pub identifier: Option<String>,
}

impl RouteParams {
    /// Creates route params for a collection route.
    #[must_use]
    pub fn new(version: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
            endpoint: Some(endpoint.into()),
            identifier: None,
        }
    }

    /// Returns these params with an identifier segment.
    #[must_use]
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}

/// What the host framework in front of the API knows about a request.
///
/// Only the legacy adaptation stage reads it; later stages work from the
/// [`RouteParams`] it derives.
#[derive(Debug, Clone, Default)]
pub struct LegacyRequest {
    params: HashMap<String, String>,
    api_request: bool,
}

impl LegacyRequest {
    /// Creates an empty legacy request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a routing parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Flags whether the host considers this an API request.
    #[must_use]
    pub fn with_api_request(mut self, api_request: bool) -> Self {
        self.api_request = api_request;
        self
    }

    /// Returns a routing parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Returns `true` if the host flagged this as an API request.
    #[must_use]
    pub fn is_api_request(&self) -> bool {
        self.api_request
    }
}

/// Pipeline state attached to a request.
///
/// Every field starts unset; stages fill them in as the request moves
/// inwards.
#[derive(Clone, Default)]
pub struct Attributes {
    request_id: Option<Uuid>,
    deadline: Option<Instant>,
    legacy: Option<Arc<LegacyRequest>>,
    route_params: Option<RouteParams>,
    version: Option<String>,
    endpoint: Option<String>,
    identifier: Option<String>,
    http_method: Option<HttpMethod>,
    handler: Option<Arc<dyn EndpointHandler>>,
    parsed_body: Option<Arc<Value>>,
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attributes")
            .field("request_id", &self.request_id)
            .field("deadline", &self.deadline)
            .field("legacy", &self.legacy)
            .field("route_params", &self.route_params)
            .field("version", &self.version)
            .field("endpoint", &self.endpoint)
            .field("identifier", &self.identifier)
            .field("http_method", &self.http_method)
            .field("handler", &self.handler.as_ref().map(|h| h.endpoint().to_string()))
            .field("parsed_body", &self.parsed_body)
            .finish()
    }
}

/// An inbound API request.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use noma_core::{ApiRequest, RouteParams};
///
/// let request = ApiRequest::from_http(
///     http::Request::builder()
///         .method("GET")
///         .uri("/api/v1/contacts?name=foo")
///         .body(Bytes::new())
///         .unwrap(),
/// )
/// .with_route_params(RouteParams::new("v1", "contacts"));
///
/// assert_eq!(request.query(), "name=foo");
/// assert!(request.identifier().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    attributes: Attributes,
}

impl ApiRequest {
    /// Creates a request without headers or body.
    #[must_use]
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            attributes: Attributes::default(),
        }
    }

    /// Creates a request from an `http::Request` with a collected body.
    #[must_use]
    pub fn from_http(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            attributes: Attributes::default(),
        }
    }

    /// Returns the raw request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the URI path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the raw query string, or `""` if there is none.
    #[must_use]
    pub fn query(&self) -> &str {
        self.uri.query().unwrap_or("")
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the `Content-Type` header, if present and valid UTF-8.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Returns `true` if the content type is `application/json`.
    ///
    /// Media type parameters such as `charset` are ignored.
    #[must_use]
    pub fn has_json_content_type(&self) -> bool {
        self.content_type()
            .and_then(|ct| ct.split(';').next())
            .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(crate::JSON_CONTENT_TYPE))
    }

    /// Returns the raw request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns `true` if the request carries a non-empty body.
    #[must_use]
    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }

    /// Returns the request with `body` in place of the current one.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns all pipeline attributes.
    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Returns the request correlation ID.
    #[must_use]
    pub fn request_id(&self) -> Option<Uuid> {
        self.attributes.request_id
    }

    /// Sets the request correlation ID.
    #[must_use]
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.attributes.request_id = Some(request_id);
        self
    }

    /// Returns the instant by which a response must be produced.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.attributes.deadline
    }

    /// Sets the response deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.attributes.deadline = Some(deadline);
        self
    }

    /// Returns the host request awaiting adaptation.
    #[must_use]
    pub fn legacy(&self) -> Option<&LegacyRequest> {
        self.attributes.legacy.as_deref()
    }

    /// Attaches the host request.
    #[must_use]
    pub fn with_legacy(mut self, legacy: LegacyRequest) -> Self {
        self.attributes.legacy = Some(Arc::new(legacy));
        self
    }

    /// Returns the route placeholders supplied by the host.
    #[must_use]
    pub fn route_params(&self) -> Option<&RouteParams> {
        self.attributes.route_params.as_ref()
    }

    /// Sets the route placeholders.
    #[must_use]
    pub fn with_route_params(mut self, params: RouteParams) -> Self {
        self.attributes.route_params = Some(params);
        self
    }

    /// Returns the normalized API version, e.g. `V1`.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.attributes.version.as_deref()
    }

    /// Sets the normalized API version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.attributes.version = Some(version.into());
        self
    }

    /// Returns the normalized endpoint name, e.g. `Contacts`.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.attributes.endpoint.as_deref()
    }

    /// Sets the normalized endpoint name.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.attributes.endpoint = Some(endpoint.into());
        self
    }

    /// Returns the resource identifier, treating an empty one as absent.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.attributes
            .identifier
            .as_deref()
            .filter(|id| !id.is_empty())
    }

    /// Sets the resource identifier.
    #[must_use]
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.attributes.identifier = Some(identifier.into());
        self
    }

    /// Returns the validated HTTP method.
    #[must_use]
    pub fn http_method(&self) -> Option<HttpMethod> {
        self.attributes.http_method
    }

    /// Sets the validated HTTP method.
    #[must_use]
    pub fn with_http_method(mut self, method: HttpMethod) -> Self {
        self.attributes.http_method = Some(method);
        self
    }

    /// Returns the resolved endpoint handler.
    #[must_use]
    pub fn handler(&self) -> Option<&Arc<dyn EndpointHandler>> {
        self.attributes.handler.as_ref()
    }

    /// Attaches the resolved endpoint handler.
    #[must_use]
    pub fn with_handler(mut self, handler: Arc<dyn EndpointHandler>) -> Self {
        self.attributes.handler = Some(handler);
        self
    }

    /// Returns the decoded JSON body.
    #[must_use]
    pub fn parsed_body(&self) -> Option<&Value> {
        self.attributes.parsed_body.as_deref()
    }

    /// Attaches the decoded JSON body.
    #[must_use]
    pub fn with_parsed_body(mut self, body: Value) -> Self {
        self.attributes.parsed_body = Some(Arc::new(body));
        self
    }

    /// Returns the query string decoded into `(name, value)` pairs.
    ///
    /// Decoding follows `application/x-www-form-urlencoded`: `+` is a
    /// space and malformed escapes are kept verbatim.
    pub fn query_pairs(&self) -> ApiResult<Vec<(String, String)>> {
        serde_urlencoded::from_str(self.query())
            .map_err(|e| ApiError::bad_request(format!("Invalid request: Malformed query string: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: &str, uri: &str) -> ApiRequest {
        ApiRequest::from_http(
            http::Request::builder()
                .method(method)
                .uri(uri)
                .body(Bytes::new())
                .unwrap(),
        )
    }

    #[test]
    fn test_new_request_has_no_attributes() {
        let req = request("GET", "/api/v1/contacts");
        assert!(req.version().is_none());
        assert!(req.endpoint().is_none());
        assert!(req.identifier().is_none());
        assert!(req.handler().is_none());
        assert!(req.parsed_body().is_none());
        assert!(req.route_params().is_none());
        assert!(req.request_id().is_none());
    }

    #[test]
    fn test_with_methods_do_not_touch_the_original() {
        let original = request("GET", "/api/v1/contacts");
        let enriched = original.clone().with_version("V1").with_endpoint("Contacts");

        assert!(original.version().is_none());
        assert_eq!(enriched.version(), Some("V1"));
        assert_eq!(enriched.endpoint(), Some("Contacts"));
    }

    #[test]
    fn test_empty_identifier_is_absent() {
        let req = request("DELETE", "/api/v1/contacts").with_identifier("");
        assert!(req.identifier().is_none());
    }

    #[test]
    fn test_query_and_path() {
        let req = request("GET", "/api/v1/contacts?name=foo&x=1");
        assert_eq!(req.path(), "/api/v1/contacts");
        assert_eq!(req.query(), "name=foo&x=1");
        assert_eq!(request("GET", "/api/v1/contacts").query(), "");
    }

    #[test]
    fn test_query_pairs_decoding() {
        let req = request("GET", "/api/v1/contacts?full_name=Jane+Doe&email=a%40b.c&flag&bad=%zz");
        let pairs = req.query_pairs().unwrap();
        assert_eq!(
            pairs,
            vec![
                ("full_name".to_string(), "Jane Doe".to_string()),
                ("email".to_string(), "a@b.c".to_string()),
                ("flag".to_string(), String::new()),
                ("bad".to_string(), "%zz".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_pairs_keep_incomplete_escapes() {
        let pairs = request("GET", "/api/v1/contacts?name=%+1&type=%4").query_pairs().unwrap();
        assert_eq!(
            pairs,
            vec![
                ("name".to_string(), "% 1".to_string()),
                ("type".to_string(), "%4".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_query_has_no_pairs() {
        assert!(request("GET", "/api/v1/contacts").query_pairs().unwrap().is_empty());
    }

    #[test]
    fn test_json_content_type_detection() {
        let req = ApiRequest::from_http(
            http::Request::builder()
                .method("POST")
                .uri("/api/v1/contacts")
                .header("content-type", "application/json; charset=utf-8")
                .body(Bytes::from_static(b"{}"))
                .unwrap(),
        );
        assert!(req.has_json_content_type());
        assert!(req.has_body());

        let form = ApiRequest::from_http(
            http::Request::builder()
                .method("POST")
                .uri("/api/v1/contacts")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Bytes::new())
                .unwrap(),
        );
        assert!(!form.has_json_content_type());
        assert!(!form.has_body());
    }

    #[test]
    fn test_legacy_request_params() {
        let legacy = LegacyRequest::new()
            .with_param("endpoint", "contacts")
            .with_api_request(true);

        assert_eq!(legacy.param("endpoint"), Some("contacts"));
        assert!(legacy.param("version").is_none());
        assert!(legacy.is_api_request());
    }

    #[test]
    fn test_route_params_builder() {
        let params = RouteParams::new("v1", "contacts").with_identifier("abc");
        assert_eq!(params.version.as_deref(), Some("v1"));
        assert_eq!(params.endpoint.as_deref(), Some("contacts"));
        assert_eq!(params.identifier.as_deref(), Some("abc"));
    }
}
