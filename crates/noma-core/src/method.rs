//! HTTP verbs supported by the API.
//!
//! Parsing is the first layer of method validation: anything outside
//! `GET`, `POST`, `PUT` and `DELETE` fails with a 405 [`ApiError`], not a
//! generic parse error.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::request::ApiRequest;

/// An HTTP method the API can serve.
///
/// The wire form is uppercase (`GET`); the serialized form is lowercase
/// (`get`). Both projections are available.
///
/// # Example
///
/// ```
/// use noma_core::HttpMethod;
///
/// let method: HttpMethod = "Delete".parse().unwrap();
/// assert_eq!(method, HttpMethod::Delete);
/// assert_eq!(method.uppercase(), "DELETE");
/// assert_eq!(method.lowercase(), "delete");
///
/// let err = "PATCH".parse::<HttpMethod>().unwrap_err();
/// assert_eq!(err.status_code().as_u16(), 405);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    /// Fetch a collection or a single resource.
    Get,
    /// Create a resource.
    Post,
    /// Replace a resource.
    Put,
    /// Remove a resource.
    Delete,
}

impl HttpMethod {
    /// All supported methods, in `Allow` header order.
    pub const ALL: [Self; 4] = [Self::Get, Self::Post, Self::Put, Self::Delete];

    /// Parses the method of a request.
    pub fn from_request(request: &ApiRequest) -> ApiResult<Self> {
        request.method().as_str().parse()
    }

    /// Returns the uppercase wire form.
    #[must_use]
    pub const fn uppercase(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Returns the lowercase form.
    #[must_use]
    pub const fn lowercase(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Delete => "delete",
        }
    }

    /// Returns `true` if requests with this method may carry a body.
    #[must_use]
    pub const fn allows_body(self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }

    /// Returns `true` if requests with this method must name a resource.
    #[must_use]
    pub const fn requires_identifier(self) -> bool {
        matches!(self, Self::Put | Self::Delete)
    }

    /// Formats `methods` as an `Allow` header value, e.g. `GET, POST`.
    #[must_use]
    pub fn allow_header(methods: &[Self]) -> String {
        methods
            .iter()
            .map(|m| m.uppercase())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for HttpMethod {
    type Err = ApiError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.uppercase().eq_ignore_ascii_case(raw))
            .ok_or_else(|| ApiError::method_not_allowed(format!("HTTP method {raw} is not supported")))
    }
}

impl TryFrom<&http::Method> for HttpMethod {
    type Error = ApiError;

    fn try_from(method: &http::Method) -> Result<Self, Self::Error> {
        method.as_str().parse()
    }
}

impl From<HttpMethod> for http::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Self::GET,
            HttpMethod::Post => Self::POST,
            HttpMethod::Put => Self::PUT,
            HttpMethod::Delete => Self::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uppercase())
    }
}
