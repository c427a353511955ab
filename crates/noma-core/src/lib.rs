//! # NoMa Core
//!
//! Core types shared by every stage of the NoMa API request pipeline.
//!
//! This crate provides the foundational types used throughout NoMa:
//!
//! - [`HttpMethod`] - The verbs the API understands, parsed case-insensitively
//! - [`ApiError`] - Typed errors carrying an HTTP status, message and headers
//! - [`ApiRequest`] - Immutable request value carrying pipeline [`Attributes`]
//! - [`Response`] / [`ResponseExt`] - JSON response helpers
//! - [`EndpointHandler`] / [`EndpointRegistry`] - Endpoint capability and the
//!   startup-time `(version, endpoint)` lookup table

#![doc(html_root_url = "https://docs.rs/noma-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod endpoint;
mod error;
pub mod identifier;
mod method;
mod request;
mod response;

pub use endpoint::{normalize_route_segment, BoxFuture, EndpointHandler, EndpointRegistry, RegistryBuilder};
pub use error::{ApiError, ApiResult, ErrorEnvelope, ErrorKind};
pub use method::HttpMethod;
pub use request::{ApiRequest, Attributes, LegacyRequest, RouteParams};
pub use response::{read_body, Response, ResponseExt, JSON_CONTENT_TYPE};
