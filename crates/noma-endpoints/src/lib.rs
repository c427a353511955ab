//! Version 1 endpoints of the NoMa API.
//!
//! Each endpoint is a [`ResourceEndpoint`] configured by a [`ResourceSpec`]
//! from the [`catalog`], backed by an in-memory [`ResourceStore`]:
//!
//! | Endpoint | Methods |
//! |----------|---------|
//! | `contacts` | GET, POST, PUT, DELETE |
//! | `contactgroups` | GET, POST, PUT, DELETE |
//! | `channels` | GET |
//!
//! [`v1_registry`] assembles them into the registry the dispatch stage
//! resolves against.

#![doc(html_root_url = "https://docs.rs/noma-endpoints/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod catalog;
mod registry;
mod resource;
mod store;

pub use registry::{v1_registry, v1_registry_with, V1Stores, V1};
pub use resource::{ResourceEndpoint, ResourceSpec};
pub use store::{Record, ResourceStore};
