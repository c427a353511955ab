//! # NoMa Middleware
//!
//! The request-processing pipeline of the NoMa API.
//!
//! Every API request flows through an ordered chain of stages. Each stage
//! receives the immutable [`ApiRequest`](noma_core::ApiRequest) and a
//! [`Next`] continuation, and either calls onward with an enriched request,
//! answers on its own, or fails with an [`ApiError`](noma_core::ApiError).
//!
//! ## Pipeline Stages
//!
//! ```text
//! Request → RequestId → ErrorBoundary → Legacy → Routing → Dispatch → Validation → Execution
//!                            ↑                                                         │
//!                            └──────────────── Err(ApiError) / panic ─────────────────┘
//! ```
//!
//! | Stage | Middleware        | Purpose                                        |
//! |-------|-------------------|------------------------------------------------|
//! | 1     | Request ID        | Assign correlation ID (UUID v7)                |
//! | 2     | Error Boundary    | Render errors as `{"message": ..}`, catch panics, enforce deadline |
//! | 3     | Legacy Adaptation | Validate host request, attach route params and JSON body |
//! | 4     | Routing           | Normalize version/endpoint/identifier          |
//! | 5     | Dispatch          | Resolve `(version, endpoint)` to a handler     |
//! | 6     | Validation        | Method/query/body/identifier rules             |
//! | 7     | Execution         | Invoke the handler                             |
//!
//! ## Example
//!
//! ```
//! use noma_middleware::pipeline::Stage;
//!
//! let stages = Stage::all();
//! assert_eq!(stages.len(), 7);
//! assert_eq!(stages[0].name(), "request_id");
//! assert_eq!(stages[6].name(), "execution");
//! ```

#![doc(html_root_url = "https://docs.rs/noma-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod middleware;
pub mod pipeline;
pub mod stages;

pub use middleware::{Middleware, Next, Terminal};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineOptions, Stage};
pub use stages::error_boundary::TIMEOUT_MESSAGE;
pub use stages::request_id::{resolve_request_id, REQUEST_ID_HEADER};
