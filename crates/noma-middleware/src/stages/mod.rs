//! Pipeline stages.
//!
//! Listed in the order [`Pipeline::api`](crate::Pipeline::api) runs them:
//!
//! 1. [`request_id`] - Assign the correlation ID
//! 2. [`error_boundary`] - Render errors, panics and timeouts
//! 3. [`legacy`] - Adapt the host request
//! 4. [`routing`] - Normalize routing attributes
//! 5. [`dispatch`] - Resolve the endpoint handler
//! 6. [`validation`] - Enforce request rules
//! 7. [`execution`] - Invoke the handler

pub mod dispatch;
pub mod error_boundary;
pub mod execution;
pub mod legacy;
pub mod request_id;
pub mod routing;
pub mod validation;

pub use dispatch::DispatchMiddleware;
pub use error_boundary::ErrorBoundaryMiddleware;
pub use execution::ExecutionMiddleware;
pub use legacy::LegacyAdaptationMiddleware;
pub use request_id::RequestIdMiddleware;
pub use routing::RoutingMiddleware;
pub use validation::ValidationMiddleware;
