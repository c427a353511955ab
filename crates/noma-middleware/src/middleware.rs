//! Core middleware trait and continuation type.
//!
//! This module defines the [`Middleware`] trait that all pipeline stages
//! implement. A stage receives the request and a [`Next`] continuation
//! representing the rest of the pipeline. It may enrich the request and
//! call onward, return a response of its own, or fail with an
//! [`ApiError`](noma_core::ApiError).
//!
//! # Example
//!
//! ```
//! use noma_core::{ApiRequest, ApiResult, BoxFuture, Response};
//! use noma_middleware::{Middleware, Next};
//!
//! struct LoggingMiddleware;
//!
//! impl Middleware for LoggingMiddleware {
//!     fn name(&self) -> &'static str {
//!         "logging"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         request: ApiRequest,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, ApiResult<Response>> {
//!         Box::pin(async move {
//!             tracing::debug!(path = request.path(), "Request");
//!             let response = next.run(request).await?;
//!             tracing::debug!(status = %response.status(), "Response");
//!             Ok(response)
//!         })
//!     }
//! }
//! ```

use std::sync::Arc;

use noma_core::{ApiRequest, ApiResult, BoxFuture, Response};

/// The terminal handler invoked when every stage has called onward.
pub type Terminal =
    Arc<dyn Fn(ApiRequest) -> BoxFuture<'static, ApiResult<Response>> + Send + Sync + 'static>;

/// The core middleware trait.
///
/// # Invariants
///
/// - A stage calls `next.run()` at most once; not calling it short-circuits
///   every stage behind it
/// - A stage below the error boundary never turns an error into a response
pub trait Middleware: Send + Sync + 'static {
    /// Returns the unique name of this stage.
    ///
    /// This name is used for logging and debugging.
    fn name(&self) -> &'static str;

    /// Processes the request through this stage.
    fn process<'a>(
        &'a self,
        request: ApiRequest,
        next: Next<'a>,
    ) -> BoxFuture<'a, ApiResult<Response>>;
}

/// Continuation representing the remainder of the pipeline.
///
/// Running it consumes it, so it can be invoked at most once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    /// More stages to process
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    /// End of chain
    Terminal(&'a Terminal),
}

impl<'a> Next<'a> {
    /// Creates a `Next` that will invoke `middleware` and then `next`.
    pub fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates a `Next` that invokes the terminal handler.
    pub fn terminal(terminal: &'a Terminal) -> Self {
        Self {
            inner: NextInner::Terminal(terminal),
        }
    }

    /// Invokes the next stage, or the terminal handler at the end of the chain.
    pub async fn run(self, request: ApiRequest) -> ApiResult<Response> {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(request, *next).await,
            NextInner::Terminal(terminal) => terminal(request).await,
        }
    }
}
