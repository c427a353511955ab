//! Ordered middleware pipeline.
//!
//! A [`Pipeline`] is a fixed sequence of stages plus a terminal handler.
//! `execute` hands the request to the first stage together with a [`Next`]
//! continuation for the remainder; every stage decides whether to call it.
//! Stage N's post-processing therefore wraps the whole execution of stage
//! N+1 onwards.
//!
//! ## Standard API Pipeline
//!
//! [`Pipeline::api`] assembles the stages in this order:
//!
//! 1. **Request ID** - Assign the correlation ID (UUID v7)
//! 2. **Error Boundary** - Turn errors, panics and timeouts into JSON responses
//! 3. **Legacy Adaptation** - Check the host request, attach route params and JSON body
//! 4. **Routing** - Normalize version/endpoint/identifier attributes
//! 5. **Dispatch** - Resolve the endpoint handler
//! 6. **Validation** - Enforce method/query/body/identifier rules
//! 7. **Execution** - Invoke the handler
//!
//! The terminal handler answers 404 `Not Found`; it is only reached when
//! no handler was resolved.

use std::sync::Arc;

use noma_core::{ApiError, ApiRequest, ApiResult, BoxFuture, EndpointRegistry, Response, ResponseExt};

use crate::middleware::{Middleware, Next, Terminal};
use crate::stages::{
    DispatchMiddleware, ErrorBoundaryMiddleware, ExecutionMiddleware, LegacyAdaptationMiddleware,
    RequestIdMiddleware, RoutingMiddleware, ValidationMiddleware,
};

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Settings for the standard API pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Endpoint names accepted even when the host does not flag the request
    /// as an API request.
    pub static_endpoints: Vec<String>,
    /// Message sent to clients for panics inside the pipeline.
    pub internal_error_message: String,
    /// Whether to reuse a valid incoming `X-Request-ID`.
    pub trust_request_id: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            static_endpoints: vec!["openapi".to_string()],
            internal_error_message: "An internal error occurred".to_string(),
            trust_request_id: false,
        }
    }
}

/// An immutable, ordered middleware pipeline.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use noma_core::{ApiRequest, EndpointRegistry};
/// use noma_middleware::{Pipeline, PipelineOptions};
///
/// # tokio_test::block_on(async {
/// let registry = Arc::new(EndpointRegistry::builder().build());
/// let pipeline = Pipeline::api(registry, PipelineOptions::default());
///
/// let request = ApiRequest::new(http::Method::GET, http::Uri::from_static("/api/v1/contacts"));
/// let response = pipeline.respond(request).await;
///
/// // No host request attached
/// assert_eq!(response.status().as_u16(), 400);
/// # });
/// ```
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
    terminal: Terminal,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Assembles the standard API pipeline over `registry`.
    #[must_use]
    pub fn api(registry: Arc<EndpointRegistry>, options: PipelineOptions) -> Self {
        let request_id = if options.trust_request_id {
            RequestIdMiddleware::trust_incoming()
        } else {
            RequestIdMiddleware::new()
        };

        Self::builder()
            .stage(request_id)
            .stage(ErrorBoundaryMiddleware::new().internal_error_message(&options.internal_error_message))
            .stage(LegacyAdaptationMiddleware::new(options.static_endpoints))
            .stage(RoutingMiddleware)
            .stage(DispatchMiddleware::new(registry))
            .stage(ValidationMiddleware)
            .stage(ExecutionMiddleware)
            .build()
    }

    /// Runs `request` through every stage.
    ///
    /// Errors not handled by a stage are returned to the caller.
    pub async fn execute(&self, request: ApiRequest) -> ApiResult<Response> {
        self.chain().run(request).await
    }

    /// Runs `request` through every stage, rendering a residual error as its
    /// JSON envelope.
    pub async fn respond(&self, request: ApiRequest) -> Response {
        match self.execute(request).await {
            Ok(response) => response,
            Err(error) => Response::from_error(&error),
        }
    }

    fn chain(&self) -> Next<'_> {
        let mut next = Next::terminal(&self.terminal);
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Returns the names of all stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish_non_exhaustive()
    }
}

/// Builder for constructing a [`Pipeline`].
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
    terminal: Option<Terminal>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            terminal: None,
        }
    }

    /// Appends a stage. Stages run in the order they are added.
    #[must_use]
    pub fn stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Sets the terminal handler.
    ///
    /// Without one, the pipeline answers 404 `Not Found` when the last
    /// stage calls onward.
    #[must_use]
    pub fn terminal<F>(mut self, terminal: F) -> Self
    where
        F: Fn(ApiRequest) -> BoxFuture<'static, ApiResult<Response>> + Send + Sync + 'static,
    {
        self.terminal = Some(Arc::new(terminal));
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
            terminal: self.terminal.unwrap_or_else(not_found_terminal),
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found_terminal() -> Terminal {
    Arc::new(|_request: ApiRequest| -> BoxFuture<'static, ApiResult<Response>> {
        Box::pin(async { Err(ApiError::not_found("Not Found")) })
    })
}

/// The stages of the standard API pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Stage 1: Request ID assignment
    RequestId = 1,
    /// Stage 2: Error boundary
    ErrorBoundary = 2,
    /// Stage 3: Legacy request adaptation
    LegacyAdaptation = 3,
    /// Stage 4: Route attribute extraction
    Routing = 4,
    /// Stage 5: Endpoint resolution
    Dispatch = 5,
    /// Stage 6: Request validation
    Validation = 6,
    /// Stage 7: Handler execution
    Execution = 7,
}

impl Stage {
    /// Returns the stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RequestId => "request_id",
            Self::ErrorBoundary => "error_boundary",
            Self::LegacyAdaptation => "legacy_adaptation",
            Self::Routing => "routing",
            Self::Dispatch => "dispatch",
            Self::Validation => "validation",
            Self::Execution => "execution",
        }
    }

    /// Returns all stages in order.
    #[must_use]
    pub const fn all() -> [Stage; 7] {
        [
            Self::RequestId,
            Self::ErrorBoundary,
            Self::LegacyAdaptation,
            Self::Routing,
            Self::Dispatch,
            Self::Validation,
            Self::Execution,
        ]
    }
}
