//! HTTP/1.1 server hosting the API pipeline.
//!
//! Each accepted TCP stream is served by hyper on its own task. Requests
//! get their ID and deadline on arrival; the deadline covers the body read.
//! Bodies are buffered up to `server.max_body_bytes`, then the request gets
//! a [`LegacyRequest`](noma_core::LegacyRequest) from the [`HostRouter`] and
//! is passed to the shared [`Pipeline`].
//!
//! # Example
//!
//! ```rust,ignore
//! use noma_config::NomaConfig;
//! use noma_server::Server;
//!
//! let config = NomaConfig::default();
//! let registry = noma_endpoints::v1_registry(&config.api.base_path);
//! Server::from_config(&config, registry)?.run().await?;
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use http::{Method, Request};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};

use noma_config::{ApiConfig, NomaConfig};
use noma_core::{ApiError, ApiRequest, EndpointRegistry, Response, ResponseExt, JSON_CONTENT_TYPE};
use noma_middleware::{resolve_request_id, Pipeline, PipelineOptions, REQUEST_ID_HEADER, TIMEOUT_MESSAGE};
use noma_telemetry::{log_request_complete, log_request_error, log_request_start};
use uuid::Uuid;

use crate::error::{ServerError, ServerResult};
use crate::host::HostRouter;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Path answered outside the pipeline.
pub const HEALTH_PATH: &str = "/health";

/// Maps the `[api]` section onto pipeline options.
pub fn pipeline_options(api: &ApiConfig) -> PipelineOptions {
    PipelineOptions {
        static_endpoints: api.static_endpoints.clone(),
        internal_error_message: api.internal_error_message.clone(),
        trust_request_id: api.trust_request_id,
    }
}

/// The NoMa API HTTP server.
#[derive(Debug)]
pub struct Server {
    addr: SocketAddr,
    pipeline: Arc<Pipeline>,
    host: HostRouter,
    request_timeout: Duration,
    shutdown_timeout: Duration,
    max_body_bytes: usize,
    trust_request_id: bool,
}

impl Server {
    /// Builds a server serving `registry` as configured.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] if `config` does not validate.
    pub fn from_config(config: &NomaConfig, registry: EndpointRegistry) -> ServerResult<Self> {
        config.validate()?;

        let pipeline = Pipeline::api(Arc::new(registry), pipeline_options(&config.api));
        tracing::debug!(stages = ?pipeline.stage_names(), "Assembled pipeline");

        Ok(Self {
            addr: config.socket_addr()?,
            pipeline: Arc::new(pipeline),
            host: HostRouter::new(&config.api.base_path),
            request_timeout: Duration::from_millis(config.server.request_timeout_ms),
            shutdown_timeout: Duration::from_secs(config.server.shutdown_timeout_secs),
            max_body_bytes: config.server.max_body_bytes,
            trust_request_id: config.api.trust_request_id,
        })
    }

    /// Returns the configured bind address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the shared pipeline.
    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Serves until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound.
    pub async fn run(self) -> ServerResult<()> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds the configured address and serves until `shutdown` triggers.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> ServerResult<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.addr,
                source,
            })?;
        self.serve(listener, shutdown).await
    }

    /// Serves connections from `listener` until `shutdown` triggers, then
    /// drains open connections for up to the shutdown timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Io`] if the listener address cannot be read.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> ServerResult<()> {
        tracing::info!(addr = %listener.local_addr()?, "Server listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        let server = Arc::clone(&server);
                        let guard = tracker.acquire();
                        let shutdown = shutdown.clone();

                        tokio::spawn(async move {
                            if let Err(e) = server.serve_connection(stream, shutdown).await {
                                tracing::debug!(remote_addr = %remote_addr, error = %e, "Connection closed with error");
                            }
                            drop(guard);
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "Failed to accept connection"),
                },
                () = shutdown.recv() => break,
            }
        }

        tracing::info!(
            active = tracker.active_connections(),
            timeout = ?server.shutdown_timeout,
            "Draining connections"
        );
        if tokio::time::timeout(server.shutdown_timeout, tracker.wait_idle())
            .await
            .is_err()
        {
            tracing::warn!(
                active = tracker.active_connections(),
                "Shutdown timeout reached with connections still open"
            );
        }

        tracing::info!("Server stopped");
        Ok(())
    }

    async fn serve_connection(
        self: Arc<Self>,
        stream: TcpStream,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let server = Arc::clone(&self);
        let service = service_fn(move |request: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle(request).await) }
        });

        let connection = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
        tokio::pin!(connection);

        tokio::select! {
            result = connection.as_mut() => result,
            () = shutdown.recv() => {
                // Finish the in-flight request, then close
                connection.as_mut().graceful_shutdown();
                connection.await
            }
        }
    }

    /// Handles one HTTP request.
    ///
    /// The request ID is assigned here so responses produced before the
    /// pipeline runs carry it too.
    pub async fn handle<B>(&self, request: Request<B>) -> Response
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let started = Instant::now();
        let request_id = resolve_request_id(request.headers(), self.trust_request_id);
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        log_request_start!(request_id, method, path);

        let mut response = if method == Method::GET && path == HEALTH_PATH {
            health()
        } else {
            self.dispatch(request, request_id).await
        };

        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        log_request_complete!(request_id, response.status().as_u16(), duration_ms);
        response
    }

    async fn dispatch<B>(&self, request: Request<B>, request_id: Uuid) -> Response
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let deadline = tokio::time::Instant::now() + self.request_timeout;
        let (parts, body) = request.into_parts();

        let declared = parts
            .headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        if declared.is_some_and(|len| len > self.max_body_bytes) {
            return self.too_large();
        }

        let collected =
            tokio::time::timeout_at(deadline, Limited::new(body, self.max_body_bytes).collect()).await;
        let body = match collected {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(e)) if e.is::<LengthLimitError>() => return self.too_large(),
            Ok(Err(e)) => {
                log_request_error!(request_id, e);
                return Response::from_error(&ApiError::bad_request(
                    "Invalid request: Failed to read request body",
                ));
            }
            Err(_) => {
                tracing::warn!(request_id = %request_id, "Request deadline elapsed while reading body");
                return Response::from_error(&ApiError::timeout(TIMEOUT_MESSAGE));
            }
        };

        let legacy = self.host.legacy_request(parts.uri.path(), &parts.headers);
        let request = ApiRequest::from_http(Request::from_parts(parts, body))
            .with_request_id(request_id)
            .with_deadline(deadline)
            .with_legacy(legacy);

        self.pipeline.respond(request).await
    }

    fn too_large(&self) -> Response {
        Response::from_error(&ApiError::payload_too_large(format!(
            "Request body exceeds {} bytes",
            self.max_body_bytes
        )))
    }
}

fn health() -> Response {
    let mut response = http::Response::new(Full::new(Bytes::from_static(br#"{"status":"ok"}"#)));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    response
}
