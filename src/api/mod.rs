//! HTTP API server for the Parley gateway

pub mod health;
pub mod interpret;
pub mod rate_limit;
pub mod stream;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::pipeline::Interpreter;
use crate::relay::SessionRelay;
use crate::{Error, Result};

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Ingestion pipeline for `/interpret`
    pub interpreter: Arc<Interpreter>,
    /// Delivery queues polled by `/stream`
    pub relay: Arc<SessionRelay>,
    pub rate_limiter: Option<rate_limit::SharedLimiter>,
}

/// Configuration for building an API server
pub struct ApiServerBuilder {
    interpreter: Arc<Interpreter>,
    port: u16,
    max_upload_bytes: usize,
    rate_limit_rpm: Option<u32>,
}

impl ApiServerBuilder {
    /// Create a new API server builder
    ///
    /// The delivery endpoint polls the same relay the interpreter feeds.
    #[must_use]
    pub fn new(interpreter: Arc<Interpreter>, port: u16) -> Self {
        Self {
            interpreter,
            port,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            rate_limit_rpm: None,
        }
    }

    /// Set the largest accepted request body
    #[must_use]
    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Enable global rate limiting at the given requests per minute
    #[must_use]
    pub fn rate_limit(mut self, requests_per_minute: Option<u32>) -> Self {
        self.rate_limit_rpm = requests_per_minute;
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        let rate_limiter = self.rate_limit_rpm.map(rate_limit::create_limiter);
        let relay = self.interpreter.relay().clone();

        let state = Arc::new(ApiState {
            interpreter: self.interpreter,
            relay,
            rate_limiter,
        });

        ApiServer {
            state,
            port: self.port,
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    max_upload_bytes: usize,
}

impl ApiServer {
    /// Build the router with all routes
    #[must_use]
    pub fn router(&self) -> Router {
        let router = Router::new()
            .route(
                "/interpret",
                post(interpret::interpret).layer(DefaultBodyLimit::max(self.max_upload_bytes)),
            )
            .route("/stream/{mode}", get(stream::poll))
            .with_state(self.state.clone())
            .merge(health::router(self.state.clone()));

        // Rate limiting (only when configured)
        let router = router.layer(axum::middleware::from_fn_with_state(
            self.state.clone(),
            rate_limit::rate_limit_middleware,
        ));

        // CORS layer for browser clients served from another origin
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Run the API server until Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

/// Error body returned by every endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// API errors
///
/// Validation problems are reported verbatim. Anything else is logged and
/// surfaced as a generic 500 so provider details never reach clients.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        if err.is_validation() {
            return Self::bad_request(err.to_string());
        }
        tracing::error!(error = %err, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "interpretation failed")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}
