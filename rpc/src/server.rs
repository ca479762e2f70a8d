//! Axum-based HTTP server.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::error::RpcError;
use crate::handlers;
use crate::service::CounterService;

/// Per-request deadline.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn CounterService>,
    token: Arc<str>,
}

pub struct StatsServer {
    pub host: String,
    pub port: u16,
    state: AppState,
}

impl StatsServer {
    pub fn new(host: impl Into<String>, port: u16, token: &str, service: Arc<dyn CounterService>) -> Self {
        Self {
            host: host.into(),
            port,
            state: AppState {
                service,
                token: Arc::from(token),
            },
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Build the router with authentication, tracing, timeout and panic
    /// recovery applied.
    pub fn router(&self) -> Router {
        let protected = Router::new()
            .route("/stats/:bucket/:key", post(handlers::post_stat))
            .route("/stats/:bucket", get(handlers::get_report))
            .route("/metrics", get(handlers::metrics))
            .route_layer(middleware::from_fn_with_state(
                self.state.clone(),
                require_token,
            ));

        Router::new()
            .route("/health", get(handlers::health))
            .merge(protected)
            .layer(
                ServiceBuilder::new()
                    .layer(CatchPanicLayer::new())
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(REQUEST_TIMEOUT)),
            )
            .with_state(self.state.clone())
    }

    /// Bind to the configured address and serve until `shutdown` fires.
    pub async fn serve(&self, shutdown: broadcast::Receiver<()>) -> Result<(), RpcError> {
        let addr = self.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| RpcError::Bind { addr: addr.clone(), source })?;
        self.serve_with_listener(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` fires.
    pub async fn serve_with_listener(
        &self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), RpcError> {
        let local = listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| self.addr());
        tracing::info!("HTTP server listening on http://{local}");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server shutting down");
            })
            .await
            .map_err(|e| RpcError::Server(e.to_string()))?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Reject requests whose `Authorization` header is not exactly the token.
async fn require_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, RpcError> {
    let provided = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if provided != Some(&*state.token) {
        tracing::debug!(path = %request.uri().path(), "rejected unauthenticated request");
        return Err(RpcError::Unauthorized);
    }
    Ok(next.run(request).await)
}
