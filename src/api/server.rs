//! API server setup and configuration.

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use super::{
    handlers::{analyze_pdf_handler, health_handler},
    types::AppState,
};
use crate::config::ServerConfig;
use crate::error::InvoiceError;

/// Create the API router.
///
/// Body size is bounded by `DefaultBodyLimit`, which the multipart reader
/// enforces whether or not the request carries a `Content-Length`; an
/// oversized body yields HTTP 413.
/// CORS allows every origin unless `config.cors_origins` lists some.
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/analyze-pdf", post(analyze_pdf_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    if parsed.is_empty() {
        if !origins.is_empty() {
            tracing::warn!("No valid CORS origins configured; allowing all origins");
        }
        return CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    }

    tracing::info!("CORS configured with {} explicit allowed origin(s)", parsed.len());
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Bind `config.bind_addr()` and serve until the process is stopped.
pub async fn serve(state: AppState, config: &ServerConfig) -> Result<(), InvoiceError> {
    let addr = config.bind_addr();
    let app = create_router(state, config);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| InvoiceError::InvalidConfig(format!("cannot bind {addr}: {e}")))?;

    tracing::info!("Starting invoice API server on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| InvoiceError::Internal(e.to_string()))?;

    Ok(())
}
