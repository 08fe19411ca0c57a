//! HTTP API Handlers and Routes
//!
//! A multi-session JSON API over the same answer chain the shell uses, built
//! on the Axum web framework.
//!
//! # API Endpoints
//!
//! - `GET /health` - Service status and whether the vector store is open
//! - `GET /models` - Selectable models
//! - `POST /sessions` - Start a session (optional `{model, temperature}`)
//! - `GET /sessions/{id}` - Session settings and conversation
//! - `DELETE /sessions/{id}` - End a session
//! - `POST /sessions/{id}/messages` - Ask a question (`{question, k?}`)
//! - `DELETE /sessions/{id}/messages` - Clear the conversation
//! - `PUT /sessions/{id}/settings` - Change model and/or temperature
//!
//! Errors are returned as `{"error": message, "kind": kind}`.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use crate::AppState;
use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// The complete application router with tracing and CORS layers.
pub fn app(state: AppState) -> Router {
    routes::create_router()
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
