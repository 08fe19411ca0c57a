use crate::api::handlers::{health, sessions};
use crate::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/models", get(health::list_models))
        .route("/sessions", post(sessions::create_session))
        .route(
            "/sessions/{id}",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route(
            "/sessions/{id}/messages",
            post(sessions::post_message).delete(sessions::clear_messages),
        )
        .route("/sessions/{id}/settings", put(sessions::update_settings))
}
