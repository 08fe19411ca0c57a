//! Health and model listing handlers.

use crate::{llm::ModelChoice, AppState};
use axum::{extract::State, Json};
use serde::Serialize;

/// Service status.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub store: StoreStatus,
    pub sessions: usize,
}

/// Whether the vector store has been opened yet. The store opens on the
/// first question, so `initialized: false` is normal for a fresh server.
#[derive(Debug, Serialize)]
pub struct StoreStatus {
    pub initialized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks: Option<usize>,
}

/// A selectable model.
#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub id: &'static str,
    pub label: &'static str,
    pub model: String,
    pub default: bool,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = state.chain.store().get_if_initialized();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        store: StoreStatus {
            initialized: store.is_some(),
            provider: store.as_ref().map(|s| s.provider_name()),
            chunks: store.as_ref().map(|s| s.chunk_count()),
        },
        sessions: state.sessions.len(),
    })
}

/// `GET /models`
pub async fn list_models(State(state): State<AppState>) -> Json<Vec<ModelInfo>> {
    let default = state.config.chat.default_model;
    Json(
        ModelChoice::ALL
            .into_iter()
            .map(|choice| ModelInfo {
                id: choice.id(),
                label: choice.label(),
                model: state.config.models.get(choice).model.clone(),
                default: choice == default,
            })
            .collect(),
    )
}
