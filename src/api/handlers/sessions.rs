//! Chat session handlers.
//!
//! Every session owns its conversation log and settings. Requests against one
//! session are serialized by its lock; sessions never wait on each other
//! except for the one-time opening of the shared vector store.

use crate::{
    llm::{ChatSettings, ModelChoice},
    memory::{Session, SessionHandle},
    types::{AppError, Result, Turn},
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Optional settings when creating or updating a session.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsRequest {
    /// Model id or label (`llama3`, `Mistral 7B (HF)`, ...)
    pub model: Option<String>,
    /// Sampling temperature in [0, 1]
    pub temperature: Option<f32>,
}

/// A question for a session.
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub question: String,
    /// Number of chunks to retrieve; defaults to `[retrieval].k`
    pub k: Option<usize>,
}

/// A session with its full conversation.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub settings: ChatSettings,
    pub created_at: DateTime<Utc>,
    pub turns: Vec<Turn>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id(),
            settings: session.settings,
            created_at: session.created_at(),
            turns: session.log().all().to_vec(),
        }
    }
}

/// The assistant turn produced by a question.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub session_id: Uuid,
    pub answer: Turn,
    pub turn_count: usize,
}

fn apply_settings(settings: &mut ChatSettings, request: &SettingsRequest) -> Result<()> {
    let mut updated = *settings;
    if let Some(model) = &request.model {
        updated.model = model.parse::<ModelChoice>()?;
    }
    if let Some(temperature) = request.temperature {
        updated.set_temperature(temperature)?;
    }
    *settings = updated;
    Ok(())
}

fn find_session(state: &AppState, id: &Uuid) -> Result<SessionHandle> {
    state
        .sessions
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))
}

/// `POST /sessions`
pub async fn create_session(
    State(state): State<AppState>,
    body: Option<Json<SettingsRequest>>,
) -> Result<(StatusCode, Json<SessionView>)> {
    let mut settings = state.config.default_settings();
    if let Some(Json(request)) = body {
        apply_settings(&mut settings, &request)?;
    }

    let (id, handle) = state.sessions.create(settings);
    info!(session = %id, model = settings.model.id(), "Session created");

    let session = handle.lock().await;
    Ok((StatusCode::CREATED, Json(SessionView::from(&*session))))
}

/// `GET /sessions/{id}`
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>> {
    let handle = find_session(&state, &id)?;
    let session = handle.lock().await;
    Ok(Json(SessionView::from(&*session)))
}

/// `DELETE /sessions/{id}`
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    if state.sessions.remove(&id) {
        info!(session = %id, "Session deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session {} not found", id)))
    }
}

/// `POST /sessions/{id}/messages`
///
/// On failure the question stays in the session's log without an answer.
pub async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<MessageResponse>> {
    let k = request.k.unwrap_or(state.config.retrieval.k);
    if k == 0 {
        return Err(AppError::InvalidInput("k must be at least 1".to_string()));
    }

    let handle = find_session(&state, &id)?;
    let mut session = handle.lock().await;
    let answer = session
        .submit(&state.chain, k, &request.question)
        .await?
        .clone();

    Ok(Json(MessageResponse {
        session_id: id,
        answer,
        turn_count: session.log().len(),
    }))
}

/// `DELETE /sessions/{id}/messages`
pub async fn clear_messages(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let handle = find_session(&state, &id)?;
    handle.lock().await.clear();
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /sessions/{id}/settings`
pub async fn update_settings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SettingsRequest>,
) -> Result<Json<ChatSettings>> {
    let handle = find_session(&state, &id)?;
    let mut session = handle.lock().await;
    apply_settings(&mut session.settings, &request)?;
    Ok(Json(session.settings))
}
