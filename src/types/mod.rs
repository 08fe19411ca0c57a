use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============= Retrieval Types =============

/// A span of source document text with its provenance.
///
/// Chunks are owned by the opened vector store; answers and turns hold
/// `Arc` references to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub content: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

// ============= Conversation Types =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message of a conversation. Immutable once created.
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    role: Role,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sources: Option<Vec<Arc<DocumentChunk>>>,
    created_at: DateTime<Utc>,
}

impl Turn {
    /// A turn submitted by the user.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            sources: None,
            created_at: Utc::now(),
        }
    }

    /// An answer, together with the chunks it was generated from.
    pub fn assistant(text: impl Into<String>, sources: Vec<Arc<DocumentChunk>>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            sources: Some(sources),
            created_at: Utc::now(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sources(&self) -> Option<&[Arc<DocumentChunk>]> {
        self.sources.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Vector store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Prompt template error: {0}")]
    Template(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::StoreUnavailable(_) => "store_unavailable",
            AppError::Template(_) => "template",
            AppError::Retrieval(_) => "retrieval",
            AppError::Generation(_) => "generation",
            AppError::Auth(_) => "auth",
            AppError::Configuration(_) => "configuration",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::NotFound(_) => "not_found",
            AppError::Internal(_) => "internal",
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = match self {
            AppError::StoreUnavailable(_) | AppError::Retrieval(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Generation(_) | AppError::Auth(_) => StatusCode::BAD_GATEWAY,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Template(_) | AppError::Configuration(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "kind": self.kind(),
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
