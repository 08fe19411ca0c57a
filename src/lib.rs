//! # MediBot
//!
//! Ask natural-language questions about a set of documents and get answers
//! from a hosted LLM, grounded on (and citing) the most similar passages of a
//! local vector index.
//!
//! ## Overview
//!
//! MediBot can be used in two ways:
//!
//! 1. **As a binary** - `medibot` runs an interactive shell, answers one-off
//!    questions, serves an HTTP session API, and builds the index
//! 2. **As a library** - compose the store accessor, answer chain and
//!    sessions in your own program
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use medibot::{AppState, MedibotConfig};
//! use medibot::memory::Session;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MedibotConfig::load("medibot.toml")?;
//!     let state = AppState::from_config(config)?;
//!
//!     let mut session = Session::new(state.config.default_settings());
//!     let answer = session.submit(&state.chain, 3, "What does aspirin do?").await?;
//!     println!("{}", answer.text());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `local-embeddings` | fastembed sentence embeddings (all-MiniLM-L6-v2) |
//!
//! ## Modules
//!
//! - [`api`] - HTTP session API
//! - [`cli`] - Command line parsing, colored output and the chat shell
//! - [`db`] - Vector store access
//! - [`llm`] - LLM clients and model selection
//! - [`memory`] - Conversation logs and sessions
//! - [`rag`] - Prompt template, answer chain, embeddings and ingestion
//! - [`types`] - Common types and error handling
//! - [`utils`] - Configuration and logging

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Command-line interface and interactive shell.
pub mod cli;
/// Vector store abstraction and the persisted index store.
pub mod db;
/// LLM client implementations.
pub mod llm;
/// Conversation state.
pub mod memory;
/// Retrieval Augmented Generation components.
pub mod rag;
/// Core types and error handling.
pub mod types;
/// Configuration and logging utilities.
pub mod utils;

pub use db::{StoreAccessor, VectorStore};
pub use llm::{ChatSettings, LLMClient, LLMClientFactory, ModelChoice, ProviderRegistry};
pub use rag::{Answer, AnswerChain};
pub use types::{AppError, DocumentChunk, Result, Role, Turn};
pub use utils::toml_config::MedibotConfig;

use crate::db::PersistedStoreOpener;
use crate::memory::SessionStore;
use crate::rag::embeddings::create_embedder;
use std::sync::Arc;

/// Shared application state: configuration, the answer chain (which owns the
/// shared vector store accessor) and the live HTTP sessions.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<MedibotConfig>,
    /// Retrieve-then-generate chain shared by every session
    pub chain: Arc<AnswerChain>,
    /// Sessions of the HTTP API
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    /// Assemble state around an existing chain.
    pub fn new(config: MedibotConfig, chain: AnswerChain) -> Self {
        Self {
            config: Arc::new(config),
            chain: Arc::new(chain),
            sessions: Arc::new(SessionStore::new()),
        }
    }

    /// Build the production wiring: the configured embedder, the persisted
    /// index (opened lazily on the first question) and the provider registry.
    pub fn from_config(config: MedibotConfig) -> Result<Self> {
        let template = config
            .prompt_template()
            .map_err(|e| AppError::Template(e.to_string()))?;

        let embedder = create_embedder(&config.store.embedding)?;
        let store = Arc::new(StoreAccessor::new(PersistedStoreOpener::new(
            config.store.path.clone(),
            embedder,
        )));

        let registry = ProviderRegistry::from_config(&config)?;
        registry.warn_if_missing_credentials(config.chat.default_model);

        let chain = AnswerChain::new(store, Arc::new(registry), template);
        Ok(Self::new(config, chain))
    }
}
