//! LLM clients and model selection
//!
//! All three hosted models speak the OpenAI chat-completions protocol:
//! - [`LLMClient`] - The core trait the answer chain talks to
//! - [`LLMClientFactory`] - Creates a client for a [`ModelChoice`]
//! - [`ProviderRegistry`] - Factory backed by the `[models.*]` config sections
//!
//! # Example
//!
//! ```ignore
//! use medibot::llm::{GenerationParams, LLMClientFactory, ModelChoice, ProviderRegistry};
//!
//! let registry = ProviderRegistry::from_config(&config)?;
//! let client = registry.create_client(ModelChoice::Llama3Groq)?;
//! let params = GenerationParams { temperature: 0.5, max_tokens: None };
//! let answer = client.generate("What is aspirin?", &params).await?;
//! ```

/// Core LLM client trait, model choices and chat settings.
pub mod client;
/// Client for OpenAI-compatible chat completion endpoints.
pub mod openai_compatible;
/// Maps model choices to configured endpoints.
pub mod provider_registry;

pub use client::{ChatSettings, GenerationParams, LLMClient, LLMClientFactory, ModelChoice};
pub use openai_compatible::OpenAICompatibleClient;
pub use provider_registry::ProviderRegistry;
