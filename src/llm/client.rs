//! LLM client abstractions and model selection
//!
//! Every hosted model MediBot offers is reached through the same
//! OpenAI-compatible chat-completions protocol; what differs is the endpoint,
//! the credential and the model identifier. [`ModelChoice`] is the fixed set
//! offered to users, and an [`LLMClientFactory`] turns a choice into a client.

use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Generic LLM client trait for provider abstraction
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion for a single user prompt
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Creates clients for a model choice.
///
/// Credentials are resolved when the client is created, so a missing key is
/// reported for the query that needed it rather than at startup.
pub trait LLMClientFactory: Send + Sync {
    /// Create a client for `model`.
    fn create_client(&self, model: ModelChoice) -> Result<Arc<dyn LLMClient>>;
}

/// Per-request sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    /// Sampling temperature in [0, 1].
    pub temperature: f32,
    /// Upper bound on generated tokens, if the endpoint should be told one.
    pub max_tokens: Option<u32>,
}

/// The fixed set of models a user can pick from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModelChoice {
    /// Llama served by Groq.
    #[default]
    #[serde(rename = "llama3")]
    Llama3Groq,
    /// Mistral 7B Instruct served by the Hugging Face router.
    #[serde(rename = "mistral")]
    Mistral7bHf,
    /// GPT-4o served by OpenAI.
    #[serde(rename = "gpt4o")]
    Gpt4oOpenAI,
}

impl ModelChoice {
    /// All choices, in the order they are presented.
    pub const ALL: [ModelChoice; 3] = [
        ModelChoice::Llama3Groq,
        ModelChoice::Mistral7bHf,
        ModelChoice::Gpt4oOpenAI,
    ];

    /// Short identifier used in config files, commands and the API.
    pub fn id(&self) -> &'static str {
        match self {
            ModelChoice::Llama3Groq => "llama3",
            ModelChoice::Mistral7bHf => "mistral",
            ModelChoice::Gpt4oOpenAI => "gpt4o",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ModelChoice::Llama3Groq => "Llama 3 (Groq)",
            ModelChoice::Mistral7bHf => "Mistral 7B (HF)",
            ModelChoice::Gpt4oOpenAI => "GPT-4o (OpenAI)",
        }
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for ModelChoice {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        ModelChoice::ALL
            .into_iter()
            .find(|choice| choice.id() == wanted || choice.label().to_lowercase() == wanted)
            .or(match wanted.as_str() {
                "groq" | "llama" | "llama-3" => Some(ModelChoice::Llama3Groq),
                "hf" | "mistral-7b" => Some(ModelChoice::Mistral7bHf),
                "openai" | "gpt-4o" => Some(ModelChoice::Gpt4oOpenAI),
                _ => None,
            })
            .ok_or_else(|| {
                AppError::InvalidInput(format!(
                    "Unknown model '{}'. Choose one of: {}",
                    s,
                    ModelChoice::ALL.map(|c| c.id()).join(", ")
                ))
            })
    }
}

/// The settings a user controls for their queries: which model answers and
/// how much it may vary. Read fresh for every query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChatSettings {
    pub model: ModelChoice,
    pub temperature: f32,
}

impl ChatSettings {
    /// Build settings, rejecting temperatures outside [0, 1].
    pub fn new(model: ModelChoice, temperature: f32) -> Result<Self> {
        Ok(Self {
            model,
            temperature: validate_temperature(temperature)?,
        })
    }

    /// Replace the temperature, keeping the old value when the new one is invalid.
    pub fn set_temperature(&mut self, temperature: f32) -> Result<()> {
        self.temperature = validate_temperature(temperature)?;
        Ok(())
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: ModelChoice::default(),
            temperature: 0.5,
        }
    }
}

fn validate_temperature(temperature: f32) -> Result<f32> {
    if (0.0..=1.0).contains(&temperature) {
        Ok(temperature)
    } else {
        Err(AppError::InvalidInput(format!(
            "Temperature must be between 0.0 and 1.0, got {}",
            temperature
        )))
    }
}
