//! TOML-based configuration for MediBot
//!
//! Everything has a default, so MediBot runs without a config file; a
//! `medibot.toml` only needs the sections it wants to change. Credentials
//! never live in the file: providers name the environment variable that holds
//! their API key.

use crate::llm::{ChatSettings, ModelChoice};
use crate::rag::prompt::PromptTemplate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure loaded from medibot.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedibotConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub prompt: PromptConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    /// Endpoint configuration for each selectable model
    #[serde(default)]
    pub models: ModelsConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8501
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

// ============= Logging Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ============= Vector Store Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory of the persisted vector index
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("vectorstore/db_index")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Deterministic feature hashing, no model download
    Hash,
    /// fastembed ONNX sentence-transformers (needs the `local-embeddings` feature)
    Fastembed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: EmbeddingProvider,

    /// Model name for the fastembed provider
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector size for the hash provider
    #[serde(default = "default_embedding_dimensions")]
    pub dimensions: usize,
}

fn default_embedding_provider() -> EmbeddingProvider {
    if cfg!(feature = "local-embeddings") {
        EmbeddingProvider::Fastembed
    } else {
        EmbeddingProvider::Hash
    }
}

fn default_embedding_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

fn default_embedding_dimensions() -> usize {
    384
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dimensions: default_embedding_dimensions(),
        }
    }
}

// ============= Retrieval Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks retrieved per question
    #[serde(default = "default_k")]
    pub k: usize,

    /// Chunk size in characters used by `medibot ingest`
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_k() -> usize {
    3
}

fn default_chunk_size() -> usize {
    500
}

fn default_chunk_overlap() -> usize {
    50
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

// ============= Prompt Configuration =============

/// Instruction template sent to the model. Recognized placeholders are
/// `{context}` and `{question}`.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "\
Use the pieces of information provided in the context to answer the user's question.
If you don't know the answer, just say that you don't know, don't try to make up an answer.
Don't provide anything out of the given context.

Context: {context}
Question: {question}

Start the answer directly. No small talk please.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(default = "default_prompt_template")]
    pub template: String,
}

fn default_prompt_template() -> String {
    DEFAULT_PROMPT_TEMPLATE.to_string()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            template: default_prompt_template(),
        }
    }
}

// ============= Chat Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default)]
    pub default_model: ModelChoice,

    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Timeout for a single LLM request; unset means no timeout
    pub request_timeout_secs: Option<u64>,
}

fn default_temperature() -> f32 {
    0.5
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_model: ModelChoice::default(),
            default_temperature: default_temperature(),
            request_timeout_secs: None,
        }
    }
}

// ============= Model Endpoint Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEndpointConfig {
    /// Base URL of the OpenAI-compatible API
    pub api_base: String,

    /// Environment variable containing the API key
    pub api_key_env: String,

    /// Model name/identifier sent to the endpoint
    pub model: String,

    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_llama3")]
    pub llama3: ModelEndpointConfig,

    #[serde(default = "default_mistral")]
    pub mistral: ModelEndpointConfig,

    #[serde(default = "default_gpt4o")]
    pub gpt4o: ModelEndpointConfig,
}

fn default_llama3() -> ModelEndpointConfig {
    ModelEndpointConfig {
        api_base: "https://api.groq.com/openai/v1".to_string(),
        api_key_env: "GROQ_API_KEY".to_string(),
        model: "meta-llama/llama-4-maverick-17b-128e-instruct".to_string(),
        max_tokens: None,
    }
}

fn default_mistral() -> ModelEndpointConfig {
    ModelEndpointConfig {
        api_base: "https://router.huggingface.co/v1".to_string(),
        api_key_env: "HF_TOKEN".to_string(),
        model: "mistralai/Mistral-7B-Instruct-v0.3".to_string(),
        max_tokens: Some(512),
    }
}

fn default_gpt4o() -> ModelEndpointConfig {
    ModelEndpointConfig {
        api_base: "https://api.openai.com/v1".to_string(),
        api_key_env: "OPENAI_API_KEY".to_string(),
        model: "gpt-4o".to_string(),
        max_tokens: None,
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            llama3: default_llama3(),
            mistral: default_mistral(),
            gpt4o: default_gpt4o(),
        }
    }
}

impl ModelsConfig {
    /// Endpoint configuration for a model choice
    pub fn get(&self, choice: ModelChoice) -> &ModelEndpointConfig {
        match choice {
            ModelChoice::Llama3Groq => &self.llama3,
            ModelChoice::Mistral7bHf => &self.mistral,
            ModelChoice::Gpt4oOpenAI => &self.gpt4o,
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid prompt template: {0}")]
    TemplateError(String),
}

impl MedibotConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: MedibotConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate value ranges and the prompt template
    pub fn validate(&self) -> Result<(), ConfigError> {
        let temperature = self.chat.default_temperature;
        if !(0.0..=1.0).contains(&temperature) {
            return Err(ConfigError::ValidationError(format!(
                "chat.default_temperature must be between 0.0 and 1.0, got {}",
                temperature
            )));
        }

        if self.retrieval.k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.k must be at least 1".to_string(),
            ));
        }

        if self.retrieval.chunk_size == 0
            || self.retrieval.chunk_overlap >= self.retrieval.chunk_size
        {
            return Err(ConfigError::ValidationError(format!(
                "retrieval.chunk_overlap ({}) must be smaller than a non-zero chunk_size ({})",
                self.retrieval.chunk_overlap, self.retrieval.chunk_size
            )));
        }

        if self.store.embedding.dimensions == 0 {
            return Err(ConfigError::ValidationError(
                "store.embedding.dimensions must be at least 1".to_string(),
            ));
        }

        for choice in ModelChoice::ALL {
            let endpoint = self.models.get(choice);
            if endpoint.api_base.trim().is_empty() || endpoint.model.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "models.{} needs both api_base and model",
                    choice.id()
                )));
            }
        }

        self.prompt_template()?;
        Ok(())
    }

    /// Parse the configured prompt template
    pub fn prompt_template(&self) -> Result<PromptTemplate, ConfigError> {
        PromptTemplate::parse(&self.prompt.template)
            .map_err(|e| ConfigError::TemplateError(e.to_string()))
    }

    /// Settings a new session starts with
    pub fn default_settings(&self) -> ChatSettings {
        ChatSettings {
            model: self.chat.default_model,
            temperature: self.chat.default_temperature,
        }
    }

    /// Render the effective configuration as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ValidationError(format!("Failed to render config: {}", e)))
    }
}
