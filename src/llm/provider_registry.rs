//! Provider registry mapping each [`ModelChoice`] to its configured endpoint
//!
//! The registry holds the `[models.*]` configuration and a shared HTTP client.
//! API keys are read from the environment each time a client is created, so a
//! key exported after startup is picked up by the next query.

use crate::llm::client::{LLMClient, LLMClientFactory, ModelChoice};
use crate::llm::openai_compatible::OpenAICompatibleClient;
use crate::types::{AppError, Result};
use crate::utils::toml_config::{MedibotConfig, ModelEndpointConfig, ModelsConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Registry of model endpoints, creating clients on demand
pub struct ProviderRegistry {
    models: ModelsConfig,
    http: reqwest::Client,
}

impl ProviderRegistry {
    /// Create a registry for the given endpoints.
    ///
    /// `request_timeout` bounds each LLM request; `None` means no timeout.
    pub fn new(models: ModelsConfig, request_timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { models, http })
    }

    /// Create a provider registry from TOML configuration
    pub fn from_config(config: &MedibotConfig) -> Result<Self> {
        Self::new(
            config.models.clone(),
            config.chat.request_timeout_secs.map(Duration::from_secs),
        )
    }

    /// Endpoint configuration for a model choice
    pub fn endpoint(&self, model: ModelChoice) -> &ModelEndpointConfig {
        self.models.get(model)
    }

    /// Whether the credential for `model` is currently present
    pub fn has_credentials(&self, model: ModelChoice) -> bool {
        read_api_key(self.endpoint(model)).is_ok()
    }

    /// Log a warning when the credential for `model` is missing.
    ///
    /// Missing keys only fail the queries that need them; this makes the
    /// problem visible at startup.
    pub fn warn_if_missing_credentials(&self, model: ModelChoice) {
        if !self.has_credentials(model) {
            warn!(
                model = model.id(),
                env = %self.endpoint(model).api_key_env,
                "API key not set; queries using this model will fail"
            );
        }
    }
}

impl LLMClientFactory for ProviderRegistry {
    fn create_client(&self, model: ModelChoice) -> Result<Arc<dyn LLMClient>> {
        let endpoint = self.endpoint(model);
        let api_key = read_api_key(endpoint)?;

        debug!(model = model.id(), api_base = %endpoint.api_base, "Creating LLM client");

        Ok(Arc::new(
            OpenAICompatibleClient::new(
                self.http.clone(),
                endpoint.api_base.clone(),
                api_key,
                endpoint.model.clone(),
            )
            .with_max_tokens(endpoint.max_tokens),
        ))
    }
}

fn read_api_key(endpoint: &ModelEndpointConfig) -> Result<String> {
    std::env::var(&endpoint.api_key_env)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| {
            AppError::Auth(format!(
                "Missing API key: set the {} environment variable",
                endpoint.api_key_env
            ))
        })
}
