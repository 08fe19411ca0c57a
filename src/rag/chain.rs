//! Retrieve-then-generate answer chain
//!
//! One call of [`AnswerChain::answer`] is one query: search the shared store,
//! build the prompt from the retrieved chunks, ask the selected model, and
//! hand back the answer together with the chunks it was grounded on.

use crate::db::StoreAccessor;
use crate::llm::{ChatSettings, GenerationParams, LLMClientFactory};
use crate::rag::prompt::PromptTemplate;
use crate::types::{AppError, DocumentChunk, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Separator placed between chunk contents in the prompt context.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// A generated answer and the chunks retrieved for it, in retrieval order.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<Arc<DocumentChunk>>,
}

/// Composes the store accessor, the prompt template and the LLM factory.
pub struct AnswerChain {
    store: Arc<StoreAccessor>,
    llm_factory: Arc<dyn LLMClientFactory>,
    template: PromptTemplate,
}

impl AnswerChain {
    pub fn new(
        store: Arc<StoreAccessor>,
        llm_factory: Arc<dyn LLMClientFactory>,
        template: PromptTemplate,
    ) -> Self {
        Self {
            store,
            llm_factory,
            template,
        }
    }

    /// The shared store accessor.
    pub fn store(&self) -> &Arc<StoreAccessor> {
        &self.store
    }

    /// Answer `question` from the `k` most similar chunks.
    ///
    /// # Errors
    ///
    /// - [`AppError::InvalidInput`] for a blank question (before any I/O)
    /// - [`AppError::StoreUnavailable`] / [`AppError::Retrieval`] from the store
    /// - [`AppError::Auth`] when the model's credential is missing or rejected
    /// - [`AppError::Generation`] when the endpoint fails or returns no text
    #[instrument(skip(self, question, settings), fields(model = settings.model.id()))]
    pub async fn answer(&self, question: &str, k: usize, settings: &ChatSettings) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::InvalidInput("Question must not be empty".to_string()));
        }

        let store = self.store.get_store().await?;
        let sources = store.search(question, k).await?;
        debug!(retrieved = sources.len(), "Retrieved context");

        let context = sources
            .iter()
            .map(|chunk| chunk.content.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);
        let prompt = self.template.render(&context, question);

        let client = self.llm_factory.create_client(settings.model)?;
        let params = GenerationParams {
            temperature: settings.temperature,
            max_tokens: None,
        };
        let text = client.generate(&prompt, &params).await?;

        info!(
            model = client.model_name(),
            sources = sources.len(),
            answer_len = text.len(),
            "Answered question"
        );

        Ok(Answer { text, sources })
    }
}
