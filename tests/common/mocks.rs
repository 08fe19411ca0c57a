//! Mock implementations for testing.
//!
//! Mock LLM clients, a factory recording which models were requested, and
//! store openers that count or fail their opens. Shared by the integration
//! test files without duplication.

use async_trait::async_trait;
use medibot::db::vectorstore::{InMemoryStore, StoreOpener, VectorStore};
use medibot::llm::{GenerationParams, LLMClient, LLMClientFactory, ModelChoice};
use medibot::rag::PromptTemplate;
use medibot::types::{AppError, DocumentChunk, Result};
use medibot::{AnswerChain, MedibotConfig, StoreAccessor};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============= LLM Mocks =============

/// How a [`MockLLMClient`] responds.
#[derive(Clone, Debug)]
pub enum MockBehavior {
    Answer(String),
    FailGeneration,
}

/// Mock LLM client that records every prompt it receives.
///
/// ```ignore
/// let client = MockLLMClient::new("Aspirin reduces fever.");
/// let failing = MockLLMClient::failing();
/// ```
pub struct MockLLMClient {
    behavior: MockBehavior,
    prompts: Mutex<Vec<String>>,
    params: Mutex<Vec<GenerationParams>>,
}

impl MockLLMClient {
    /// A client that answers every prompt with `response`.
    pub fn new(response: &str) -> Self {
        Self {
            behavior: MockBehavior::Answer(response.to_string()),
            prompts: Mutex::new(Vec::new()),
            params: Mutex::new(Vec::new()),
        }
    }

    /// A client whose every request fails with a generation error.
    pub fn failing() -> Self {
        Self {
            behavior: MockBehavior::FailGeneration,
            prompts: Mutex::new(Vec::new()),
            params: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// Generation parameters received so far.
    pub fn params(&self) -> Vec<GenerationParams> {
        self.params.lock().clone()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        self.params.lock().push(*params);
        match &self.behavior {
            MockBehavior::Answer(text) => Ok(text.clone()),
            MockBehavior::FailGeneration => {
                Err(AppError::Generation("Mock LLM failure".to_string()))
            }
        }
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Factory handing out one shared [`MockLLMClient`].
pub struct MockFactory {
    client: Arc<MockLLMClient>,
    missing_key: bool,
    requested: Mutex<Vec<ModelChoice>>,
}

impl MockFactory {
    pub fn new(client: MockLLMClient) -> Self {
        Self {
            client: Arc::new(client),
            missing_key: false,
            requested: Mutex::new(Vec::new()),
        }
    }

    /// A factory that reports a missing credential for every model.
    pub fn missing_key() -> Self {
        Self {
            missing_key: true,
            ..Self::new(MockLLMClient::new("unused"))
        }
    }

    pub fn client(&self) -> Arc<MockLLMClient> {
        Arc::clone(&self.client)
    }

    /// Models clients were created for, oldest first.
    pub fn requested(&self) -> Vec<ModelChoice> {
        self.requested.lock().clone()
    }
}

impl LLMClientFactory for MockFactory {
    fn create_client(&self, model: ModelChoice) -> Result<Arc<dyn LLMClient>> {
        self.requested.lock().push(model);
        if self.missing_key {
            return Err(AppError::Auth(
                "Missing API key: set the MOCK_API_KEY environment variable".to_string(),
            ));
        }
        Ok(self.client.clone() as Arc<dyn LLMClient>)
    }
}

// ============= Store Mocks =============

/// Opens an [`InMemoryStore`] after an optional delay, counting opens.
pub struct CountingOpener {
    chunks: Vec<DocumentChunk>,
    delay: Duration,
    opens: Arc<AtomicUsize>,
}

impl CountingOpener {
    pub fn new(chunks: Vec<DocumentChunk>) -> Self {
        Self {
            chunks,
            delay: Duration::ZERO,
            opens: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Hold every open for `delay`, so concurrent callers overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Counter of completed `open` calls.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.opens)
    }
}

#[async_trait]
impl StoreOpener for CountingOpener {
    async fn open(&self) -> Result<Arc<dyn VectorStore>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(InMemoryStore::new(self.chunks.clone())))
    }
}

/// Fails the first `failures` opens, then opens an [`InMemoryStore`].
pub struct FailingOpener {
    failures: usize,
    chunks: Vec<DocumentChunk>,
    attempts: Arc<AtomicUsize>,
}

impl FailingOpener {
    pub fn new(failures: usize, chunks: Vec<DocumentChunk>) -> Self {
        Self {
            failures,
            chunks,
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A store that never opens.
    pub fn always() -> Self {
        Self::new(usize::MAX, Vec::new())
    }

    pub fn attempts(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.attempts)
    }
}

#[async_trait]
impl StoreOpener for FailingOpener {
    async fn open(&self) -> Result<Arc<dyn VectorStore>> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            return Err(AppError::StoreUnavailable(
                "Mock index directory is missing".to_string(),
            ));
        }
        Ok(Arc::new(InMemoryStore::new(self.chunks.clone())))
    }
}

// ============= Fixtures =============

pub fn chunk(id: &str, content: &str, source: &str, page: Option<u32>) -> DocumentChunk {
    DocumentChunk {
        id: id.to_string(),
        content: content.to_string(),
        source: source.to_string(),
        page,
    }
}

/// A small medical corpus for retrieval tests.
pub fn medical_chunks() -> Vec<DocumentChunk> {
    vec![
        chunk(
            "aspirin:1",
            "Aspirin reduces fever and relieves mild pain.",
            "data/aspirin.pdf",
            Some(1),
        ),
        chunk(
            "ibuprofen:1",
            "Ibuprofen is an anti-inflammatory drug used for pain.",
            "data/ibuprofen.pdf",
            Some(2),
        ),
        chunk(
            "insulin:1",
            "Insulin regulates blood sugar in people with diabetes.",
            "data/insulin.txt",
            None,
        ),
        chunk(
            "vitamins:1",
            "Vitamin C supports the immune system.",
            "data/vitamins.md",
            None,
        ),
    ]
}

/// The default prompt template.
pub fn default_template() -> PromptTemplate {
    MedibotConfig::default()
        .prompt_template()
        .expect("default template parses")
}

/// A template that makes rendered prompts easy to assert on.
pub fn bracket_template() -> PromptTemplate {
    PromptTemplate::parse("[{context}] Q: {question}").expect("template parses")
}

/// Chain over `opener` and `factory` with the given template.
pub fn chain_with(
    opener: impl StoreOpener + 'static,
    factory: Arc<MockFactory>,
    template: PromptTemplate,
) -> AnswerChain {
    AnswerChain::new(Arc::new(StoreAccessor::new(opener)), factory, template)
}
