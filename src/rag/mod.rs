//! Retrieval Augmented Generation (RAG) Pipeline
//!
//! # Module Structure
//!
//! - [`rag::prompt`](crate::rag::prompt) - Prompt template parsing and rendering
//! - [`rag::chain`](crate::rag::chain) - The retrieve-then-generate answer chain
//! - [`rag::embeddings`](crate::rag::embeddings) - Text embedders (feature hashing, fastembed)
//! - [`rag::chunker`](crate::rag::chunker) - Text chunking for document processing
//! - [`rag::ingest`](crate::rag::ingest) - Builds the persisted index from documents
//!
//! # RAG Pipeline
//!
//! 1. **Ingestion** - Documents are chunked, embedded and written to an index
//! 2. **Retrieval** - The question is embedded and similar chunks retrieved
//! 3. **Generation** - The LLM answers from a prompt built around those chunks
//!
//! # Example
//!
//! ```ignore
//! use medibot::rag::{chain::AnswerChain, prompt::PromptTemplate};
//!
//! let chain = AnswerChain::new(store, registry, PromptTemplate::parse(template)?);
//! let answer = chain.answer("What does aspirin do?", 3, &settings).await?;
//! for source in &answer.sources {
//!     println!("{} (page {:?})", source.source, source.page);
//! }
//! ```

pub mod chain;
pub mod chunker;
pub mod embeddings;
pub mod ingest;
pub mod prompt;

pub use chain::{Answer, AnswerChain};
pub use prompt::{build, PromptTemplate};
