//! Vector store access.
//!
//! - [`vectorstore`] - the `VectorStore` trait and the lazily opened,
//!   shared [`StoreAccessor`]
//! - [`persisted`] - store backed by an index directory written by
//!   `medibot ingest`

pub mod persisted;
pub mod vectorstore;

pub use persisted::{PersistedStoreOpener, PersistedVectorStore};
pub use vectorstore::{InMemoryStore, StoreAccessor, StoreOpener, VectorStore};
