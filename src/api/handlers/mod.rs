//! API request handlers.

/// Health check and model listing handlers.
pub mod health;
/// Chat session handlers.
pub mod sessions;
