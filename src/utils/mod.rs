/// Tracing subscriber setup.
pub mod logging;
/// TOML configuration (`medibot.toml`).
pub mod toml_config;

pub use toml_config::{ConfigError, MedibotConfig};
