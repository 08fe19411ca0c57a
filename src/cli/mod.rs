//! CLI module for MediBot
//!
//! Provides command-line interface parsing for the `medibot` binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod output;
pub mod shell;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// MediBot - ask questions about your documents
///
/// Answers come from a hosted LLM, grounded on the most similar chunks of a
/// local document index, with source citations.
#[derive(Parser, Debug)]
#[command(
    name = "medibot",
    version,
    about = "MediBot - ask questions about your documents, with cited sources",
    long_about = "Answers natural-language questions from a local document index using a hosted\n\
                  LLM (Llama 3 on Groq, Mistral 7B on Hugging Face, or GPT-4o on OpenAI).\n\n\
                  Run without arguments to start the interactive shell.",
    after_help = "EXAMPLES:\n    \
                  medibot ingest data/                 # Build the index from .txt/.md files\n    \
                  medibot                              # Start the interactive shell\n    \
                  medibot ask \"What does aspirin do?\"  # Answer one question\n    \
                  medibot serve --port 8501            # Start the HTTP API\n    \
                  medibot --config my.toml config      # Show the effective configuration"
)]
pub struct Cli {
    /// Path to the configuration file (defaults to ./medibot.toml when present)
    #[arg(short, long, env = "MEDIBOT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging for MediBot (applied on top of RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the interactive chat shell (default)
    Chat {
        /// Model to start with (llama3, mistral, gpt4o)
        #[arg(short, long)]
        model: Option<String>,

        /// Temperature to start with (0.0 - 1.0)
        #[arg(short, long)]
        temperature: Option<f32>,
    },

    /// Answer a single question and print its sources
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,

        /// Model to use (llama3, mistral, gpt4o)
        #[arg(short, long)]
        model: Option<String>,

        /// Sampling temperature (0.0 - 1.0)
        #[arg(short, long)]
        temperature: Option<f32>,

        /// Number of chunks to retrieve
        #[arg(short)]
        k: Option<usize>,
    },

    /// Start the HTTP API server
    Serve {
        /// Host address to bind (overrides [server].host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides [server].port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Build the vector index from .txt and .md documents
    Ingest {
        /// Files or directories to index
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Index directory (overrides [store].path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replace an existing index
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration information
    Config {
        /// Only validate the configuration file
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
