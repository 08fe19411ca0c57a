//! MediBot CLI Entry Point
//!
//! - `medibot` / `medibot chat` - Interactive shell (default)
//! - `medibot ask <question>` - Answer one question and print its sources
//! - `medibot serve` - HTTP session API
//! - `medibot ingest <paths>` - Build the vector index
//! - `medibot config` - Show or validate the effective configuration

use anyhow::Context;
use medibot::{
    api,
    cli::{output::Output, shell::Shell, Cli, Commands},
    memory::Session,
    rag::{
        embeddings::create_embedder,
        ingest::{ingest, IngestOptions},
    },
    utils::{logging::init_tracing, toml_config::MedibotConfig},
    AppState, ChatSettings, ModelChoice,
};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use tracing::info;

const DEFAULT_CONFIG_FILE: &str = "medibot.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging, cli.verbose);

    let output = if cli.no_color || std::env::var_os("NO_COLOR").is_some() {
        Output::no_color()
    } else {
        Output::new()
    };

    match cli.command {
        None => run_chat(config, output, None, None).await,
        Some(Commands::Chat { model, temperature }) => {
            run_chat(config, output, model, temperature).await
        }
        Some(Commands::Ask {
            question,
            model,
            temperature,
            k,
        }) => run_ask(config, output, &question.join(" "), model, temperature, k).await,
        Some(Commands::Serve { host, port }) => run_serve(config, host, port).await,
        Some(Commands::Ingest {
            paths,
            output: index_path,
            force,
        }) => run_ingest(config, output, paths, index_path, force).await,
        Some(Commands::Config { validate }) => run_config(&config, output, validate),
    }
}

/// Load the explicit config file, or `./medibot.toml` when present, or defaults.
fn load_config(path: Option<&Path>) -> anyhow::Result<MedibotConfig> {
    match path {
        Some(path) => MedibotConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => MedibotConfig::load(DEFAULT_CONFIG_FILE)
            .with_context(|| format!("Failed to load {}", DEFAULT_CONFIG_FILE)),
        None => {
            let config = MedibotConfig::default();
            config.validate()?;
            Ok(config)
        }
    }
}

/// Session settings from config defaults and command-line overrides.
fn initial_settings(
    config: &MedibotConfig,
    model: Option<String>,
    temperature: Option<f32>,
) -> anyhow::Result<ChatSettings> {
    let mut settings = config.default_settings();
    if let Some(model) = model {
        settings.model = model.parse::<ModelChoice>()?;
    }
    if let Some(temperature) = temperature {
        settings.set_temperature(temperature)?;
    }
    Ok(settings)
}

async fn run_chat(
    config: MedibotConfig,
    output: Output,
    model: Option<String>,
    temperature: Option<f32>,
) -> anyhow::Result<()> {
    let settings = initial_settings(&config, model, temperature)?;
    let k = config.retrieval.k;
    let state = AppState::from_config(config)?;

    let mut shell = Shell::new(state.chain, Session::new(settings), k, output);
    shell.run().await?;
    Ok(())
}

async fn run_ask(
    config: MedibotConfig,
    output: Output,
    question: &str,
    model: Option<String>,
    temperature: Option<f32>,
    k: Option<usize>,
) -> anyhow::Result<()> {
    let settings = initial_settings(&config, model, temperature)?;
    let k = k.unwrap_or(config.retrieval.k);
    let state = AppState::from_config(config)?;

    let mut session = Session::new(settings);
    let answer = session.submit(&state.chain, k, question).await?;

    output.turn(answer);
    if let Some(sources) = answer.sources() {
        output.sources(sources);
    }
    Ok(())
}

async fn run_serve(
    config: MedibotConfig,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr = format!("{}:{}", host, port);

    let state = AppState::from_config(config)?;
    let app = api::app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("MediBot API listening on http://{}", addr);
    eprintln!("MediBot API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}

async fn run_ingest(
    config: MedibotConfig,
    output: Output,
    paths: Vec<PathBuf>,
    index_path: Option<PathBuf>,
    force: bool,
) -> anyhow::Result<()> {
    let index_path = index_path.unwrap_or_else(|| config.store.path.clone());
    let embedder = create_embedder(&config.store.embedding)?;
    let options = IngestOptions {
        chunk_size: config.retrieval.chunk_size,
        chunk_overlap: config.retrieval.chunk_overlap,
        overwrite: force,
    };

    output.header("Ingesting documents");
    output.kv("Embedder", embedder.name());
    output.kv("Index", &index_path.display().to_string());

    let report = ingest(&paths, &index_path, embedder.as_ref(), &options).await?;

    for skipped in &report.skipped {
        output.warning(&format!("Skipped {} (unreadable or empty)", skipped.display()));
    }
    output.success(&format!(
        "Indexed {} chunks from {} files into {}",
        report.chunks,
        report.files,
        report.index_path.display()
    ));
    Ok(())
}

fn run_config(config: &MedibotConfig, output: Output, validate: bool) -> anyhow::Result<()> {
    if validate {
        output.success("Configuration is valid");
        return Ok(());
    }

    output.header("Effective configuration");
    println!("{}", config.to_toml_string()?);
    Ok(())
}
