//! Interactive chat shell
//!
//! One line of input per cycle. Lines starting with `/` are commands that
//! change the session settings or the display; anything else is a question
//! for the answer chain.

use crate::cli::output::Output;
use crate::llm::ModelChoice;
use crate::memory::{ConversationLog, Session};
use crate::rag::AnswerChain;
use crate::types::{AppError, DocumentChunk, Result, Role};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

const UPLOAD_EXTENSIONS: &[&str] = &["pdf", "txt", "docx"];

/// A parsed line of shell input.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellInput {
    Question(String),
    Command(ShellCommand),
}

/// Slash commands understood by the shell.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    /// Show or change the model
    Model(Option<String>),
    /// Show or change the temperature
    Temperature(Option<String>),
    /// Clear the conversation
    Clear,
    /// Register a document (display only)
    Upload(Option<String>),
    /// Expand the sources of the latest or n-th answer
    Sources(Option<usize>),
    /// Re-render the conversation
    History,
    Help,
    Quit,
}

impl ShellInput {
    /// Parse one input line. Returns `None` for a blank line.
    pub fn parse(line: &str) -> Option<Result<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let Some(rest) = line.strip_prefix('/') else {
            return Some(Ok(ShellInput::Question(line.to_string())));
        };

        let mut parts = rest.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts
            .next()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string);

        let command = match name.as_str() {
            "model" | "m" => ShellCommand::Model(arg),
            "temperature" | "temp" | "t" => ShellCommand::Temperature(arg),
            "clear" => ShellCommand::Clear,
            "upload" => ShellCommand::Upload(arg),
            "sources" | "s" => match arg {
                None => ShellCommand::Sources(None),
                Some(n) => match n.parse::<usize>() {
                    Ok(n) if n > 0 => ShellCommand::Sources(Some(n)),
                    _ => {
                        return Some(Err(AppError::InvalidInput(format!(
                            "'{}' is not an answer number",
                            n
                        ))))
                    }
                },
            },
            "history" | "h" => ShellCommand::History,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" | "q" => ShellCommand::Quit,
            other => {
                return Some(Err(AppError::InvalidInput(format!(
                    "Unknown command '/{}'. Type /help for the list of commands.",
                    other
                ))))
            }
        };

        Some(Ok(ShellInput::Command(command)))
    }
}

/// Sources of the n-th (1-based) assistant turn, or of the latest one.
pub fn answer_sources(log: &ConversationLog, n: Option<usize>) -> Option<&[Arc<DocumentChunk>]> {
    let mut answers = log
        .all()
        .iter()
        .filter(|turn| turn.role() == Role::Assistant);
    let turn = match n {
        Some(n) => answers.nth(n.checked_sub(1)?),
        None => answers.last(),
    }?;
    turn.sources()
}

/// Check an upload path. Uploaded files are acknowledged but not indexed.
pub fn validate_upload(path: &str) -> Result<String> {
    let path = Path::new(path);
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if !UPLOAD_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::InvalidInput(format!(
            "Unsupported file type; upload one of: {}",
            UPLOAD_EXTENSIONS.join(", ")
        )));
    }
    if !path.is_file() {
        return Err(AppError::InvalidInput(format!(
            "File not found: {}",
            path.display()
        )));
    }

    Ok(path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string()))
}

/// The interactive shell over one session.
pub struct Shell {
    chain: Arc<AnswerChain>,
    session: Session,
    k: usize,
    output: Output,
}

impl Shell {
    pub fn new(chain: Arc<AnswerChain>, session: Session, k: usize, output: Output) -> Self {
        Self {
            chain,
            session,
            k,
            output,
        }
    }

    /// Read and handle lines from stdin until `/quit` or end of input.
    pub async fn run(&mut self) -> Result<()> {
        self.output.banner();
        self.print_settings();
        self.output.features();
        self.output
            .hint("Ask a question about your documents, or type /help for commands.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        loop {
            stdout.write_all(b"\n> ").await.ok();
            stdout.flush().await.ok();

            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => return Err(AppError::Internal(format!("Failed to read input: {}", e))),
            };

            match ShellInput::parse(&line) {
                None => continue,
                Some(Err(e)) => self.output.error(&e.to_string()),
                Some(Ok(ShellInput::Question(question))) => self.ask(&question).await,
                Some(Ok(ShellInput::Command(ShellCommand::Quit))) => break,
                Some(Ok(ShellInput::Command(command))) => self.handle_command(command),
            }
        }

        self.output.info("Goodbye.");
        Ok(())
    }

    async fn ask(&mut self, question: &str) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("  {spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message("Thinking...");
        spinner.enable_steady_tick(Duration::from_millis(100));

        let result = self
            .session
            .submit(&self.chain, self.k, question)
            .await
            .cloned();
        spinner.finish_and_clear();

        match result {
            Ok(turn) => self.output.turn(&turn),
            Err(e) => self.output.error(&format!("Error: {}", e)),
        }
    }

    fn handle_command(&mut self, command: ShellCommand) {
        match command {
            ShellCommand::Model(None) => {
                self.output.kv("Model", self.session.settings.model.label());
                for choice in ModelChoice::ALL {
                    self.output
                        .list_item(&format!("{:<8} {}", choice.id(), choice.label()));
                }
            }
            ShellCommand::Model(Some(name)) => match name.parse::<ModelChoice>() {
                Ok(choice) => {
                    self.session.settings.model = choice;
                    self.output.success(&format!("Model set to {}", choice));
                }
                Err(e) => self.output.error(&e.to_string()),
            },
            ShellCommand::Temperature(None) => self.output.kv(
                "Temperature",
                &format!("{:.2}", self.session.settings.temperature),
            ),
            ShellCommand::Temperature(Some(value)) => {
                let result = value
                    .parse::<f32>()
                    .map_err(|_| AppError::InvalidInput(format!("'{}' is not a number", value)))
                    .and_then(|t| self.session.settings.set_temperature(t));
                match result {
                    Ok(()) => self.output.success(&format!(
                        "Temperature set to {:.2}",
                        self.session.settings.temperature
                    )),
                    Err(e) => self.output.error(&e.to_string()),
                }
            }
            ShellCommand::Clear => {
                self.session.clear();
                self.output.success("Chat history cleared.");
                self.output.features();
            }
            ShellCommand::Upload(None) => self.output.error("Usage: /upload <file.pdf|.txt|.docx>"),
            ShellCommand::Upload(Some(path)) => match validate_upload(&path) {
                Ok(name) => {
                    self.output.success(&format!("Loaded: {}", name));
                    self.output
                        .hint("Uploaded files are not indexed; run `medibot ingest` to add documents.");
                }
                Err(e) => self.output.error(&e.to_string()),
            },
            ShellCommand::Sources(n) => match answer_sources(self.session.log(), n) {
                Some(sources) => self.output.sources(sources),
                None => self.output.warning("No such answer."),
            },
            ShellCommand::History => {
                if self.session.log().is_empty() {
                    self.output.features();
                }
                for turn in self.session.log().all() {
                    self.output.turn(turn);
                }
            }
            ShellCommand::Help => self.print_help(),
            ShellCommand::Quit => {}
        }
    }

    fn print_settings(&self) {
        self.output.header("Settings");
        self.output.kv("Model", self.session.settings.model.label());
        self.output.kv(
            "Temperature",
            &format!("{:.2}", self.session.settings.temperature),
        );
    }

    fn print_help(&self) {
        self.output.header("Commands");
        for (usage, description) in [
            ("/model [name]", "show or choose the model (llama3, mistral, gpt4o)"),
            ("/temperature [0-1]", "show or set the sampling temperature"),
            ("/sources [n]", "expand the sources of the latest or n-th answer"),
            ("/history", "show the conversation again"),
            ("/clear", "clear the chat history"),
            ("/upload <file>", "register a PDF, TXT or DOCX file"),
            ("/help", "show this list"),
            ("/quit", "leave the shell"),
        ] {
            self.output.list_item(&format!("{:<20} {}", usage, description));
        }
    }
}
