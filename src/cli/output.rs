//! Colored output helpers for CLI
//!
//! Provides consistent, colored terminal output for the MediBot shell and
//! subcommands.

use crate::types::{DocumentChunk, Role, Turn};
use owo_colors::OwoColorize;

/// Feature list shown while a conversation is empty.
pub const FEATURES: [(&str, &str); 3] = [
    (
        "Answer Questions",
        "Ask anything about your indexed medical documents.",
    ),
    (
        "Summarize Docs",
        "Get quick summaries of complex medical reports.",
    ),
    (
        "Provide Sources",
        "Every answer comes with citations and page numbers.",
    ),
];

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain-text citation line for a chunk.
pub fn citation(chunk: &DocumentChunk) -> String {
    let page = chunk
        .page
        .map(|p| p.to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    format!("Source: {} (Page: {})", chunk.source, page)
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print the MediBot banner
    pub fn banner(&self) {
        if self.colored {
            println!(
                r#"
   {}
   {}
   {}
   {}
   {}
"#,
                " __  __          _ _ ____        _   ".bright_cyan().bold(),
                "|  \\/  | ___  __| (_) __ )  ___ | |_ ".bright_cyan().bold(),
                "| |\\/| |/ _ \\/ _` | |  _ \\ / _ \\| __|".cyan().bold(),
                "| |  | |  __/ (_| | | |_) | (_) | |_ ".blue().bold(),
                "|_|  |_|\\___|\\__,_|_|____/ \\___/ \\__|".blue().bold(),
            );
            println!(
                "   {} {}\n",
                "Your AI assistant for your documents".bright_white().bold(),
                format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
            );
        } else {
            println!(
                r#"
 __  __          _ _ ____        _
|  \/  | ___  __| (_) __ )  ___ | |_
| |\/| |/ _ \/ _` | |  _ \ / _ \| __|
| |  | |  __/ (_| | | |_) | (_) | |_
|_|  |_|\___|\__,_|_|____/ \___/ \__|

   Your AI assistant for your documents v{}
"#,
                env!("CARGO_PKG_VERSION")
            );
        }
    }

    /// Print a success message with a checkmark
    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Print a header for a section
    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// Print a list item
    pub fn list_item(&self, item: &str) {
        if self.colored {
            println!("    {} {}", "•".blue(), item);
        } else {
            println!("    - {}", item);
        }
    }

    /// Print a hint/tip message
    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {} {}", "💡".dimmed(), message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    /// Print the "What can this AI do?" feature list
    pub fn features(&self) {
        self.header("What can this AI do?");
        for (title, description) in FEATURES {
            if self.colored {
                println!("    {} {}", title.bright_cyan().bold(), description.dimmed());
            } else {
                println!("    {}: {}", title, description);
            }
        }
        self.newline();
    }

    /// Print one conversation turn as a labeled block
    pub fn turn(&self, turn: &Turn) {
        let label = match turn.role() {
            Role::User => "You",
            Role::Assistant => "MediBot",
        };

        if self.colored {
            let label = match turn.role() {
                Role::User => label.bright_green().bold().to_string(),
                Role::Assistant => label.bright_cyan().bold().to_string(),
            };
            println!("\n  {}", label);
        } else {
            println!("\n  [{}]", label);
        }

        for line in turn.text().lines() {
            println!("    {}", line);
        }

        if let Some(sources) = turn.sources() {
            let summary = format!(
                "{} source document{} (/sources to expand)",
                sources.len(),
                if sources.len() == 1 { "" } else { "s" }
            );
            if self.colored {
                println!("    {}", summary.dimmed());
            } else {
                println!("    ({})", summary);
            }
        }
    }

    /// Print the expanded source list of an answer
    pub fn sources(&self, sources: &[std::sync::Arc<DocumentChunk>]) {
        if sources.is_empty() {
            self.info("No source documents were retrieved for this answer.");
            return;
        }

        self.header("Source Documents");
        for (i, chunk) in sources.iter().enumerate() {
            let title = format!("Source {}:", i + 1);
            if self.colored {
                println!("\n    {}", title.bright_white().bold());
            } else {
                println!("\n    {}", title);
            }
            for line in chunk.content.lines() {
                println!("    {}", line);
            }
            if self.colored {
                println!("    {}", citation(chunk).dimmed().italic());
                println!("    {}", "─".repeat(40).dimmed());
            } else {
                println!("    {}", citation(chunk));
                println!("    {}", "-".repeat(40));
            }
        }
    }

    /// Print newline
    pub fn newline(&self) {
        println!();
    }
}
