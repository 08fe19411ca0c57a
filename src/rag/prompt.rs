//! Prompt template builder
//!
//! Templates use `{context}` and `{question}` placeholders; `{{` and `}}`
//! stand for literal braces. A template is parsed once (normally when the
//! configuration is loaded), after which rendering cannot fail.

use crate::types::{AppError, Result};

/// Placeholder for the retrieved chunk text.
pub const CONTEXT_PLACEHOLDER: &str = "context";
/// Placeholder for the user's question.
pub const QUESTION_PLACEHOLDER: &str = "question";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Context,
    Question,
}

/// A validated prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parse and validate a template.
    ///
    /// Fails with [`AppError::Template`] on an unknown placeholder name or an
    /// unbalanced brace.
    pub fn parse(template: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    literal.push('{');
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, inner) in chars.by_ref() {
                        match inner {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => {
                                return Err(AppError::Template(format!(
                                    "nested '{{' inside placeholder starting at byte {}",
                                    pos
                                )))
                            }
                            other => name.push(other),
                        }
                    }
                    if !closed {
                        return Err(AppError::Template(format!(
                            "unclosed '{{' at byte {}",
                            pos
                        )));
                    }

                    let segment = match name.as_str() {
                        CONTEXT_PLACEHOLDER => Segment::Context,
                        QUESTION_PLACEHOLDER => Segment::Question,
                        _ => {
                            return Err(AppError::Template(format!(
                                "unknown placeholder '{{{}}}'; only {{{}}} and {{{}}} are supported",
                                name, CONTEXT_PLACEHOLDER, QUESTION_PLACEHOLDER
                            )))
                        }
                    };
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(segment);
                }
                '}' => {
                    return Err(AppError::Template(format!(
                        "unmatched '}}' at byte {}; use '}}}}' for a literal brace",
                        pos
                    )))
                }
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// Substitute the placeholders. Substituted text is not scanned again.
    pub fn render(&self, context: &str, question: &str) -> String {
        let mut out = String::with_capacity(self.source.len() + context.len() + question.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Context => out.push_str(context),
                Segment::Question => out.push_str(question),
            }
        }
        out
    }

    /// The template text as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Parse `template` and render it in one step.
pub fn build(template: &str, context: &str, question: &str) -> Result<String> {
    Ok(PromptTemplate::parse(template)?.render(context, question))
}
