mod splitter;
mod token;
mod words;

pub use splitter::PipeSplit;
pub use token::Token;
pub use words::Words;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("syntax error: unterminated quote")]
    UnbalancedQuote { quote: char, pos: usize },
    #[error("syntax error: expected command after pipe")]
    EmptyPipelineStage { index: usize },
}

pub struct Lexer;

impl Lexer {
    /// Split a raw line into pipeline stages on unquoted `|`.
    ///
    /// A blank line is an empty pipeline.
    pub fn split_pipeline(line: &str) -> Result<Vec<&str>, LexError> {
        if line.trim().is_empty() {
            return Ok(Vec::new());
        }
        PipeSplit::new(line).collect()
    }

    /// Split one stage into argument tokens, removing quotes and escapes.
    pub fn split_words(stage: &str) -> Result<Vec<Token>, LexError> {
        Words::new(stage).collect()
    }
}

pub(crate) fn is_quote(ch: char) -> bool {
    ch == '"' || ch == '\''
}

/// Whether a backslash consumes `next` while inside `quote` (or outside any quote).
pub(crate) fn escapes(quote: Option<char>, next: char) -> bool {
    match quote {
        None => true,
        Some('"') => is_quote(next) || next == '\\',
        Some(_) => is_quote(next),
    }
}
