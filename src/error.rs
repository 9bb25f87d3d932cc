use crate::config::ConfigError;
use crate::executor::ExecError;
use crate::lexer::LexError;

/// Anything that can go wrong while handling one input line or starting up.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
