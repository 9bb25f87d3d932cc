use std::io;

use crate::ast::Pipeline;
use crate::environment::Environment;
use crate::lexer::LexError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecOutcome {
    Code(i32),
    /// The `exit` built-in asked the interpreter to stop.
    Exit(i32),
}

pub type ExecStatus = Result<ExecOutcome, ExecError>;

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("command not found: {name}")]
    CommandNotFound { name: String, stage: usize },
    #[error("permission denied: {name}")]
    PermissionDenied { name: String, stage: usize },
    #[error("failed to execute {name}: {source}")]
    SpawnFailed {
        name: String,
        stage: usize,
        source: io::Error,
    },
    #[error("no such built-in command: {0}")]
    NoSuchBuiltin(String),
    #[error("failed to create pipe: {0}")]
    PipeCreationFailed(#[source] nix::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Lex(#[from] LexError),
}

impl ExecError {
    /// Index of the pipeline stage the error belongs to, if any.
    pub fn stage(&self) -> Option<usize> {
        match self {
            ExecError::CommandNotFound { stage, .. }
            | ExecError::PermissionDenied { stage, .. }
            | ExecError::SpawnFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub trait Executor {
    fn exec(&mut self, pipeline: &Pipeline, env: &mut Environment) -> ExecStatus;
}
