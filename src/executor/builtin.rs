mod commands;
mod manager;

use std::io::Write;

pub use manager::{BuiltinCommand, BuiltinManager};

use crate::environment::Environment;
use crate::parser::parse_line;
use super::dispatcher::Dispatcher;
use super::executor::ExecError;
use super::pipeline::PipelineRunner;
use super::spawn::Spawner;

/// What a built-in may touch while it runs inside the interpreter process.
pub struct BuiltinContext<'a> {
    pub env: &'a mut Environment,
    pub stdout: &'a mut dyn Write,
    pub stderr: &'a mut dyn Write,
    pub dispatcher: &'a Dispatcher,
    pub spawner: &'a dyn Spawner,
}

impl BuiltinContext<'_> {
    /// Run a command line as external processes and return its stdout.
    pub fn capture(&mut self, line: &str) -> Result<String, ExecError> {
        let pipeline = parse_line(line, &*self.env)?;
        if pipeline.is_empty() {
            return Ok(String::new());
        }
        let stages = self.dispatcher.resolve_all(&pipeline, &*self.env)?;
        let (output, status) = PipelineRunner::new(self.spawner).capture(&stages, &self.env.vars())?;
        log::debug!("captured {} byte(s) from `{}`, status {}", output.len(), line, status);
        Ok(output)
    }
}
