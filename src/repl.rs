use std::io::{self, BufRead};

use crate::environment::Environment;
use crate::error::ShellError;
use crate::executor::{DefaultExecutor, ExecOutcome, Executor};
use crate::parser::parse_line;
use crate::prompt::ShellPrompt;

const DEFAULT_PROMPT: &str = ">> ";

/// One interpreter session: the variables plus the executor that runs lines.
pub struct Shell {
    env: Environment,
    executor: DefaultExecutor,
}

impl Shell {
    pub fn new(env: Environment) -> Self {
        Self::with_executor(env, DefaultExecutor::new())
    }

    pub fn with_executor(env: Environment, executor: DefaultExecutor) -> Self {
        Shell { env, executor }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Current `PROMPT`, read fresh so `var PROMPT ...` takes effect at once.
    pub fn prompt_text(&self) -> &str {
        self.env.get("PROMPT").unwrap_or(DEFAULT_PROMPT)
    }

    /// Parse and run one input line.
    pub fn run_line(&mut self, line: &str) -> Result<ExecOutcome, ShellError> {
        let pipeline = parse_line(line, &self.env)?;
        log::debug!("line parsed into {} stage(s)", pipeline.len());
        Ok(self.executor.exec(&pipeline, &mut self.env)?)
    }

    /// Read, run, and report until `exit` or end of input. Returns the exit code.
    pub fn run_interactive(&mut self, prompt: &ShellPrompt) -> i32 {
        self.run_interactive_from(prompt, &mut io::stdin().lock())
    }

    /// The interactive loop over any line source.
    ///
    /// A read interrupted by Ctrl-C shows the prompt again.
    pub fn run_interactive_from<R: BufRead + ?Sized>(
        &mut self,
        prompt: &ShellPrompt,
        input: &mut R,
    ) -> i32 {
        loop {
            if let Err(e) = prompt.show_prompt(self.prompt_text()) {
                log::warn!("failed to write prompt: {}", e);
            }

            let line = match prompt.read_line_from(input) {
                Ok(Some(line)) => line,
                Ok(None) => return 0,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    log::debug!("read interrupted");
                    continue;
                }
                Err(e) => {
                    eprintln!("mysh: {}", e);
                    return 1;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            match self.run_line(&line) {
                Ok(ExecOutcome::Exit(code)) => return code,
                Ok(ExecOutcome::Code(code)) => log::debug!("status {}", code),
                Err(e) => eprintln!("mysh: {}", e),
            }
        }
    }
}
