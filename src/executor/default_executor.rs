use std::io::{self, Write};

use crate::ast::Pipeline;
use crate::environment::Environment;
use crate::executor::{ExecOutcome, ExecStatus, Executor};
use super::builtin::BuiltinContext;
use super::dispatcher::{Dispatch, Dispatcher};
use super::pipeline::PipelineRunner;
use super::spawn::{OsSpawner, Spawner};

pub struct DefaultExecutor {
    dispatcher: Dispatcher,
    spawner: Box<dyn Spawner>,
}

impl Executor for DefaultExecutor {
    fn exec(&mut self, pipeline: &Pipeline, env: &mut Environment) -> ExecStatus {
        let stdout = io::stdout();
        let stderr = io::stderr();
        self.exec_with(pipeline, env, &mut stdout.lock(), &mut stderr.lock())
    }
}

impl DefaultExecutor {
    pub fn new() -> Self {
        Self::with_spawner(Box::new(OsSpawner))
    }

    pub fn with_spawner(spawner: Box<dyn Spawner>) -> Self {
        DefaultExecutor {
            dispatcher: Dispatcher::new(),
            spawner,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Run `pipeline` with built-in output going to the given writers.
    ///
    /// A lone command may be a built-in. Every stage of a longer pipeline is
    /// resolved before the first one is started.
    pub fn exec_with(
        &mut self,
        pipeline: &Pipeline,
        env: &mut Environment,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> ExecStatus {
        let runner = PipelineRunner::new(self.spawner.as_ref());

        match pipeline.stages.as_slice() {
            [] => Ok(ExecOutcome::Code(0)),
            [stage] => match self.dispatcher.dispatch(stage, &*env)? {
                Dispatch::Builtin(name, args) => {
                    let mut ctx = BuiltinContext {
                        env,
                        stdout: &mut *stdout,
                        stderr: &mut *stderr,
                        dispatcher: &self.dispatcher,
                        spawner: self.spawner.as_ref(),
                    };
                    let outcome = self.dispatcher.builtins().execute(&name, &args, &mut ctx);
                    stdout.flush()?;
                    stderr.flush()?;
                    outcome
                }
                Dispatch::External(command) => {
                    stdout.flush()?;
                    let code = runner.run(std::slice::from_ref(&command), &env.vars())?;
                    Ok(ExecOutcome::Code(code))
                }
            },
            _ => {
                let stages = self.dispatcher.resolve_all(pipeline, &*env)?;
                stdout.flush()?;
                let code = runner.run(&stages, &env.vars())?;
                Ok(ExecOutcome::Code(code))
            }
        }
    }
}

impl Default for DefaultExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::PipelineStage;
    use crate::executor::spawn::{SpawnRequest, StageChild};
    use crate::executor::ExecError;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records the name of every command it is asked to start.
    struct RecordingSpawner {
        spawned: Rc<RefCell<Vec<String>>>,
    }

    struct DoneChild;

    impl StageChild for DoneChild {
        fn id(&self) -> u32 {
            42
        }

        fn wait(&mut self) -> io::Result<i32> {
            Ok(0)
        }
    }

    impl Spawner for RecordingSpawner {
        fn spawn(&self, request: SpawnRequest<'_>) -> io::Result<Box<dyn StageChild>> {
            self.spawned.borrow_mut().push(request.command.name().to_string());
            Ok(Box::new(DoneChild))
        }
    }

    fn recording() -> (DefaultExecutor, Rc<RefCell<Vec<String>>>) {
        let spawned = Rc::new(RefCell::new(Vec::new()));
        let executor = DefaultExecutor::with_spawner(Box::new(RecordingSpawner {
            spawned: Rc::clone(&spawned),
        }));
        (executor, spawned)
    }

    fn pipeline(stages: &[&[&str]]) -> Pipeline {
        Pipeline {
            stages: stages
                .iter()
                .map(|argv| PipelineStage {
                    argv: argv.iter().map(|s| s.to_string()).collect(),
                })
                .collect(),
        }
    }

    fn test_env() -> Environment {
        let mut env = Environment::empty("/");
        env.set("PATH", "/bin:/usr/bin");
        env
    }

    fn exec(executor: &mut DefaultExecutor, p: &Pipeline, env: &mut Environment) -> (ExecStatus, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let status = executor.exec_with(p, env, &mut out, &mut err);
        (status, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_empty_pipeline_is_success() {
        let (mut executor, spawned) = recording();
        let (status, _) = exec(&mut executor, &Pipeline::default(), &mut test_env());
        assert_eq!(status.unwrap(), ExecOutcome::Code(0));
        assert!(spawned.borrow().is_empty());
    }

    #[test]
    fn test_unresolvable_middle_stage_spawns_nothing() {
        let (mut executor, spawned) = recording();
        let p = pipeline(&[&["sh"], &["mysh-no-such-cmd"], &["cat"]]);
        let (status, _) = exec(&mut executor, &p, &mut test_env());
        assert!(matches!(
            status,
            Err(ExecError::CommandNotFound { stage: 1, .. })
        ));
        assert!(spawned.borrow().is_empty());
    }

    #[test]
    fn test_all_stages_spawned_in_order() {
        let (mut executor, spawned) = recording();
        let p = pipeline(&[&["sh", "-c", "true"], &["cat"], &["sh"]]);
        let (status, _) = exec(&mut executor, &p, &mut test_env());
        assert_eq!(status.unwrap(), ExecOutcome::Code(0));
        assert_eq!(*spawned.borrow(), vec!["sh", "cat", "sh"]);
    }

    #[test]
    fn test_lone_builtin_runs_in_process() {
        let (mut executor, spawned) = recording();
        let mut env = test_env();
        let (status, out) = exec(&mut executor, &pipeline(&[&["pwd"]]), &mut env);
        assert_eq!(status.unwrap(), ExecOutcome::Code(0));
        assert_eq!(out, "/\n");

        let (status, _) = exec(&mut executor, &pipeline(&[&["var", "GREETING", "hi"]]), &mut env);
        assert_eq!(status.unwrap(), ExecOutcome::Code(0));
        assert_eq!(env.get("GREETING"), Some("hi"));
        assert!(spawned.borrow().is_empty());
    }

    #[test]
    fn test_exit_builtin() {
        let (mut executor, _) = recording();
        let (status, _) = exec(&mut executor, &pipeline(&[&["exit", "4"]]), &mut test_env());
        assert_eq!(status.unwrap(), ExecOutcome::Exit(4));
    }

    #[test]
    fn test_real_last_stage_status() {
        let mut executor = DefaultExecutor::new();
        let p = pipeline(&[&["sh", "-c", "exit 2"], &["sh", "-c", "exit 3"]]);
        let (status, _) = exec(&mut executor, &p, &mut test_env());
        assert_eq!(status.unwrap(), ExecOutcome::Code(3));
    }
}
