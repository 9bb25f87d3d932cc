use crate::ast::{Pipeline, PipelineStage};
use crate::environment::VarLookup;
use super::builtin::BuiltinManager;
use super::executor::ExecError;
use super::path_resolver::PathResolver;
use super::spawn::ResolvedCommand;

/// How a single command will be run.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Run in-process: built-in name and its arguments.
    Builtin(String, Vec<String>),
    External(ResolvedCommand),
}

pub struct Dispatcher {
    builtins: BuiltinManager,
    resolver: PathResolver,
}

impl Dispatcher {
    pub fn new() -> Self {
        Dispatcher {
            builtins: BuiltinManager::new(),
            resolver: PathResolver,
        }
    }

    pub fn builtins(&self) -> &BuiltinManager {
        &self.builtins
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Decide how a lone command runs. Built-in names win over `PATH`.
    pub fn dispatch<L: VarLookup + ?Sized>(
        &self,
        stage: &PipelineStage,
        vars: &L,
    ) -> Result<Dispatch, ExecError> {
        if self.builtins.is_builtin(stage.name()) {
            log::debug!("`{}` is a built-in", stage.name());
            return Ok(Dispatch::Builtin(stage.name().to_string(), stage.args().to_vec()));
        }
        self.resolver
            .resolve(&stage.argv, 0, vars)
            .map(Dispatch::External)
    }

    /// Resolve every stage of a pipeline as an external command.
    ///
    /// Fails on the first stage that cannot be resolved, before anything has
    /// been started.
    pub fn resolve_all<L: VarLookup + ?Sized>(
        &self,
        pipeline: &Pipeline,
        vars: &L,
    ) -> Result<Vec<ResolvedCommand>, ExecError> {
        pipeline
            .stages
            .iter()
            .enumerate()
            .map(|(i, stage)| self.resolver.resolve(&stage.argv, i, vars))
            .collect()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
