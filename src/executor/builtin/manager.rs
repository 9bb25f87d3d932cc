use std::collections::HashMap;

use crate::executor::{ExecError, ExecStatus};
use super::commands::{CdCommand, ExitCommand, PwdCommand, VarCommand, WhichCommand};
use super::BuiltinContext;

pub trait BuiltinCommand {
    fn name(&self) -> &'static str;
    /// `args` excludes the command name.
    fn run(&self, args: &[String], ctx: &mut BuiltinContext<'_>) -> ExecStatus;
}

pub struct BuiltinManager {
    commands: HashMap<String, Box<dyn BuiltinCommand>>,
}

impl BuiltinManager {
    pub fn new() -> Self {
        let mut mgr = BuiltinManager {
            commands: HashMap::new(),
        };
        mgr.register(Box::new(VarCommand));
        mgr.register(Box::new(CdCommand));
        mgr.register(Box::new(PwdCommand));
        mgr.register(Box::new(WhichCommand));
        mgr.register(Box::new(ExitCommand));
        mgr
    }

    pub fn register(&mut self, cmd: Box<dyn BuiltinCommand>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn execute(
        &self,
        name: &str,
        args: &[String],
        ctx: &mut BuiltinContext<'_>,
    ) -> ExecStatus {
        if let Some(cmd) = self.commands.get(name) {
            cmd.run(args, ctx)
        } else {
            Err(ExecError::NoSuchBuiltin(name.to_string()))
        }
    }
}

impl Default for BuiltinManager {
    fn default() -> Self {
        Self::new()
    }
}
