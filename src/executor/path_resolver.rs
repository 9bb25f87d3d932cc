use std::env;
use std::path::{Path, PathBuf};

use nix::unistd::{access, AccessFlags};

use crate::environment::VarLookup;
use super::executor::ExecError;
use super::spawn::ResolvedCommand;

const DEFAULT_PATH: &str = "/bin:/usr/bin";

pub struct PathResolver;

impl PathResolver {
    /// First regular file named `command`, searching `PATH` unless the name
    /// contains a slash.
    pub fn find<L: VarLookup + ?Sized>(&self, command: &str, vars: &L) -> Option<PathBuf> {
        self.search(command, vars, |p| p.is_file())
    }

    /// Like [`find`](Self::find) but skips files the user may not execute.
    pub fn find_executable<L: VarLookup + ?Sized>(&self, command: &str, vars: &L) -> Option<PathBuf> {
        self.search(command, vars, |p| p.is_file() && is_executable(p))
    }

    /// Resolve the argv of pipeline stage `stage` to an executable.
    pub fn resolve<L: VarLookup + ?Sized>(
        &self,
        argv: &[String],
        stage: usize,
        vars: &L,
    ) -> Result<ResolvedCommand, ExecError> {
        let Some(name) = argv.first() else {
            return Err(ExecError::CommandNotFound {
                name: String::new(),
                stage,
            });
        };
        let path = self.find(name, vars).ok_or_else(|| ExecError::CommandNotFound {
            name: name.clone(),
            stage,
        })?;

        if !is_executable(&path) {
            return Err(ExecError::PermissionDenied {
                name: name.clone(),
                stage,
            });
        }

        log::debug!("resolved `{}` to {}", name, path.display());
        Ok(ResolvedCommand {
            path,
            argv: argv.to_vec(),
        })
    }

    fn search<L, F>(&self, command: &str, vars: &L, accept: F) -> Option<PathBuf>
    where
        L: VarLookup + ?Sized,
        F: Fn(&Path) -> bool,
    {
        if command.is_empty() {
            return None;
        }

        if command.contains('/') {
            let path = Path::new(command);
            return accept(path).then(|| path.to_path_buf());
        }

        let paths = vars.lookup("PATH").unwrap_or(DEFAULT_PATH);
        env::split_paths(paths)
            .map(|dir| dir.join(command))
            .find(|full_path| accept(full_path))
    }
}

fn is_executable(path: &Path) -> bool {
    access(path, AccessFlags::X_OK).is_ok()
}
