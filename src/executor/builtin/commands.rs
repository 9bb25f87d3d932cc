use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::executor::{ExecOutcome, ExecStatus};
use crate::expander::{expand_tilde, is_valid_name};
use super::BuiltinContext;
use super::manager::BuiltinCommand;

fn fail(ctx: &mut BuiltinContext<'_>, msg: std::fmt::Arguments<'_>) -> ExecStatus {
    writeln!(ctx.stderr, "{}", msg)?;
    Ok(ExecOutcome::Code(1))
}

pub struct VarCommand;

impl BuiltinCommand for VarCommand {
    fn name(&self) -> &'static str {
        "var"
    }
    fn run(&self, args: &[String], ctx: &mut BuiltinContext<'_>) -> ExecStatus {
        if args.is_empty() {
            return fail(ctx, format_args!("var: expected 2 arguments, got 0"));
        }

        let capture = match args[0].strip_prefix('-') {
            Some("s") => true,
            Some(opt) => {
                let first: String = opt.chars().take(1).collect();
                return fail(ctx, format_args!("var: invalid option: -{}", first));
            }
            None => false,
        };

        let rest = &args[usize::from(capture)..];
        if rest.len() != 2 {
            return fail(ctx, format_args!("var: expected 2 arguments, got {}", rest.len()));
        }

        let name = &rest[0];
        if !is_valid_name(name) {
            return fail(ctx, format_args!("var: invalid characters for variable {}", name));
        }

        let value = if capture {
            match ctx.capture(&rest[1]) {
                Ok(output) => output,
                Err(e) => return fail(ctx, format_args!("var: failed to execute command: {}", e)),
            }
        } else {
            rest[1].clone()
        };

        ctx.env.set(name, &value);
        Ok(ExecOutcome::Code(0))
    }
}

pub struct CdCommand;

impl BuiltinCommand for CdCommand {
    fn name(&self) -> &'static str {
        "cd"
    }
    fn run(&self, args: &[String], ctx: &mut BuiltinContext<'_>) -> ExecStatus {
        if args.len() > 1 {
            return fail(ctx, format_args!("cd: too many arguments"));
        }

        let current = ctx.env.logical_pwd().to_path_buf();
        let target = match args.first().map(|a| a.as_str()) {
            Some("-") => {
                let previous = ctx
                    .env
                    .get("OLDPWD")
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| current.to_string_lossy().into_owned());
                writeln!(ctx.stdout, "{}", previous)?;
                previous
            }
            Some(arg) => expand_tilde(arg, &*ctx.env),
            None => match ctx.env.get("HOME") {
                Some(home) => home.to_string(),
                None => return fail(ctx, format_args!("cd: HOME not set")),
            },
        };

        let destination = normalize(&current.join(&target));
        if let Err(e) = std::env::set_current_dir(&destination) {
            return match e.kind() {
                ErrorKind::NotFound => fail(ctx, format_args!("cd: no such file or directory: {}", target)),
                ErrorKind::NotADirectory => fail(ctx, format_args!("cd: not a directory: {}", target)),
                ErrorKind::PermissionDenied => fail(ctx, format_args!("cd: permission denied: {}", target)),
                _ => fail(ctx, format_args!("cd: {}: {}", target, e)),
            };
        }

        log::debug!("cd {} -> {}", current.display(), destination.display());
        ctx.env.set("OLDPWD", &current.to_string_lossy());
        ctx.env.set("PWD", &destination.to_string_lossy());
        ctx.env.set_logical_pwd(destination);
        Ok(ExecOutcome::Code(0))
    }
}

pub struct PwdCommand;

impl BuiltinCommand for PwdCommand {
    fn name(&self) -> &'static str {
        "pwd"
    }
    fn run(&self, args: &[String], ctx: &mut BuiltinContext<'_>) -> ExecStatus {
        for arg in args {
            let Some(options) = arg.strip_prefix('-') else {
                return fail(ctx, format_args!("pwd: not expecting any arguments"));
            };
            if let Some(bad) = options.chars().find(|&c| c != 'P') {
                return fail(ctx, format_args!("pwd: invalid option: -{}", bad));
            }
        }

        let physical = args.iter().any(|a| a.contains('P'));
        if physical {
            let path = std::env::current_dir().and_then(|p| p.canonicalize())?;
            writeln!(ctx.stdout, "{}", path.display())?;
        } else {
            writeln!(ctx.stdout, "{}", ctx.env.logical_pwd().display())?;
        }
        Ok(ExecOutcome::Code(0))
    }
}

pub struct WhichCommand;

impl BuiltinCommand for WhichCommand {
    fn name(&self) -> &'static str {
        "which"
    }
    fn run(&self, args: &[String], ctx: &mut BuiltinContext<'_>) -> ExecStatus {
        if args.is_empty() {
            return fail(ctx, format_args!("usage: which command ..."));
        }

        let mut missing = false;
        for name in args {
            if ctx.dispatcher.builtins().is_builtin(name) {
                writeln!(ctx.stdout, "{}: shell built-in command", name)?;
            } else if let Some(path) = ctx.dispatcher.resolver().find_executable(name, &*ctx.env) {
                writeln!(ctx.stdout, "{}", path.display())?;
            } else {
                writeln!(ctx.stdout, "{} not found", name)?;
                missing = true;
            }
        }
        Ok(ExecOutcome::Code(i32::from(missing)))
    }
}

pub struct ExitCommand;

impl BuiltinCommand for ExitCommand {
    fn name(&self) -> &'static str {
        "exit"
    }
    fn run(&self, args: &[String], ctx: &mut BuiltinContext<'_>) -> ExecStatus {
        if args.len() > 1 {
            return fail(ctx, format_args!("exit: too many arguments"));
        }
        match args.first() {
            None => Ok(ExecOutcome::Exit(0)),
            Some(code) => match code.trim().parse::<i32>() {
                Ok(code) => Ok(ExecOutcome::Exit(code)),
                Err(_) => fail(ctx, format_args!("exit: non-integer exit code provided: {}", code)),
            },
        }
    }
}

/// Lexically resolve `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push("/");
    }
    out
}
