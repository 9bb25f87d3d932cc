use std::io;
use std::os::fd::OwnedFd;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};

/// An external command whose executable has been located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub path: PathBuf,
    pub argv: Vec<String>,
}

impl ResolvedCommand {
    pub fn name(&self) -> &str {
        self.argv.first().map_or("", String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or_default()
    }
}

/// Everything needed to start one stage.
///
/// `None` streams are inherited from the interpreter. The descriptors are
/// owned by the request and closed in the parent once the spawn returns.
pub struct SpawnRequest<'a> {
    pub command: &'a ResolvedCommand,
    pub stdin: Option<OwnedFd>,
    pub stdout: Option<OwnedFd>,
    pub env: &'a [(String, String)],
}

pub trait StageChild {
    fn id(&self) -> u32;
    /// Block until the process exits and return its status.
    fn wait(&mut self) -> io::Result<i32>;
}

pub trait Spawner {
    fn spawn(&self, request: SpawnRequest<'_>) -> io::Result<Box<dyn StageChild>>;
}

pub struct OsSpawner;

impl Spawner for OsSpawner {
    fn spawn(&self, request: SpawnRequest<'_>) -> io::Result<Box<dyn StageChild>> {
        let SpawnRequest {
            command,
            stdin,
            stdout,
            env,
        } = request;

        let mut cmd = Command::new(&command.path);
        cmd.arg0(command.name())
            .args(command.args())
            .env_clear()
            .envs(env.iter().map(|(k, v)| (k, v)))
            .stdin(stdin.map_or_else(Stdio::inherit, Stdio::from))
            .stdout(stdout.map_or_else(Stdio::inherit, Stdio::from));

        let child = cmd.spawn()?;
        // `cmd` drops here and closes the parent's copies of the stage streams
        Ok(Box::new(OsChild(child)))
    }
}

struct OsChild(Child);

impl StageChild for OsChild {
    fn id(&self) -> u32 {
        self.0.id()
    }

    fn wait(&mut self) -> io::Result<i32> {
        self.0.wait().map(status_code)
    }
}

/// Exit code, or `128 + signal` for a stage killed by a signal.
pub fn status_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(1)
}
