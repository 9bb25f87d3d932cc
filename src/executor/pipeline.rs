use std::fs::File;
use std::io::Read;
use std::os::fd::OwnedFd;

use nix::fcntl::OFlag;
use nix::unistd::pipe2;

use super::executor::ExecError;
use super::spawn::{ResolvedCommand, SpawnRequest, Spawner, StageChild};

/// Both halves of one pipe between adjacent stages.
///
/// Each half is handed out at most once; whatever is still held is closed on
/// drop. Descriptors are close-on-exec, so a child only keeps the ends it
/// adopted as stdin/stdout.
pub struct PipeEndpoint {
    read: Option<OwnedFd>,
    write: Option<OwnedFd>,
}

impl PipeEndpoint {
    pub fn open() -> Result<Self, ExecError> {
        let (read, write) = pipe2(OFlag::O_CLOEXEC).map_err(ExecError::PipeCreationFailed)?;
        Ok(PipeEndpoint {
            read: Some(read),
            write: Some(write),
        })
    }

    pub fn take_read(&mut self) -> Option<OwnedFd> {
        self.read.take()
    }

    pub fn take_write(&mut self) -> Option<OwnedFd> {
        self.write.take()
    }
}

/// Outer streams of a whole pipeline; `None` means inherited.
#[derive(Default)]
pub struct StageIo {
    pub stdin: Option<OwnedFd>,
    pub stdout: Option<OwnedFd>,
}

struct StageHandle {
    name: String,
    child: Box<dyn StageChild>,
}

/// Launched stages that have not been reaped yet.
pub struct RunningPipeline {
    stages: Vec<StageHandle>,
}

impl RunningPipeline {
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn pids(&self) -> Vec<u32> {
        self.stages.iter().map(|s| s.child.id()).collect()
    }

    /// Reap every stage. The pipeline's status is the last stage's status.
    pub fn wait(self) -> Result<i32, ExecError> {
        let mut status = 0;
        let mut failure = None;

        for (i, mut stage) in self.stages.into_iter().enumerate() {
            match stage.child.wait() {
                Ok(code) => {
                    log::debug!("stage {} `{}` exited with {}", i, stage.name, code);
                    status = code;
                }
                Err(e) => {
                    log::warn!("failed to wait for stage {} `{}`: {}", i, stage.name, e);
                    failure.get_or_insert(e);
                }
            }
        }

        match failure {
            Some(e) => Err(ExecError::Io(e)),
            None => Ok(status),
        }
    }
}

pub struct PipelineRunner<'a> {
    spawner: &'a dyn Spawner,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(spawner: &'a dyn Spawner) -> Self {
        PipelineRunner { spawner }
    }

    /// Launch every stage left to right without waiting on any of them.
    ///
    /// All pipes are created before the first spawn. If a spawn fails, every
    /// pipe end still held here is closed and the stages already running are
    /// waited out before the error is returned.
    pub fn spawn(
        &self,
        stages: &[ResolvedCommand],
        env: &[(String, String)],
        io: StageIo,
    ) -> Result<RunningPipeline, ExecError> {
        let n = stages.len();
        let StageIo {
            mut stdin,
            mut stdout,
        } = io;

        let mut pipes = (1..n)
            .map(|_| PipeEndpoint::open())
            .collect::<Result<Vec<_>, _>>()?;
        if !pipes.is_empty() {
            log::debug!("created {} pipe(s) for {} stages", pipes.len(), n);
        }

        let mut running = RunningPipeline {
            stages: Vec::with_capacity(n),
        };

        for (i, command) in stages.iter().enumerate() {
            let input = if i == 0 {
                stdin.take()
            } else {
                pipes[i - 1].take_read()
            };
            let output = if i + 1 == n {
                stdout.take()
            } else {
                pipes[i].take_write()
            };

            let request = SpawnRequest {
                command,
                stdin: input,
                stdout: output,
                env,
            };
            match self.spawner.spawn(request) {
                Ok(child) => {
                    log::debug!("spawned stage {} `{}` as pid {}", i, command.name(), child.id());
                    running.stages.push(StageHandle {
                        name: command.name().to_string(),
                        child,
                    });
                }
                Err(source) => {
                    log::warn!("spawn of stage {} `{}` failed: {}", i, command.name(), source);
                    pipes.clear();
                    drop(stdout.take());
                    if let Err(e) = running.wait() {
                        log::warn!("while reaping after failed spawn: {}", e);
                    }
                    return Err(ExecError::SpawnFailed {
                        name: command.name().to_string(),
                        stage: i,
                        source,
                    });
                }
            }
        }

        Ok(running)
    }

    /// Run the stages with inherited outer streams and return the last status.
    pub fn run(&self, stages: &[ResolvedCommand], env: &[(String, String)]) -> Result<i32, ExecError> {
        self.spawn(stages, env, StageIo::default())?.wait()
    }

    /// Run the stages and collect what the last one writes to stdout.
    pub fn capture(
        &self,
        stages: &[ResolvedCommand],
        env: &[(String, String)],
    ) -> Result<(String, i32), ExecError> {
        let mut pipe = PipeEndpoint::open()?;
        let io = StageIo {
            stdin: None,
            stdout: pipe.take_write(),
        };
        let running = self.spawn(stages, env, io)?;

        // Read to EOF before reaping so a full pipe cannot stall the last stage.
        let mut output = Vec::new();
        let read = match pipe.take_read() {
            Some(fd) => File::from(fd).read_to_end(&mut output).map(|_| ()),
            None => Ok(()),
        };
        let status = running.wait()?;
        read?;

        Ok((String::from_utf8_lossy(&output).into_owned(), status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::io;
    use std::os::fd::AsRawFd;
    use std::path::PathBuf;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    struct Record {
        name: String,
        stdin: Option<i32>,
        stdout: Option<i32>,
    }

    /// Records requests, fails on a chosen stage name, and reports fixed codes.
    struct FakeSpawner {
        records: Rc<RefCell<Vec<Record>>>,
        fail_on: Option<&'static str>,
        waited: Rc<RefCell<Vec<String>>>,
    }

    impl FakeSpawner {
        fn new(fail_on: Option<&'static str>) -> Self {
            FakeSpawner {
                records: Rc::new(RefCell::new(Vec::new())),
                fail_on,
                waited: Rc::new(RefCell::new(Vec::new())),
            }
        }
    }

    struct FakeChild {
        name: String,
        code: i32,
        waited: Rc<RefCell<Vec<String>>>,
    }

    impl StageChild for FakeChild {
        fn id(&self) -> u32 {
            1
        }

        fn wait(&mut self) -> io::Result<i32> {
            self.waited.borrow_mut().push(self.name.clone());
            Ok(self.code)
        }
    }

    impl Spawner for FakeSpawner {
        fn spawn(&self, request: SpawnRequest<'_>) -> io::Result<Box<dyn StageChild>> {
            let name = request.command.name().to_string();
            if self.fail_on == Some(name.as_str()) {
                return Err(io::Error::new(io::ErrorKind::Other, "boom"));
            }
            self.records.borrow_mut().push(Record {
                name: name.clone(),
                stdin: request.stdin.as_ref().map(|fd| fd.as_raw_fd()),
                stdout: request.stdout.as_ref().map(|fd| fd.as_raw_fd()),
            });
            let code = request.command.argv.get(1).and_then(|c| c.parse().ok()).unwrap_or(0);
            Ok(Box::new(FakeChild {
                name,
                code,
                waited: Rc::clone(&self.waited),
            }))
        }
    }

    fn cmd(name: &str, code: i32) -> ResolvedCommand {
        ResolvedCommand {
            path: PathBuf::from(format!("/fake/{}", name)),
            argv: vec![name.to_string(), code.to_string()],
        }
    }

    #[test]
    fn test_single_stage_inherits_streams() {
        let spawner = FakeSpawner::new(None);
        let status = PipelineRunner::new(&spawner).run(&[cmd("a", 3)], &[]).unwrap();
        assert_eq!(status, 3);
        let records = spawner.records.borrow();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].stdin, None);
        assert_eq!(records[0].stdout, None);
    }

    #[test]
    fn test_wiring_of_three_stages() {
        let spawner = FakeSpawner::new(None);
        let stages = [cmd("a", 1), cmd("b", 2), cmd("c", 0)];
        let status = PipelineRunner::new(&spawner).run(&stages, &[]).unwrap();

        // last stage wins regardless of earlier statuses
        assert_eq!(status, 0);

        let records = spawner.records.borrow();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].stdin, None);
        assert!(records[0].stdout.is_some());
        assert!(records[1].stdin.is_some());
        assert!(records[1].stdout.is_some());
        assert!(records[2].stdin.is_some());
        assert_eq!(records[2].stdout, None);
        assert_eq!(*spawner.waited.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_spawn_failure_waits_out_earlier_stages() {
        let spawner = FakeSpawner::new(Some("b"));
        let stages = [cmd("a", 0), cmd("b", 0), cmd("c", 0)];
        let err = PipelineRunner::new(&spawner).run(&stages, &[]).unwrap_err();

        assert!(matches!(err, ExecError::SpawnFailed { stage: 1, ref name, .. } if name == "b"));
        assert_eq!(spawner.records.borrow().len(), 1);
        assert_eq!(*spawner.waited.borrow(), vec!["a"]);
    }

    #[test]
    fn test_running_pipeline_reports_pids() {
        let spawner = FakeSpawner::new(None);
        let running = PipelineRunner::new(&spawner)
            .spawn(&[cmd("a", 0), cmd("b", 5)], &[], StageIo::default())
            .unwrap();
        assert_eq!(running.len(), 2);
        assert_eq!(running.pids(), vec![1, 1]);
        assert_eq!(running.wait().unwrap(), 5);
    }

    #[test]
    fn test_pipe_endpoint_hands_out_once() {
        let mut pipe = PipeEndpoint::open().unwrap();
        assert!(pipe.take_read().is_some());
        assert!(pipe.take_read().is_none());
        assert!(pipe.take_write().is_some());
        assert!(pipe.take_write().is_none());
    }
}
