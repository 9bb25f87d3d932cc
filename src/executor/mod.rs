pub mod builtin;
mod default_executor;
pub mod dispatcher;
mod executor;
pub mod path_resolver;
pub mod pipeline;
pub mod spawn;

pub use builtin::{BuiltinCommand, BuiltinContext, BuiltinManager};
pub use default_executor::DefaultExecutor;
pub use dispatcher::{Dispatch, Dispatcher};
pub use executor::{ExecError, ExecOutcome, ExecStatus, Executor};
pub use path_resolver::PathResolver;
pub use pipeline::{PipelineRunner, RunningPipeline, StageIo};
pub use spawn::{OsSpawner, ResolvedCommand, SpawnRequest, Spawner, StageChild};
