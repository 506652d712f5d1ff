// ABOUTME: Command model for containmint: build, execute, merge and dispatch.
// ABOUTME: Each variant is validated at construction and run exactly once.

pub mod bootstrap;
mod build;
mod dispatch;
mod execute;
mod merge;

pub use build::Build;
pub use dispatch::{Dispatch, ENGINE_LINK};
pub use execute::{BuildOptions, Execute, SquashMode};
pub use merge::{Merge, MergeAttemptError, get_server};

use crate::engine::{CommandRunner, ContainerEngine};
use crate::error::Result;
use std::ffi::{OsStr, OsString};
use std::sync::Arc;

/// The local machine as seen by commands: its process runner and container engine.
pub struct Host {
    runner: Arc<dyn CommandRunner>,
    engine: ContainerEngine,
    search_path: OsString,
}

impl Host {
    /// Use the process `PATH` for engine and bootstrapper lookup.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        let search_path = std::env::var_os("PATH").unwrap_or_default();
        Self::with_search_path(runner, search_path)
    }

    pub fn with_search_path(runner: Arc<dyn CommandRunner>, search_path: impl Into<OsString>) -> Self {
        let search_path = search_path.into();
        Self {
            engine: ContainerEngine::with_search_path(runner.clone(), search_path.clone()),
            runner,
            search_path,
        }
    }

    /// Use an already configured engine.
    pub fn with_engine(runner: Arc<dyn CommandRunner>, engine: ContainerEngine) -> Self {
        Self {
            runner,
            engine,
            search_path: std::env::var_os("PATH").unwrap_or_default(),
        }
    }

    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    pub fn engine(&self) -> &ContainerEngine {
        &self.engine
    }

    pub fn search_path(&self) -> &OsStr {
        &self.search_path
    }
}

/// A CLI command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Build(Build),
    Execute(Execute),
    Merge(Merge),
    Dispatch(Dispatch),
}

impl Command {
    /// Name of the command on the CLI.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Build(_) => "build",
            Command::Execute(_) => "execute",
            Command::Merge(_) => "merge",
            Command::Dispatch(_) => "dispatch",
        }
    }

    pub async fn run(&self, host: &Host) -> Result<()> {
        match self {
            Command::Build(build) => build.run(host).await,
            Command::Execute(execute) => execute.run(host.engine()).await,
            Command::Merge(merge) => merge.run(host.engine()).await,
            Command::Dispatch(dispatch) => dispatch.run(host).await,
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Build(build) => write!(f, "{}({build:?})", self.name()),
            Command::Execute(execute) => write!(f, "{}({execute:?})", self.name()),
            Command::Merge(merge) => write!(f, "{}({merge:?})", self.name()),
            Command::Dispatch(dispatch) => write!(f, "{}({dispatch:?})", self.name()),
        }
    }
}
