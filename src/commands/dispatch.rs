// ABOUTME: Dispatch command: the remote-side entry point of a remote build.
// ABOUTME: Reads the shipped config, ensures an engine exists, links it and runs the build.

use super::Host;
use super::bootstrap;
use super::execute::Execute;
use crate::engine::Invocation;
use crate::error::{Error, Result};
use crate::output;
use crate::remote::{CONFIG_NAME, RemoteError, current_program};
use std::path::{Path, PathBuf};

/// Fixed path left behind as a link to the engine in use.
pub const ENGINE_LINK: &str = "/tmp/containmint-engine";

/// Execute a build described by the config file next to the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    config: PathBuf,
    engine_link: PathBuf,
}

impl Dispatch {
    /// Dispatch using `config.json` in the running program's directory.
    pub fn new() -> std::result::Result<Self, RemoteError> {
        let program = current_program()?;
        let workdir = program.parent().unwrap_or_else(|| Path::new("."));
        Ok(Self::with_paths(workdir.join(CONFIG_NAME), ENGINE_LINK))
    }

    pub fn with_paths(config: impl Into<PathBuf>, engine_link: impl Into<PathBuf>) -> Self {
        Self {
            config: config.into(),
            engine_link: engine_link.into(),
        }
    }

    pub async fn run(&self, host: &Host) -> Result<()> {
        host.runner().run(Invocation::new(["uname", "-a"])).await?;

        let execute = Execute::deserialize(&self.config)?;

        match host.engine().program().await {
            Ok(_) => {}
            Err(Error::NoContainerEngineDetected { .. }) => {
                match bootstrap::select(host.search_path()) {
                    Some(bootstrapper) => bootstrapper.run(host.runner()).await?,
                    None => output::warning("No supported bootstrapper found."),
                }
            }
            Err(err) => return Err(err),
        }

        let program = host.engine().program().await?;
        link_engine(program.path(), &self.engine_link)?;

        execute.run(host.engine()).await
    }
}

/// Link `engine_link` to the engine binary, keeping any existing link.
fn link_engine(program: &Path, engine_link: &Path) -> Result<()> {
    match std::os::unix::fs::symlink(program, engine_link) {
        Ok(()) => {
            tracing::debug!(link = %engine_link.display(), target = %program.display(), "linked engine");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e.into()),
    }
}
