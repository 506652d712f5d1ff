// ABOUTME: Container engine abstraction over Docker and Podman command lines.
// ABOUTME: Resolves the engine once per process and runs its subcommands.

mod detection;
mod history;
mod process;
mod types;

pub use detection::{detect, detect_in, find_program};
pub use history::{HistoryLayer, non_empty_layers, parse_history};
pub use process::{CommandRunner, Invocation, ProcessRunner, SubprocessResult};
pub use types::{EngineKind, EngineProgram};

use crate::error::{Error, Result};
use crate::types::ImageReference;
use std::ffi::OsString;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Single entry point for running container engine subcommands.
///
/// The engine program is detected on first use, probed with `--version` and
/// then cached for the lifetime of this value.
pub struct ContainerEngine {
    runner: Arc<dyn CommandRunner>,
    search_path: Option<OsString>,
    program: OnceCell<EngineProgram>,
}

impl ContainerEngine {
    /// Create an engine that detects its program on the process `PATH`.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            search_path: None,
            program: OnceCell::new(),
        }
    }

    /// Create an engine that detects its program in the given search path.
    pub fn with_search_path(runner: Arc<dyn CommandRunner>, search_path: impl Into<OsString>) -> Self {
        Self {
            runner,
            search_path: Some(search_path.into()),
            program: OnceCell::new(),
        }
    }

    /// Create an engine with an already resolved program. No probe is run.
    pub fn with_program(runner: Arc<dyn CommandRunner>, program: EngineProgram) -> Self {
        Self {
            runner,
            search_path: None,
            program: OnceCell::new_with(Some(program)),
        }
    }

    /// The resolved engine program.
    pub async fn program(&self) -> Result<&EngineProgram> {
        self.program
            .get_or_try_init(|| async {
                let program = match &self.search_path {
                    Some(search_path) => detect_in(search_path)?,
                    None => detect()?,
                };

                // Fail fast if the binary is broken.
                self.runner
                    .run(Invocation::new([program.kind.program_name(), "--version"]))
                    .await?;

                Ok::<_, Error>(program)
            })
            .await
    }

    /// The resolved engine type.
    pub async fn kind(&self) -> Result<EngineKind> {
        Ok(self.program().await?.kind)
    }

    /// Run an engine subcommand, passing its output through.
    pub async fn run<S: AsRef<str>>(&self, args: &[S]) -> Result<SubprocessResult> {
        self.invoke(Invocation::new(args.iter().map(|arg| arg.as_ref().to_string())))
            .await
    }

    /// Run an engine subcommand described by `invocation`, whose command holds
    /// only the subcommand and its arguments.
    pub async fn invoke(&self, mut invocation: Invocation) -> Result<SubprocessResult> {
        let program = self.program().await?;
        invocation
            .command
            .insert(0, program.kind.program_name().to_string());
        self.runner.run(invocation).await
    }

    /// Read the layer history of a local image.
    pub async fn history(&self, image: &ImageReference) -> Result<Vec<HistoryLayer>> {
        let kind = self.kind().await?;
        let tag = image.to_string();
        let result = self
            .invoke(
                Invocation::new(["history", "--format", "{{json .}}", "--human=false", tag.as_str()])
                    .capture(),
            )
            .await?;

        parse_history(kind, &result.stdout)
    }
}

impl std::fmt::Debug for ContainerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerEngine")
            .field("program", &self.program.get())
            .finish()
    }
}
