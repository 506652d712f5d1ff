// ABOUTME: Generic external process execution primitive.
// ABOUTME: Every engine, inventory and remote-shell call goes through CommandRunner.

use crate::error::{Error, Result, SubprocessError};
use crate::output;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::os::unix::process::ExitStatusExt;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Result from execution of an external process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubprocessResult {
    pub command: Vec<String>,
    pub stdout: String,
    pub stderr: String,
    pub status: i32,
}

/// A single external process invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    /// Program followed by its arguments.
    pub command: Vec<String>,
    /// Data piped to stdin. Stdin is closed when absent.
    pub data: Option<String>,
    /// Environment overrides applied on top of the inherited environment.
    pub env: BTreeMap<String, String>,
    /// Capture stdout and stderr instead of passing them through.
    pub capture: bool,
}

impl Invocation {
    pub fn new<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn capture(mut self) -> Self {
        self.capture = true;
        self
    }

    /// Program name, if any.
    pub fn program(&self) -> Option<&str> {
        self.command.first().map(String::as_str)
    }
}

/// Runs external processes.
///
/// Implementations return `Error::Subprocess` for a non-zero exit status and
/// `Error::ProgramNotFound` when the program cannot be found.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: Invocation) -> Result<SubprocessResult>;
}

/// Runs real processes on the local machine, one at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: Invocation) -> Result<SubprocessResult> {
        let Some((program, args)) = invocation.command.split_first() else {
            return Err(Error::Configuration("cannot run an empty command".to_string()));
        };

        output::subsection(&format!(
            "Run command: {}",
            shell_words::join(&invocation.command)
        ));
        tracing::debug!(program = %program, capture = invocation.capture, "spawning process");

        let (stdout, stderr) = if invocation.capture {
            (Stdio::piped(), Stdio::piped())
        } else {
            (Stdio::inherit(), Stdio::inherit())
        };

        let stdin = if invocation.data.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        };

        let mut child = Command::new(program)
            .args(args)
            .envs(&invocation.env)
            .stdin(stdin)
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => Error::ProgramNotFound(program.clone()),
                _ => Error::Io(e),
            })?;

        if let Some(data) = &invocation.data
            && let Some(mut pipe) = child.stdin.take()
        {
            // The child may exit without reading its input; its exit status is reported below.
            let written = match pipe.write_all(data.as_bytes()).await {
                Ok(()) => pipe.shutdown().await,
                Err(e) => Err(e),
            };
            match written {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    tracing::debug!(program = %program, "stdin closed before all data was written");
                }
                Err(e) => return Err(e.into()),
            }
            drop(pipe);
        }

        let output = child.wait_with_output().await?;

        let status = output
            .status
            .code()
            .unwrap_or_else(|| -output.status.signal().unwrap_or(1));

        let result = SubprocessResult {
            command: invocation.command.clone(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status,
        };

        if result.status != 0 {
            tracing::debug!(status = result.status, "process failed");
            return Err(SubprocessError::new(result).into());
        }

        Ok(result)
    }
}
