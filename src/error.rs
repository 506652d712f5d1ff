// ABOUTME: Application-wide error types for containmint.
// ABOUTME: Every classified failure reported to the user with a fatal message and exit status 1.

use crate::engine::SubprocessResult;
use crate::remote::RemoteError;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to detect one of the following container engines: {}", programs.join(", "))]
    NoContainerEngineDetected { programs: Vec<String> },

    #[error("Multiple servers were specified when only one is supported: {}", servers.join(", "))]
    MultipleServers { servers: Vec<String> },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Missing program: {0}")]
    ProgramNotFound(String),

    #[error("{0}")]
    Subprocess(Box<SubprocessError>),

    #[error("Container engine {engine} does not support squash mode {mode}")]
    SquashUnsupported { mode: String, engine: String },

    #[error("Unexpected {engine} output: {message}")]
    EngineOutput { engine: String, message: String },

    #[error("{0}")]
    Remote(#[from] RemoteError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SubprocessError> for Error {
    fn from(err: SubprocessError) -> Self {
        Error::Subprocess(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// An external process exited with a non-zero status.
#[derive(Debug, Clone)]
pub struct SubprocessError {
    pub result: SubprocessResult,
}

impl SubprocessError {
    pub fn new(result: SubprocessResult) -> Self {
        Self { result }
    }
}

impl fmt::Display for SubprocessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Command `{}` exited with status: {}",
            shell_words::join(&self.result.command),
            self.result.status
        )?;

        let stdout = self.result.stdout.trim();
        let stderr = self.result.stderr.trim();

        if !stdout.is_empty() {
            write!(f, "\n>>> Standard Output\n{stdout}")?;
        }

        if !stderr.is_empty() {
            write!(f, "\n>>> Standard Error\n{stderr}")?;
        }

        Ok(())
    }
}

impl std::error::Error for SubprocessError {}
