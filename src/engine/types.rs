// ABOUTME: Container engine type definitions for Docker and Podman.
// ABOUTME: Includes EngineKind enum and the resolved EngineProgram.

use std::path::{Path, PathBuf};

/// The container engine type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    Podman,
    Docker,
}

impl EngineKind {
    /// Candidate engines in detection priority order.
    pub const PRIORITY: [EngineKind; 2] = [EngineKind::Podman, EngineKind::Docker];

    /// Name of the executable on the search path.
    pub fn program_name(&self) -> &'static str {
        match self {
            EngineKind::Podman => "podman",
            EngineKind::Docker => "docker",
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.program_name())
    }
}

/// A resolved container engine executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineProgram {
    /// The type of engine.
    pub kind: EngineKind,
    /// Absolute path to the executable.
    pub path: PathBuf,
}

impl EngineProgram {
    pub fn new(kind: EngineKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
