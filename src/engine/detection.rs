// ABOUTME: Container engine detection on the executable search path.
// ABOUTME: Checks for Podman first, then Docker.

use super::types::{EngineKind, EngineProgram};
use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Detect the container engine using the process `PATH`.
pub fn detect() -> Result<EngineProgram> {
    let search_path = std::env::var_os("PATH").unwrap_or_default();
    detect_in(&search_path)
}

/// Detect the container engine in the given search path.
///
/// Detection order:
/// 1. `podman`
/// 2. `docker`
pub fn detect_in(search_path: &OsStr) -> Result<EngineProgram> {
    for kind in EngineKind::PRIORITY {
        if let Some(path) = find_program(kind.program_name(), search_path) {
            tracing::debug!(engine = %kind, path = %path.display(), "detected container engine");
            return Ok(EngineProgram::new(kind, path));
        }
    }

    Err(Error::NoContainerEngineDetected {
        programs: EngineKind::PRIORITY
            .iter()
            .map(|kind| kind.program_name().to_string())
            .collect(),
    })
}

/// Find an executable by name, searching each directory in `search_path` in order.
pub fn find_program(name: &str, search_path: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_path)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
