// ABOUTME: Build context validation.
// ABOUTME: A context is a directory holding exactly one recognised container definition file.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Recognised container definition filenames, in lookup order.
pub const CONTAINER_FILES: [&str; 2] = ["Containerfile", "Dockerfile"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("context must be a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("missing one of: {}", join_paths(.0))]
    MissingContainerFile(Vec<PathBuf>),

    #[error("multiple matches: {}", join_paths(.0))]
    MultipleContainerFiles(Vec<PathBuf>),
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A validated build context directory and its container definition file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    dir: PathBuf,
    container_file: PathBuf,
}

impl BuildContext {
    pub fn locate(dir: impl AsRef<Path>) -> Result<Self, ContextError> {
        let dir = dir.as_ref();

        if !dir.is_dir() {
            return Err(ContextError::NotADirectory(dir.to_path_buf()));
        }

        let candidates: Vec<PathBuf> = CONTAINER_FILES.iter().map(|name| dir.join(name)).collect();
        let mut matches: Vec<PathBuf> = candidates.iter().filter(|p| p.is_file()).cloned().collect();

        match matches.len() {
            0 => Err(ContextError::MissingContainerFile(candidates)),
            1 => Ok(Self {
                dir: dir.to_path_buf(),
                container_file: matches.remove(0),
            }),
            _ => Err(ContextError::MultipleContainerFiles(matches)),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn container_file(&self) -> &Path {
        &self.container_file
    }
}
