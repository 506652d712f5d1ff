// ABOUTME: Container image reference parsing and validation.
// ABOUTME: Accepts only the fully qualified server/repo:tag form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Human readable form every image reference must follow.
pub const TAG_FORMAT: &str = "{server}/{repo}:{tag}";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseImageRefError {
    #[error("image reference cannot be empty")]
    Empty,

    #[error("missing server in image reference: {0}")]
    MissingServer(String),

    #[error("missing tag in image reference: {0}")]
    MissingTag(String),

    #[error("invalid image reference format: {0}")]
    InvalidFormat(String),
}

/// A parsed `server/repo:tag` image reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageReference {
    server: String,
    repo: String,
    tag: String,
}

impl ImageReference {
    pub fn parse(input: &str) -> Result<Self, ParseImageRefError> {
        if input.is_empty() {
            return Err(ParseImageRefError::Empty);
        }

        if input.chars().any(char::is_whitespace) {
            return Err(ParseImageRefError::InvalidFormat(input.to_string()));
        }

        let (server, name) = input
            .split_once('/')
            .ok_or_else(|| ParseImageRefError::MissingServer(input.to_string()))?;

        let (repo, tag) = name
            .split_once(':')
            .ok_or_else(|| ParseImageRefError::MissingTag(input.to_string()))?;

        if server.is_empty() || repo.is_empty() || tag.is_empty() {
            return Err(ParseImageRefError::InvalidFormat(input.to_string()));
        }

        if tag.contains(':') || tag.contains('/') {
            return Err(ParseImageRefError::InvalidFormat(input.to_string()));
        }

        Ok(Self {
            server: server.to_string(),
            repo: repo.to_string(),
            tag: tag.to_string(),
        })
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The repository name including the server component.
    pub fn full_repo(&self) -> String {
        format!("{}/{}", self.server, self.repo)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.server, self.repo, self.tag)
    }
}

impl FromStr for ImageReference {
    type Err = ParseImageRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ImageReference {
    type Error = ParseImageRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ImageReference> for String {
    fn from(value: ImageReference) -> Self {
        value.to_string()
    }
}
