// ABOUTME: Merge command: joins per-architecture images into manifest lists.
// ABOUTME: Includes the pull/push workaround for digest mismatches across repositories.

use crate::engine::{ContainerEngine, EngineKind};
use crate::error::{Error, Result};
use crate::output;
use crate::registry::RegistrySession;
use crate::types::{ImageReference, RegistryCredentials};
use nonempty::NonEmpty;
use std::collections::BTreeSet;

/// Create and optionally push manifest lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merge {
    tags: NonEmpty<ImageReference>,
    sources: NonEmpty<ImageReference>,
    push: bool,
    login: bool,
}

/// Failure of a single merge attempt.
#[derive(Debug)]
pub enum MergeAttemptError {
    /// Pushing a manifest list failed. Suppressed on a predicted first attempt.
    ManifestPush(Error),
    /// Any other failure.
    Other(Error),
}

impl From<MergeAttemptError> for Error {
    fn from(err: MergeAttemptError) -> Self {
        match err {
            MergeAttemptError::ManifestPush(err) | MergeAttemptError::Other(err) => err,
        }
    }
}

impl Merge {
    pub fn new(
        tags: NonEmpty<ImageReference>,
        sources: NonEmpty<ImageReference>,
        push: bool,
        login: bool,
    ) -> Self {
        Self {
            tags,
            sources,
            push,
            login,
        }
    }

    fn references(&self) -> impl Iterator<Item = &ImageReference> {
        self.tags.iter().chain(self.sources.iter())
    }

    /// Whether the first push is expected to fail with a digest mismatch.
    ///
    /// Pushing a manifest list to a repository other than the one holding the
    /// referenced images makes some engines copy those images first. The copies
    /// can get new digests, while the manifest list still records the originals,
    /// so the push references digests that do not exist.
    pub fn should_enable_workaround(&self) -> bool {
        let repos: BTreeSet<String> = self.references().map(ImageReference::full_repo).collect();
        self.push && repos.len() > 1
    }

    pub async fn run(&self, engine: &ContainerEngine) -> Result<()> {
        let server = get_server(self.references())?;
        let credentials = if self.login {
            Some(RegistryCredentials::from_env()?)
        } else {
            None
        };

        let session = RegistrySession::open(engine, &server, credentials.as_ref()).await?;
        let result = self.merge_with_workaround(engine).await;
        session.finish(result).await
    }

    async fn merge_with_workaround(&self, engine: &ContainerEngine) -> Result<()> {
        match self.merge(engine).await {
            Ok(()) => return Ok(()),
            Err(MergeAttemptError::ManifestPush(err)) if self.should_enable_workaround() => {
                tracing::info!(error = %err, "manifest push failed as predicted");
            }
            Err(err) => return Err(err.into()),
        }

        self.apply_workaround(engine).await?;
        self.merge(engine).await.map_err(Error::from)
    }

    /// Create manifest lists for every tag and push them if requested.
    pub async fn merge(&self, engine: &ContainerEngine) -> std::result::Result<(), MergeAttemptError> {
        let kind = engine.kind().await.map_err(MergeAttemptError::Other)?;

        for tag in self.tags.iter() {
            let tag = tag.to_string();

            // Removal fails when no list exists yet; any failure here is ignored.
            match engine.run(&["manifest", "rm", tag.as_str()]).await {
                Ok(_) => {}
                Err(Error::Subprocess(err)) => {
                    tracing::debug!(tag = %tag, status = err.result.status, "manifest rm failed, ignoring");
                }
                Err(err) => return Err(MergeAttemptError::Other(err)),
            }

            let mut create = vec!["manifest".to_string(), "create".to_string(), tag.clone()];
            create.extend(self.sources.iter().map(ToString::to_string));
            engine.run(&create).await.map_err(MergeAttemptError::Other)?;

            if self.push {
                let mut push = vec!["manifest".to_string(), "push".to_string(), tag.clone()];
                if kind == EngineKind::Podman {
                    push.push(format!("docker://{tag}"));
                }

                engine.run(&push).await.map_err(|err| match err {
                    Error::Subprocess(_) => MergeAttemptError::ManifestPush(err),
                    other => MergeAttemptError::Other(other),
                })?;
            }
        }

        Ok(())
    }

    /// Pull and re-push every distinct source so its digest matches what the
    /// destination repository will assign.
    async fn apply_workaround(&self, engine: &ContainerEngine) -> Result<()> {
        output::warning("Applying work-around for digest mismatch when using multiple repositories.");

        let mut seen = BTreeSet::new();
        for source in self.sources.iter().filter(|s| seen.insert(s.to_string())) {
            let source = source.to_string();
            engine.run(&["pull", source.as_str()]).await?;
            engine.run(&["push", source.as_str()]).await?;
        }

        Ok(())
    }
}

/// Return the single server shared by all references.
///
/// Fails with every distinct server, sorted, when there is more than one.
pub fn get_server<'a>(references: impl IntoIterator<Item = &'a ImageReference>) -> Result<String> {
    let servers: BTreeSet<&str> = references.into_iter().map(ImageReference::server).collect();

    let mut iter = servers.iter();
    match (iter.next(), iter.next()) {
        (Some(server), None) => Ok(server.to_string()),
        _ => Err(Error::MultipleServers {
            servers: servers.iter().map(|s| s.to_string()).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(values: &[&str]) -> NonEmpty<ImageReference> {
        let parsed: Vec<ImageReference> = values
            .iter()
            .map(|v| ImageReference::parse(v).unwrap())
            .collect();
        NonEmpty::from_vec(parsed).unwrap()
    }

    #[test]
    fn single_server_is_returned() {
        let tags = refs(&["a.com/r:t1", "a.com/other:t2"]);
        assert_eq!(get_server(tags.iter()).unwrap(), "a.com");
    }

    #[test]
    fn multiple_servers_are_listed_sorted() {
        let tags = refs(&["b.com/r:t2", "a.com/r:t1", "b.com/r:t3"]);
        let err = get_server(tags.iter()).unwrap_err();
        assert!(matches!(err, Error::MultipleServers { ref servers } if servers == &["a.com", "b.com"]));
    }

    #[test]
    fn workaround_requires_push_and_multiple_repos() {
        let tags = refs(&["a.com/final:latest"]);
        let sources = refs(&["a.com/scratch:x86_64", "a.com/scratch:aarch64"]);

        assert!(Merge::new(tags.clone(), sources.clone(), true, false).should_enable_workaround());
        assert!(!Merge::new(tags, sources, false, false).should_enable_workaround());
    }

    #[test]
    fn workaround_not_needed_for_single_repo() {
        let tags = refs(&["a.com/repo:latest"]);
        let sources = refs(&["a.com/repo:x86_64", "a.com/repo:aarch64"]);

        assert!(!Merge::new(tags.clone(), sources.clone(), true, false).should_enable_workaround());
        assert!(!Merge::new(tags, sources, false, true).should_enable_workaround());
    }
}
