// ABOUTME: Execute command: a local build and optional push.
// ABOUTME: Serializable so the build instructions can be shipped to a remote host.

use crate::engine::{ContainerEngine, EngineKind, non_empty_layers};
use crate::error::{Error, Result};
use crate::output;
use crate::registry::RegistrySession;
use crate::types::{BuildContext, ImageReference, RegistryCredentials};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Layer squashing mode requested for a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SquashMode {
    /// Squash only the layers added by this build.
    New,
    /// Squash everything, base image included, into one layer.
    All,
}

impl SquashMode {
    fn podman_flag(&self) -> &'static str {
        match self {
            SquashMode::New => "--squash",
            SquashMode::All => "--squash-all",
        }
    }
}

impl fmt::Display for SquashMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SquashMode::New => f.write_str("new"),
            SquashMode::All => f.write_str("all"),
        }
    }
}

/// Parameters shared by `build` and `execute`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    pub context: PathBuf,
    pub tag: ImageReference,
    pub push: bool,
    pub login: bool,
    #[serde(default)]
    pub squash: Option<SquashMode>,
}

/// On-disk form of an [`Execute`] command.
#[derive(Serialize, Deserialize)]
struct ExecuteRecord {
    #[serde(flatten)]
    options: BuildOptions,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// A local build, with credentials resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execute {
    options: BuildOptions,
    credentials: Option<RegistryCredentials>,
}

impl Execute {
    /// Produce a fully populated command from validated options.
    ///
    /// When `login` is requested and no credentials were given, they are read
    /// from the environment here, before anything runs.
    pub fn resolve(options: BuildOptions, credentials: Option<RegistryCredentials>) -> Result<Self> {
        let credentials = match credentials {
            Some(credentials) => Some(credentials),
            None if options.login => Some(RegistryCredentials::from_env()?),
            None => None,
        };

        Ok(Self {
            options,
            credentials,
        })
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn credentials(&self) -> Option<&RegistryCredentials> {
        self.credentials.as_ref()
    }

    /// Write this command as JSON to `path`.
    pub fn serialize(&self, path: &Path) -> Result<()> {
        let record = ExecuteRecord {
            options: self.options.clone(),
            username: self
                .credentials
                .as_ref()
                .map(|c| c.username().to_string())
                .unwrap_or_default(),
            password: self
                .credentials
                .as_ref()
                .map(|c| c.password().to_string())
                .unwrap_or_default(),
        };

        let json = serde_json::to_string(&record)
            .map_err(|e| Error::Configuration(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read a command previously written by [`Execute::serialize`].
    pub fn deserialize(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::Configuration(format!("{}: {e}", path.display())))?;
        let record: ExecuteRecord =
            serde_json::from_str(&json).map_err(|e| Error::Configuration(e.to_string()))?;

        let credentials = (!record.username.is_empty() && !record.password.is_empty())
            .then(|| RegistryCredentials::new(record.username, record.password));

        Self::resolve(record.options, credentials)
    }

    pub async fn run(&self, engine: &ContainerEngine) -> Result<()> {
        let context = BuildContext::locate(&self.options.context)
            .map_err(|e| Error::Configuration(e.to_string()))?;

        let kind = engine.kind().await?;
        let args = self.build_args(kind, &context)?;

        let credentials = self.credentials.as_ref().filter(|_| self.options.login);
        let session = RegistrySession::open(engine, self.options.tag.server(), credentials).await?;
        let result = self.build_and_push(engine, &args).await;
        session.finish(result).await?;

        if let Some(mode) = self.options.squash {
            // Informational only; the image is already built and pushed.
            match engine.history(&self.options.tag).await {
                Ok(layers) => output::subsection(&format!(
                    "Image {} has {} non-empty layer(s) after squash mode {mode}",
                    self.options.tag,
                    non_empty_layers(&layers)
                )),
                Err(err) => {
                    tracing::warn!(image = %self.options.tag, error = %err, "unable to read image history");
                }
            }
        }

        Ok(())
    }

    fn build_args(&self, kind: EngineKind, context: &BuildContext) -> Result<Vec<String>> {
        let mut args = vec![
            "build".to_string(),
            "--tag".to_string(),
            self.options.tag.to_string(),
            "--file".to_string(),
            context.container_file().display().to_string(),
            context.dir().display().to_string(),
            "--no-cache".to_string(),
        ];

        match kind {
            EngineKind::Podman => {
                args.push("--format".to_string());
                args.push("docker".to_string());

                if let Some(mode) = self.options.squash {
                    args.push(mode.podman_flag().to_string());
                }
            }
            EngineKind::Docker => {
                if let Some(mode) = self.options.squash {
                    return Err(Error::SquashUnsupported {
                        mode: mode.to_string(),
                        engine: kind.to_string(),
                    });
                }
            }
        }

        Ok(args)
    }

    async fn build_and_push(&self, engine: &ContainerEngine, args: &[String]) -> Result<()> {
        engine.run(args).await?;

        if self.options.push {
            let tag = self.options.tag.to_string();
            engine.run(&["push", tag.as_str()]).await?;
        }

        Ok(())
    }
}
