// ABOUTME: Build command: runs a native build on a remote instance.
// ABOUTME: Packages program, config and context, uploads them and dispatches remotely.

use super::Host;
use super::execute::{BuildOptions, Execute};
use crate::error::Result;
use crate::remote::{
    CONTEXT_NAME, Payload, PROGRAM_NAME, REMOTE_ROOT, RemoteShell, RemoteTarget,
    is_native_executable,
};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Build and push an image using a remote instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Build {
    options: BuildOptions,
    target: RemoteTarget,
    keep_instance: bool,
    program: PathBuf,
}

impl Build {
    /// `program` is the containmint executable shipped to the remote host; it
    /// must run on the target architecture.
    pub fn new(
        options: BuildOptions,
        target: RemoteTarget,
        keep_instance: bool,
        program: impl Into<PathBuf>,
    ) -> Self {
        Self {
            options,
            target,
            keep_instance,
            program: program.into(),
        }
    }

    pub async fn run(&self, host: &Host) -> Result<()> {
        let workdir_name = workdir_name();
        let remote_workdir = format!("{REMOTE_ROOT}/{workdir_name}");
        let remote_program = format!("{remote_workdir}/{PROGRAM_NAME}");

        let execute = Execute::resolve(
            BuildOptions {
                context: PathBuf::from(format!("{remote_workdir}/{CONTEXT_NAME}")),
                ..self.options.clone()
            },
            None,
        )?;

        let shell = RemoteShell::new(host.runner(), &self.target);

        let inventory = tempfile::Builder::new()
            .prefix("remote-")
            .suffix(".inventory")
            .tempfile()?;

        shell.export_inventory(inventory.path()).await?;
        let host_vars = shell.host_vars(inventory.path()).await?;

        self.upload_payload(&shell, &workdir_name, inventory.path(), &execute)
            .await?;

        let mut command = Vec::new();
        if !is_native_executable(&self.program)? {
            command.push(host_vars.python_interpreter);
        }
        command.push(remote_program);
        command.push("dispatch".to_string());

        shell.invoke(&command, self.keep_instance).await
    }

    /// Generate the payload and unpack it on the remote host.
    ///
    /// The payload holds this program, the build configuration and the build context.
    async fn upload_payload(
        &self,
        shell: &RemoteShell<'_>,
        workdir_name: &str,
        inventory: &Path,
        execute: &Execute,
    ) -> Result<()> {
        let config = scoped_file("config-", ".json")?;
        execute.serialize(config.path())?;

        let archive = scoped_file("content-", ".tgz")?;
        Payload {
            workdir_name,
            program: &self.program,
            config: config.path(),
            context: &self.options.context,
        }
        .write(archive.path())?;

        shell.unarchive(inventory, archive.path(), REMOTE_ROOT).await
    }
}

/// A collision-resistant name for a remote workdir.
fn workdir_name() -> String {
    format!("workdir-{}", hex::encode(rand::random::<[u8; 4]>()))
}

/// A temporary file removed when dropped, on every exit path.
fn scoped_file(prefix: &str, suffix: &str) -> Result<NamedTempFile> {
    Ok(tempfile::Builder::new()
        .prefix(prefix)
        .suffix(suffix)
        .tempfile()?)
}
