// ABOUTME: Remote instance orchestration through the ansible-test command line.
// ABOUTME: Provisions instances, exports inventory, uploads payloads and runs commands remotely.

mod error;
mod inventory;
mod payload;

pub use error::RemoteError;
pub use inventory::{HostVars, INVENTORY_HOST};
pub use payload::{
    CONFIG_NAME, CONTEXT_NAME, PROGRAM_NAME, Payload, current_program, is_native_executable,
};

use crate::engine::{CommandRunner, Invocation};
use crate::error::Result;
use std::fmt;
use std::path::Path;

/// Directory on the remote host that holds per-build workdirs.
pub const REMOTE_ROOT: &str = "/root";

/// Target CPU architecture of a remote instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Arch {
    #[value(name = "x86_64")]
    X86_64,
    #[value(name = "aarch64")]
    Aarch64,
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arch::X86_64 => f.write_str("x86_64"),
            Arch::Aarch64 => f.write_str("aarch64"),
        }
    }
}

/// A remote instance request: platform and architecture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    /// Remote platform, e.g. `rhel/9.0`.
    pub remote: String,
    pub arch: Arch,
}

impl RemoteTarget {
    pub fn new(remote: impl Into<String>, arch: Arch) -> Self {
        Self {
            remote: remote.into(),
            arch,
        }
    }

    /// The `--target-posix` value for ansible-test.
    pub fn target_posix(&self) -> String {
        format!("remote:{},arch={}", self.remote, self.arch)
    }
}

/// Remote shell access to a provisioned instance.
pub struct RemoteShell<'a> {
    runner: &'a dyn CommandRunner,
    target: &'a RemoteTarget,
}

impl<'a> RemoteShell<'a> {
    pub fn new(runner: &'a dyn CommandRunner, target: &'a RemoteTarget) -> Self {
        Self { runner, target }
    }

    /// Base `ansible-test shell` command line, with output truncation disabled.
    fn base_command(&self) -> Vec<String> {
        vec![
            "ansible-test".to_string(),
            "shell".to_string(),
            "--target-posix".to_string(),
            self.target.target_posix(),
            "--color".to_string(),
            "-v".to_string(),
            "--truncate".to_string(),
            "0".to_string(),
        ]
    }

    /// Provision (or reuse) the instance and export its inventory to `path`.
    pub async fn export_inventory(&self, path: &Path) -> Result<()> {
        let mut command = self.base_command();
        command.push("--export".to_string());
        command.push(path.display().to_string());

        self.runner.run(Invocation::new(command)).await?;
        Ok(())
    }

    /// Read the host variables from an exported inventory.
    pub async fn host_vars(&self, inventory: &Path) -> Result<HostVars> {
        let inventory = inventory.display().to_string();
        let result = self
            .runner
            .run(
                Invocation::new([
                    "ansible-inventory",
                    "-i",
                    inventory.as_str(),
                    "--host",
                    INVENTORY_HOST,
                ])
                .capture(),
            )
            .await?;

        let vars = HostVars::parse(&result.stdout)?;
        tracing::debug!(interpreter = %vars.python_interpreter, "remote host vars");
        Ok(vars)
    }

    /// Unpack a local archive into `dest` on the remote host.
    pub async fn unarchive(&self, inventory: &Path, archive: &Path, dest: &str) -> Result<()> {
        let module_args = format!("src={} dest={}", archive.display(), dest);
        let inventory = inventory.display().to_string();

        let invocation = Invocation::new([
            "ansible",
            "-m",
            "unarchive",
            "-a",
            module_args.as_str(),
            "-i",
            inventory.as_str(),
            INVENTORY_HOST,
        ])
        .env("ANSIBLE_DEVEL_WARNING", "no")
        .env("ANSIBLE_HOST_KEY_CHECKING", "no")
        .env("ANSIBLE_FORCE_COLOR", "yes")
        .capture();

        self.runner.run(invocation).await?;
        Ok(())
    }

    /// Run `command` on the instance with output streamed.
    ///
    /// Unless `keep_instance` is set the instance is terminated afterwards,
    /// whatever the outcome.
    pub async fn invoke(&self, command: &[String], keep_instance: bool) -> Result<()> {
        let mut full = self.base_command();

        if !keep_instance {
            full.push("--remote-terminate".to_string());
            full.push("always".to_string());
        }

        full.push("--raw".to_string());
        full.push("--".to_string());
        full.extend(command.iter().cloned());

        self.runner.run(Invocation::new(full)).await?;
        Ok(())
    }
}
