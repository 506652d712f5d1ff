// ABOUTME: Container engine installers for freshly provisioned remote hosts.
// ABOUTME: An ordered list of predicate/installer pairs; the first usable one wins.

use crate::engine::{CommandRunner, Invocation, find_program};
use crate::error::Result;
use std::ffi::OsStr;

/// Installs a container engine with the host's package manager.
#[derive(Debug, Clone, Copy)]
pub struct Bootstrapper {
    pub name: &'static str,
    usable: fn(&OsStr) -> bool,
    install: fn() -> Invocation,
}

impl Bootstrapper {
    /// Whether this bootstrapper applies to a host with the given search path.
    pub fn usable(&self, search_path: &OsStr) -> bool {
        (self.usable)(search_path)
    }

    /// The install command.
    pub fn invocation(&self) -> Invocation {
        (self.install)()
    }

    pub async fn run(&self, runner: &dyn CommandRunner) -> Result<()> {
        tracing::info!(bootstrapper = self.name, "installing container engine");
        runner.run(self.invocation()).await?;
        Ok(())
    }
}

/// Bootstrappers in priority order.
pub static BOOTSTRAPPERS: [Bootstrapper; 2] = [
    Bootstrapper {
        name: "dnf",
        usable: |path| find_program("dnf", path).is_some(),
        install: || Invocation::new(["dnf", "install", "-y", "podman"]),
    },
    Bootstrapper {
        name: "apt",
        usable: |path| find_program("apt-get", path).is_some(),
        install: || {
            Invocation::new([
                "apt-get",
                "install",
                "docker.io",
                "-y",
                "--no-install-recommends",
            ])
            .env("DEBIAN_FRONTEND", "noninteractive")
        },
    },
];

/// Select the first usable bootstrapper, if any.
pub fn select(search_path: &OsStr) -> Option<&'static Bootstrapper> {
    BOOTSTRAPPERS.iter().find(|b| b.usable(search_path))
}
