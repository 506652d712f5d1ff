// ABOUTME: Payload archive shipped to the remote host.
// ABOUTME: Packs the program, its serialized build config and the build context under one workdir.

use super::error::{PayloadSnafu, ProgramPathSnafu, RemoteError};
use flate2::Compression;
use flate2::write::GzEncoder;
use snafu::ResultExt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Name of the program inside the remote workdir.
pub const PROGRAM_NAME: &str = "containmint";
/// Name of the serialized build config inside the remote workdir.
pub const CONFIG_NAME: &str = "config.json";
/// Name of the build context directory inside the remote workdir.
pub const CONTEXT_NAME: &str = "context";

const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// Local inputs for one payload archive.
#[derive(Debug, Clone)]
pub struct Payload<'a> {
    pub workdir_name: &'a str,
    pub program: &'a Path,
    pub config: &'a Path,
    pub context: &'a Path,
}

impl Payload<'_> {
    /// Write the payload as a gzip-compressed tar archive to `archive`.
    ///
    /// Layout:
    /// - `<workdir>/containmint`
    /// - `<workdir>/config.json`
    /// - `<workdir>/context/...`
    pub fn write(&self, archive: &Path) -> Result<(), RemoteError> {
        let file = File::create(archive).context(PayloadSnafu { path: archive })?;
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));

        let root = Path::new(self.workdir_name);

        builder
            .append_path_with_name(self.program, root.join(PROGRAM_NAME))
            .context(PayloadSnafu { path: self.program })?;
        builder
            .append_path_with_name(self.config, root.join(CONFIG_NAME))
            .context(PayloadSnafu { path: self.config })?;

        // Links in the context are shipped as links, dangling ones included.
        builder.follow_symlinks(false);
        builder
            .append_dir_all(root.join(CONTEXT_NAME), self.context)
            .context(PayloadSnafu { path: self.context })?;

        let encoder = builder
            .into_inner()
            .context(PayloadSnafu { path: archive })?;
        encoder.finish().context(PayloadSnafu { path: archive })?;

        tracing::debug!(archive = %archive.display(), workdir = self.workdir_name, "payload written");
        Ok(())
    }
}

/// The running executable, used as the default program to ship.
pub fn current_program() -> Result<PathBuf, RemoteError> {
    std::env::current_exe().context(ProgramPathSnafu)
}

/// Whether `program` is a native executable rather than an interpreted script.
pub fn is_native_executable(program: &Path) -> Result<bool, RemoteError> {
    let mut magic = [0u8; 4];
    let mut file = File::open(program).context(ProgramPathSnafu)?;
    match file.read_exact(&mut magic) {
        Ok(()) => Ok(magic == ELF_MAGIC),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e).context(ProgramPathSnafu),
    }
}
