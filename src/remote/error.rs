// ABOUTME: Remote orchestration error types with SNAFU pattern.
// ABOUTME: Covers inventory parsing and payload packaging failures.

use snafu::Snafu;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RemoteError {
    #[snafu(display("unable to read inventory for host {host}: {source}"))]
    Inventory {
        host: String,
        source: serde_json::Error,
    },

    #[snafu(display("unable to add {} to the payload: {source}", path.display()))]
    Payload {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("unable to locate the program to upload: {source}"))]
    ProgramPath { source: std::io::Error },
}
