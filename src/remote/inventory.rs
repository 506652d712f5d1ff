// ABOUTME: Host variables read from an exported remote inventory.
// ABOUTME: The remote interpreter location is discovered, never assumed.

use super::error::{InventorySnafu, RemoteError};
use serde::Deserialize;
use snafu::ResultExt;

/// Inventory host name used by the remote-provisioning tool.
pub const INVENTORY_HOST: &str = "testhost";

/// Variables for the provisioned host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HostVars {
    #[serde(rename = "ansible_python_interpreter")]
    pub python_interpreter: String,
}

impl HostVars {
    /// Parse `ansible-inventory --host` JSON output.
    pub fn parse(json: &str) -> Result<Self, RemoteError> {
        serde_json::from_str(json).context(InventorySnafu {
            host: INVENTORY_HOST,
        })
    }
}
