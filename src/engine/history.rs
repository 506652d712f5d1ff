// ABOUTME: Image history parsing for Docker and Podman output formats.
// ABOUTME: Docker prints one JSON object per line; Podman prints a single JSON array.

use super::types::EngineKind;
use crate::error::{Error, Result};
use serde_json::Value;

/// One entry of an image's layer history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryLayer {
    /// Layer size in bytes.
    pub size: u64,
}

/// Parse `history --format '{{json .}}' --human=false` output.
pub fn parse_history(kind: EngineKind, stdout: &str) -> Result<Vec<HistoryLayer>> {
    let records: Vec<Value> = match kind {
        EngineKind::Docker => stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str)
            .collect::<std::result::Result<_, _>>(),
        EngineKind::Podman => serde_json::from_str(stdout),
    }
    .map_err(|e| Error::EngineOutput {
        engine: kind.to_string(),
        message: e.to_string(),
    })?;

    records
        .iter()
        .map(|record| layer_size(record).map(|size| HistoryLayer { size }))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| Error::EngineOutput {
            engine: kind.to_string(),
            message: "history entry without a layer size".to_string(),
        })
}

/// Count layers that add content to the image.
pub fn non_empty_layers(layers: &[HistoryLayer]) -> usize {
    layers.iter().filter(|layer| layer.size > 0).count()
}

fn layer_size(record: &Value) -> Option<u64> {
    match record.get("size").or_else(|| record.get("Size")) {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        None => Some(0),
        _ => None,
    }
}
