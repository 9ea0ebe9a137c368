//! JSON manifest of the embedded resources.

use crate::render::Rendered;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// One manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub stored_size: u64,
    pub compression: String,
}

impl ManifestEntry {
    pub fn new(rendered: &Rendered, path: &Path) -> Self {
        Self {
            name: rendered.name.clone(),
            path: path.display().to_string(),
            size: rendered.size,
            stored_size: rendered.stored_size,
            compression: rendered.transform.name().to_string(),
        }
    }
}

/// Write `entries` as a pretty-printed JSON array.
pub fn write_manifest<W: Write>(
    out: &mut W,
    entries: &[ManifestEntry],
) -> Result<(), Box<dyn std::error::Error>> {
    serde_json::to_writer_pretty(&mut *out, entries)?;
    out.write_all(b"\n")?;
    Ok(())
}
