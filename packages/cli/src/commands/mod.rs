pub mod run;
pub mod transform;
pub mod watch;

pub use run::{run, RunArgs};
pub use transform::{transform, TransformArgs};
pub use watch::{watch, WatchArgs};

use anyhow::{Context, Result};
use std::path::Path;

/// Read a source unit, naming the file on failure
pub(crate) fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}
