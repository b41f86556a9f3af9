//! Output directory handling: atomic document writes.

use std::path::{Path, PathBuf};

use harmonizer_shared::{HarmonizerError, Result};
use tracing::debug;

/// Create the output directory (and parents) if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| HarmonizerError::io(dir, e))
}

/// Write `content` to `target` atomically: write a hidden temp file in the
/// same directory, then rename it over the target.
pub fn write_atomic(target: &Path, content: &str) -> Result<()> {
    let temp = temp_path(target);

    std::fs::write(&temp, content).map_err(|e| HarmonizerError::io(&temp, e))?;

    if let Err(e) = std::fs::rename(&temp, target) {
        let _ = std::fs::remove_file(&temp);
        return Err(HarmonizerError::io(target, e));
    }

    debug!(path = %target.display(), size = content.len(), "wrote document");
    Ok(())
}

fn temp_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.tmp"))
}
