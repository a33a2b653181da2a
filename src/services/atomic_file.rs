use std::path::Path;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

/// Writes through a temporary file in the target's directory and renames it
/// over `path`, so readers never observe a half-written file.
pub(crate) fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut NamedTempFile) -> Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;

    write(&mut file)?;

    file.as_file().sync_all().context("Failed to flush temporary file")?;
    file.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    Ok(())
}
