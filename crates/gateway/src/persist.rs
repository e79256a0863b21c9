//! Write-temp-then-rename helper shared by every file-backed store so a
//! crash mid-write never truncates `rules.json` or `config.json`.

use scenariod_domain::{Error, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| Error::PersistenceFailure(format!("creating temp file: {e}")))?;
    tmp.write_all(json.as_bytes())
        .map_err(|e| Error::PersistenceFailure(format!("writing temp file: {e}")))?;
    tmp.flush()
        .map_err(|e| Error::PersistenceFailure(format!("flushing temp file: {e}")))?;
    tmp.persist(path)
        .map_err(|e| Error::PersistenceFailure(format!("renaming temp file into place: {e}")))?;
    Ok(())
}
