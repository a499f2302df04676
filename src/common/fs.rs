use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::{Error, Result};

/// Create the directory if it doesn't exist; error if a non-directory exists there.
pub(crate) fn ensure_dir_exists(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            return Err(Error::io(path, io::Error::other("path exists but is not a directory")));
        }
    } else {
        fs::create_dir_all(path).map_err(|e| Error::io(path, e))?;
    }
    Ok(())
}

/// Write `bytes` to `target` via a temp file in the same directory and an atomic rename.
/// On failure the temp file is removed and any existing `target` is left untouched.
pub(crate) fn write_atomic(target: &Path, bytes: &[u8]) -> Result<()> {
    let dir = target.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;

    tmp.write_all(bytes).map_err(|e| Error::io(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| Error::io(tmp.path(), e))?;
    tmp.persist(target).map_err(|e| Error::io(target, e.error))?;

    // best-effort fsync of the directory entry
    let _ = File::open(dir).and_then(|f| f.sync_all());
    Ok(())
}

/// Read a file, mapping "does not exist" to `None`.
pub(crate) fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(path, e)),
    }
}
