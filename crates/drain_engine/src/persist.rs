use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::WriteOutcome;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Create `dir` when it is missing and check that files can be created in it.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    let unusable =
        |reason: String| PersistError::OutputDir(format!("{}: {reason}", dir.display()));
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(unusable("not a directory".to_string())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|e| unusable(e.to_string()))?;
        }
        Err(err) => return Err(unusable(err.to_string())),
    }
    new_temp_file(dir).map_err(|e| unusable(e.to_string()))?;
    Ok(())
}

/// Writes `{dir}/{filename}` through a temp file in the same directory, then
/// renames it over the target. Readers never observe a partial file.
///
/// A replaced file keeps its permissions; a new file gets the mode a plain
/// create would give it.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        let target = self.dir.join(filename);
        let existing = fs::metadata(&target)
            .ok()
            .filter(|meta| meta.is_file())
            .map(|meta| meta.permissions());

        let mut tmp = new_temp_file(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        if let Some(permissions) = existing {
            tmp.as_file().set_permissions(permissions)?;
        }
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

/// Temp files default to 0600; ask for 0666 so the umask decides, as with `File::create`.
#[cfg(unix)]
fn new_temp_file(dir: &Path) -> io::Result<NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;

    tempfile::Builder::new()
        .permissions(fs::Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn new_temp_file(dir: &Path) -> io::Result<NamedTempFile> {
    NamedTempFile::new_in(dir)
}

/// Write `content` to `{dir}/{slug}.md` unless a regular file is already
/// there and `overwrite` is false.
pub fn write_document(
    dir: &Path,
    slug: &str,
    content: &str,
    overwrite: bool,
) -> Result<WriteOutcome, PersistError> {
    let filename = format!("{slug}.md");
    let target = dir.join(&filename);
    if !overwrite && target.is_file() {
        return Ok(WriteOutcome::Skipped(target));
    }
    let path = AtomicFileWriter::new(dir.to_path_buf()).write(&filename, content)?;
    Ok(WriteOutcome::Written(path))
}
