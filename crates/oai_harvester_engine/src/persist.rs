use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("page file already exists: {0:?}")]
    PageExists(PathBuf),
    #[error("no page file for session {session_number}")]
    MissingPage { session_number: u32 },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), StoreError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| StoreError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(StoreError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| StoreError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Writes `{dir}/{filename}` through a synced temp file and a no-clobber
/// rename, so a page is either complete on disk or absent.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write_new(&self, filename: &str, content: &[u8]) -> Result<PathBuf, StoreError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        if target.exists() {
            return Err(StoreError::PageExists(target));
        }
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        tmp.persist_noclobber(&target).map_err(|e| {
            if e.error.kind() == io::ErrorKind::AlreadyExists {
                StoreError::PageExists(target.clone())
            } else {
                StoreError::Io(e.error)
            }
        })?;
        Ok(target)
    }
}
