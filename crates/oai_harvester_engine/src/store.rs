use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use engine_logging::{engine_debug, engine_info};

use crate::filename::{page_filename, parse_page_filename};
use crate::persist::{AtomicFileWriter, StoreError};

/// The most recent session found in the store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LastSession {
    /// Highest session number present, 0 when the store is empty.
    pub session_number: u32,
    /// The lowest-numbered page of that session.
    pub first_page: Option<PathBuf>,
}

/// Durable storage for raw page payloads, keyed by (session, page).
pub trait PageStore: Send + Sync {
    fn locate_last_session(&self) -> Result<LastSession, StoreError>;

    /// Deletes every page of a session and returns the deleted paths.
    fn clear_session(&self, session_number: u32) -> Result<Vec<PathBuf>, StoreError>;

    /// Writes the raw payload of the page at 0-based `page_index`; the
    /// filename carries the 1-based page number.
    fn write_page(
        &self,
        session_number: u32,
        page_index: u32,
        padding: usize,
        content: &[u8],
    ) -> Result<PathBuf, StoreError>;

    /// Opens the first page of a session for streaming.
    fn read_first_page(
        &self,
        session_number: u32,
        padding: usize,
    ) -> Result<(PathBuf, Box<dyn BufRead + Send>), StoreError>;
}

/// Page files on the local filesystem, named `{base_path}{session}_{page}`.
#[derive(Debug, Clone)]
pub struct FsPageStore {
    dir: PathBuf,
    prefix: String,
}

impl FsPageStore {
    /// `base_path` is a directory plus filename prefix, e.g. `arXiv_oai/reclist`.
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        let base_path = base_path.as_ref();
        let prefix = base_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = match base_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self { dir, prefix }
    }

    /// All `(session, page, path)` entries in the store.
    fn pages(&self) -> Result<Vec<(u32, u32, PathBuf)>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut pages = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some((session, page)) = parse_page_filename(&self.prefix, name) {
                pages.push((session, page, entry.path()));
            }
        }
        pages.sort();
        Ok(pages)
    }

    fn first_page_of(&self, session_number: u32) -> Result<Option<PathBuf>, StoreError> {
        Ok(self
            .pages()?
            .into_iter()
            .find(|(session, _, _)| *session == session_number)
            .map(|(_, _, path)| path))
    }
}

impl PageStore for FsPageStore {
    fn locate_last_session(&self) -> Result<LastSession, StoreError> {
        let pages = self.pages()?;
        let Some(session_number) = pages.iter().map(|(session, _, _)| *session).max() else {
            return Ok(LastSession::default());
        };
        let first_page = pages
            .into_iter()
            .find(|(session, _, _)| *session == session_number)
            .map(|(_, _, path)| path);
        engine_debug!(
            "Last session in {:?} is {} (first page {:?})",
            self.dir,
            session_number,
            first_page
        );
        Ok(LastSession {
            session_number,
            first_page,
        })
    }

    fn clear_session(&self, session_number: u32) -> Result<Vec<PathBuf>, StoreError> {
        let mut deleted = Vec::new();
        for (session, _, path) in self.pages()? {
            if session == session_number {
                fs::remove_file(&path)?;
                deleted.push(path);
            }
        }
        engine_info!(
            "Cleared {} page file(s) of session {}",
            deleted.len(),
            session_number
        );
        Ok(deleted)
    }

    fn write_page(
        &self,
        session_number: u32,
        page_index: u32,
        padding: usize,
        content: &[u8],
    ) -> Result<PathBuf, StoreError> {
        let filename = page_filename(&self.prefix, session_number, page_index + 1, padding);
        AtomicFileWriter::new(self.dir.clone()).write_new(&filename, content)
    }

    fn read_first_page(
        &self,
        session_number: u32,
        padding: usize,
    ) -> Result<(PathBuf, Box<dyn BufRead + Send>), StoreError> {
        let expected = self
            .dir
            .join(page_filename(&self.prefix, session_number, 1, padding));
        // Sessions written with a different padding are still found by scanning.
        let path = if expected.is_file() {
            expected
        } else {
            self.first_page_of(session_number)?
                .ok_or(StoreError::MissingPage { session_number })?
        };
        let file = File::open(&path)?;
        Ok((path, Box::new(BufReader::new(file))))
    }
}
