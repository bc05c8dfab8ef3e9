use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::domain::{Result, SnaplogError};

/// Key-addressed store of detail documents.
///
/// Lookups are by identifier; the enricher never scans the store.
pub trait DetailArchive: Send + Sync {
    /// Load the document for `event_id`, or `None` when the archive has no entry.
    fn load(&self, event_id: &str) -> io::Result<Option<String>>;
}

/// Directory of `<event_id>.html` files.
#[derive(Debug, Clone)]
pub struct FsDetailArchive {
    root: PathBuf,
}

impl FsDetailArchive {
    /// Open the archive at `root`. The directory must exist.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(SnaplogError::DetailArchiveMissing(root));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document for `event_id`, if the identifier is a plain token.
    pub fn document_path(&self, event_id: &str) -> Option<PathBuf> {
        let plain = !event_id.is_empty()
            && event_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        plain.then(|| self.root.join(format!("{event_id}.html")))
    }
}

impl DetailArchive for FsDetailArchive {
    fn load(&self, event_id: &str) -> io::Result<Option<String>> {
        let Some(path) = self.document_path(event_id) else {
            return Ok(None);
        };
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// In-memory archive backed by a `HashMap<event_id, document>`.
#[derive(Debug, Default, Clone)]
pub struct MemoryDetailArchive {
    documents: HashMap<String, String>,
}

impl MemoryDetailArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, event_id: impl Into<String>, document: impl Into<String>) {
        self.documents.insert(event_id.into(), document.into());
    }
}

impl DetailArchive for MemoryDetailArchive {
    fn load(&self, event_id: &str) -> io::Result<Option<String>> {
        Ok(self.documents.get(event_id).cloned())
    }
}
