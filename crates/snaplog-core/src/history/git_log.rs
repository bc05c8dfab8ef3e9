use std::path::{Path, PathBuf};
use std::vec::IntoIter;

use tracing::debug;

use super::{decode_snapshot, LogEntry, Snapshot, SnapshotSource};
use crate::domain::{MalformedSnapshot, Result, SnaplogError};
use crate::git::{self, Revision};

/// Snapshot log backed by the git history of one tracked file.
///
/// Opening the log lists the revisions once; each snapshot's content is
/// fetched only when it is asked for, so at most one snapshot is in memory.
pub struct GitSnapshotLog {
    repo_dir: PathBuf,
    file: String,
    revisions: IntoIter<Revision>,
}

impl GitSnapshotLog {
    /// Open the history of `file` inside the work tree at `repo_dir`.
    pub fn open(repo_dir: impl AsRef<Path>, file: impl Into<String>) -> Result<Self> {
        let repo_dir = repo_dir.as_ref().to_path_buf();
        let file = file.into();

        if !repo_dir.is_dir() {
            return Err(SnaplogError::HistoryAccess(format!(
                "repository directory not found: {}",
                repo_dir.display()
            )));
        }
        if !git::is_git_repo(&repo_dir) {
            return Err(SnaplogError::HistoryAccess(format!(
                "not a git work tree: {}",
                repo_dir.display()
            )));
        }

        let revisions = git::list_revisions(&repo_dir, &file)?;
        debug!(file = %file, revisions = revisions.len(), "listed snapshot revisions");

        Ok(Self {
            repo_dir,
            file,
            revisions: revisions.into_iter(),
        })
    }

    pub fn file(&self) -> &str {
        &self.file
    }
}

impl SnapshotSource for GitSnapshotLog {
    fn next_snapshot(&mut self) -> Result<Option<LogEntry>> {
        let Some(revision) = self.revisions.next() else {
            return Ok(None);
        };

        debug!(revision = revision.short(), at = %revision.committed_at, "reading snapshot");
        let bytes = match git::show_file_at(&self.repo_dir, &revision.sha, &self.file) {
            Ok(bytes) => bytes,
            Err(reason) => {
                return Ok(Some(LogEntry::Malformed(MalformedSnapshot {
                    revision: revision.sha,
                    reason,
                })))
            }
        };

        let entry = match decode_snapshot(&revision.sha, &bytes) {
            Ok(entries) => LogEntry::Snapshot(Snapshot {
                revision: revision.sha,
                captured_at: revision.committed_at,
                entries,
            }),
            Err(malformed) => LogEntry::Malformed(malformed),
        };
        Ok(Some(entry))
    }

    fn remaining_hint(&self) -> Option<usize> {
        Some(self.revisions.len())
    }
}
