//! Git plumbing for reading a tracked file's history.
//!
//! All access goes through the `git` binary; the repository is only read.

use std::path::Path;
use std::process::Command;

use chrono::{DateTime, FixedOffset};

use crate::domain::error::{Result, SnaplogError};

/// One commit that touched the tracked file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub sha: String,
    pub committed_at: DateTime<FixedOffset>,
}

impl Revision {
    pub fn short(&self) -> &str {
        &self.sha[..8.min(self.sha.len())]
    }
}

/// Check whether a directory is inside a git work tree.
pub fn is_git_repo(dir: &Path) -> bool {
    Command::new("git")
        .args(["rev-parse", "--is-inside-work-tree"])
        .current_dir(dir)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// List every commit that modified `file`, oldest first.
///
/// Runs `git log --format=%H|%aI --reverse -- <file>`. Fails with
/// [`SnaplogError::HistoryAccess`] when git cannot be run or the log cannot be
/// read.
pub fn list_revisions(repo_dir: &Path, file: &str) -> Result<Vec<Revision>> {
    let output = Command::new("git")
        .args(["log", "--format=%H|%aI", "--reverse", "--", file])
        .current_dir(repo_dir)
        .output()
        .map_err(|e| SnaplogError::HistoryAccess(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SnaplogError::HistoryAccess(format!(
            "git log failed: {}",
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_log_line)
        .collect()
}

fn parse_log_line(line: &str) -> Result<Revision> {
    let (sha, date) = line.split_once('|').ok_or_else(|| {
        SnaplogError::HistoryAccess(format!("unexpected git log line: {line:?}"))
    })?;
    let committed_at = DateTime::parse_from_rfc3339(date.trim()).map_err(|e| {
        SnaplogError::HistoryAccess(format!("bad commit date {date:?} for {sha}: {e}"))
    })?;
    Ok(Revision {
        sha: sha.trim().to_string(),
        committed_at,
    })
}

/// Read `file` as it existed at `sha`.
///
/// `file` is taken relative to `repo_dir`, the same way `git log -- <file>`
/// resolves it, so `repo_dir` may be a subdirectory of the work tree.
///
/// Errors are returned as plain strings: a single unreadable revision is a
/// per-snapshot problem, not a history access failure.
pub fn show_file_at(
    repo_dir: &Path,
    sha: &str,
    file: &str,
) -> std::result::Result<Vec<u8>, String> {
    let output = Command::new("git")
        .arg("show")
        .arg(format!("{sha}:./{file}"))
        .current_dir(repo_dir)
        .output()
        .map_err(|e| format!("failed to run git: {e}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("git show failed: {}", stderr.trim()));
    }

    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::process::Command as StdCommand;

    fn run_git(repo_dir: &Path, args: &[&str]) {
        let output = StdCommand::new("git")
            .args(args)
            .current_dir(repo_dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    fn make_git_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        run_git(dir.path(), &["init"]);
        run_git(dir.path(), &["config", "user.name", "test-user"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        dir
    }

    fn commit_file(repo: &Path, name: &str, content: &str, message: &str) {
        std::fs::write(repo.join(name), content).unwrap();
        run_git(repo, &["add", name]);
        run_git(repo, &["commit", "-m", message]);
    }

    #[test]
    fn list_revisions_is_oldest_first() {
        let repo = make_git_repo();
        commit_file(repo.path(), "events.json", "[1]", "first");
        commit_file(repo.path(), "other.txt", "x", "unrelated");
        commit_file(repo.path(), "events.json", "[2]", "second");

        let revisions = list_revisions(repo.path(), "events.json").unwrap();
        assert_eq!(revisions.len(), 2);
        assert!(revisions.iter().all(|r| r.sha.len() == 40));

        let first = show_file_at(repo.path(), &revisions[0].sha, "events.json").unwrap();
        let second = show_file_at(repo.path(), &revisions[1].sha, "events.json").unwrap();
        assert_eq!(first, b"[1]");
        assert_eq!(second, b"[2]");
    }

    #[test]
    fn subdirectory_paths_resolve_like_git_log() {
        let repo = make_git_repo();
        std::fs::create_dir(repo.path().join("feed")).unwrap();
        commit_file(repo.path(), "events.json", "[\"root\"]", "root copy");
        commit_file(repo.path(), "feed/events.json", "[\"feed\"]", "feed copy");

        let feed = repo.path().join("feed");
        let revisions = list_revisions(&feed, "events.json").unwrap();
        assert_eq!(revisions.len(), 1);

        let content = show_file_at(&feed, &revisions[0].sha, "events.json").unwrap();
        assert_eq!(content, b"[\"feed\"]");
    }

    #[test]
    fn list_revisions_fails_outside_repo() {
        let dir = tempfile::tempdir().unwrap();
        let result = list_revisions(dir.path(), "events.json");
        assert!(matches!(result, Err(SnaplogError::HistoryAccess(_))));
    }

    #[test]
    fn show_file_at_reports_missing_path() {
        let repo = make_git_repo();
        commit_file(repo.path(), "events.json", "[]", "first");
        let revisions = list_revisions(repo.path(), "events.json").unwrap();
        let err = show_file_at(repo.path(), &revisions[0].sha, "missing.json").unwrap_err();
        assert!(err.contains("git show failed"));
    }

    #[test]
    fn parse_log_line_reads_offset_dates() {
        let rev = parse_log_line("0123456789abcdef|2025-11-13T20:14:24+01:00").unwrap();
        assert_eq!(rev.short(), "01234567");
        assert_eq!(rev.committed_at.offset().local_minus_utc(), 3600);
    }

    #[test]
    fn is_git_repo_distinguishes_directories() {
        let repo = make_git_repo();
        assert!(is_git_repo(repo.path()));
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_git_repo(dir.path()));
    }
}
