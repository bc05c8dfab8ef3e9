//! End-to-end replay of snapshot history.
//!
//! Builds throwaway git repositories with a committed `events.json`, runs the
//! export and checks last-write-wins, resilience to corrupted snapshots,
//! uniqueness and replay determinism.

use std::collections::HashSet;
use std::path::Path;
use std::process::Command;

use chrono::{DateTime, Duration, FixedOffset};
use serde_json::{json, Value};
use snaplog_core::{
    merge_history, run_export, ExportConfig, MemorySnapshotLog, RunStats, SnaplogError,
};

fn run_git(repo_dir: &Path, args: &[&str]) {
    let output = Command::new("git")
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

fn commit_snapshot(repo: &Path, content: &str, message: &str) {
    std::fs::write(repo.join("events.json"), content).unwrap();
    run_git(repo, &["add", "events.json"]);
    run_git(repo, &["commit", "-m", message]);
}

fn event(id: u64, summary: &str, datetime: &str, gps: &str) -> Value {
    json!({
        "id": id,
        "datetime": datetime,
        "name": format!("Händelse {id}"),
        "summary": summary,
        "url": format!("/aktuellt/handelser/{id}"),
        "type": "Trafikolycka",
        "location": { "name": "Stockholm", "gps": gps }
    })
}

fn read_rows(path: &Path) -> Vec<Value> {
    let text = std::fs::read_to_string(path).unwrap();
    serde_json::from_str::<Value>(&text)
        .unwrap()
        .as_array()
        .unwrap()
        .clone()
}

#[test]
fn git_history_last_write_wins() {
    let repo = make_git_repo();
    let t1 = "2024-03-01 10:00:00 +01:00";
    commit_snapshot(
        repo.path(),
        &json!([event(1, "foo", t1, "59.33,18.07"), event(2, "only once", t1, "invalid")])
            .to_string(),
        "snapshot 1",
    );
    commit_snapshot(
        repo.path(),
        &json!([event(1, "bar", t1, "59.33,18.07"), event(3, "later", t1, "59.33")]).to_string(),
        "snapshot 2",
    );

    let output = repo.path().join("out.json");
    let config = ExportConfig::new(&output).with_repo(repo.path());
    let report = run_export(&config).unwrap();

    let rows = read_rows(&output);
    assert_eq!(rows.len(), 3);
    let by_id = |id: &str| rows.iter().find(|r| r["event_id"] == id).unwrap().clone();

    assert_eq!(by_id("1")["summary"], "bar");
    assert_eq!(by_id("1")["latitude"], json!(59.33));
    assert_eq!(by_id("1")["longitude"], json!(18.07));
    assert_eq!(by_id("2")["latitude"], Value::Null);
    assert_eq!(by_id("3")["longitude"], Value::Null);

    assert_eq!(report.stats.snapshots_read, 2);
    assert_eq!(report.stats.coordinate_failures, 2);
    assert_eq!(report.stats.records_written, 3);
}

#[test]
fn corrupted_commit_is_skipped() {
    let repo = make_git_repo();
    let t = "2024-03-01 10:00:00 +01:00";
    commit_snapshot(repo.path(), &json!([event(1, "a", t, "")]).to_string(), "ok");
    commit_snapshot(repo.path(), "[{\"id\": 2, \"datetime\"", "truncated");
    commit_snapshot(repo.path(), &json!([event(3, "c", t, "")]).to_string(), "ok again");

    let output = repo.path().join("out.jsonl");
    let report = run_export(&ExportConfig::new(&output).with_repo(repo.path())).unwrap();

    assert_eq!(report.stats.malformed_snapshots, 1);
    assert_eq!(report.stats.snapshots_read, 2);
    let text = std::fs::read_to_string(&output).unwrap();
    assert_eq!(text.lines().count(), 2);
}

#[test]
fn repository_without_snapshots_exports_nothing() {
    let repo = make_git_repo();
    run_git(repo.path(), &["commit", "--allow-empty", "-m", "initial"]);
    let output = repo.path().join("out.json");
    let report = run_export(&ExportConfig::new(&output).with_repo(repo.path())).unwrap();
    assert_eq!(report.stats.records_written, 0);
    assert!(read_rows(&output).is_empty());
}

#[test]
fn non_repository_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.json");
    let err = run_export(&ExportConfig::new(&output).with_repo(dir.path())).unwrap_err();
    assert!(matches!(err, SnaplogError::HistoryAccess(_)));
    assert!(!output.exists());
}

fn base() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2024-01-01T00:00:00+01:00").unwrap()
}

/// 100 rolling-window snapshots with one corrupted copy in the middle.
fn rolling_history(corrupt_at: Option<usize>) -> MemorySnapshotLog {
    let mut log = MemorySnapshotLog::new();
    for i in 0..101usize {
        let at = base() + Duration::minutes(30 * i as i64);
        if Some(i) == corrupt_at {
            log.push_bytes(format!("rev-{i}"), at, b"<html>502 Bad Gateway</html>");
            continue;
        }
        // Each snapshot covers a window of five consecutive ids.
        let entries = (i..i + 5)
            .map(|id| event(id as u64, &format!("seen in {i}"), "2024-01-01 08:00:00 +01:00", ""))
            .collect();
        log.push_entries(format!("rev-{i}"), at, entries);
    }
    log
}

#[test]
fn single_corrupted_snapshot_does_not_abort_replay() {
    let mut log = rolling_history(Some(50));
    let mut stats = RunStats::new();
    let set = merge_history(&mut log, &mut stats).unwrap();

    assert_eq!(stats.snapshots_read, 100);
    assert_eq!(stats.malformed_snapshots, 1);
    assert_eq!(stats.anomalies(), 1);
    assert_eq!(set.len(), 105);
    // id 51 is last seen in snapshot 51, one past the corrupted copy.
    assert_eq!(set.get("51").unwrap().summary, "seen in 51");
    // id 54 would have been first seen in snapshot 50 and survives anyway.
    assert_eq!(set.get("54").unwrap().summary, "seen in 54");
    // id 104 only appears in the final snapshot.
    assert_eq!(set.get("104").unwrap().summary, "seen in 100");
}

#[test]
fn identifiers_are_unique_in_output() {
    let mut log = rolling_history(None);
    let mut stats = RunStats::new();
    let set = merge_history(&mut log, &mut stats).unwrap();
    let records = set.into_records();
    let ids: HashSet<&str> = records.iter().map(|r| r.event_id.as_str()).collect();
    assert_eq!(ids.len(), records.len());
    assert_eq!(stats.records_seen, 505);
}

#[test]
fn replaying_twice_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.json");
    let second = dir.path().join("second.json");

    let range = snaplog_core::DateRange::unbounded();
    let a = snaplog_core::run_export_with(&mut rolling_history(Some(7)), None, &range, &first)
        .unwrap();
    let b = snaplog_core::run_export_with(&mut rolling_history(Some(7)), None, &range, &second)
        .unwrap();

    assert_eq!(a.digest, b.digest);
    assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
}

#[test]
fn repo_subdirectory_reads_its_own_snapshot_file() {
    let repo = make_git_repo();
    let t = "2024-03-01 10:00:00 +01:00";
    commit_snapshot(repo.path(), &json!([event(99, "root", t, "")]).to_string(), "root");
    let feed = repo.path().join("feed");
    std::fs::create_dir(&feed).unwrap();
    std::fs::write(feed.join("events.json"), json!([event(1, "feed", t, "")]).to_string())
        .unwrap();
    run_git(repo.path(), &["add", "feed/events.json"]);
    run_git(repo.path(), &["commit", "-m", "feed"]);

    let output = repo.path().join("out.json");
    let report = run_export(&ExportConfig::new(&output).with_repo(&feed)).unwrap();

    assert_eq!(report.stats.snapshots_read, 1);
    assert_eq!(report.stats.malformed_snapshots, 0);
    let rows = read_rows(&output);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["summary"], "feed");
}

const DETAIL_PAGE: &str = r#"<html><body>
<div class="event-page editorial-content">
  <h1>Trafikolycka, Stockholm</h1>
  <p class="preamble">Singelolycka på E4.</p>
  <div class="text-body editorial-html"><p>Föraren fördes till sjukhus.</p></div>
  <div class="published-container"><span>Publicerad</span><span>Polisregion Stockholm</span></div>
</div>
</body></html>"#;

#[test]
fn detail_directory_on_disk_is_joined() {
    let repo = make_git_repo();
    let t = "2024-03-01 10:00:00 +01:00";
    commit_snapshot(
        repo.path(),
        &json!([event(1, "a", t, ""), event(2, "b", t, "")]).to_string(),
        "snapshot",
    );
    let html = repo.path().join("html");
    std::fs::create_dir(&html).unwrap();
    std::fs::write(html.join("1.html"), DETAIL_PAGE).unwrap();

    let output = repo.path().join("out.json");
    let config = ExportConfig::new(&output)
        .with_repo(repo.path())
        .with_details(&html);
    let report = run_export(&config).unwrap();

    let rows = read_rows(&output);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["html_available"], true);
    assert_eq!(rows[0]["html_title"], "Trafikolycka, Stockholm");
    assert_eq!(rows[0]["html_author"], "Polisregion Stockholm");
    assert_eq!(rows[1]["html_available"], false);
    assert_eq!(rows[1]["html_title"], Value::Null);
    assert_eq!(report.stats.details_joined, 1);
    assert_eq!(report.stats.detail_misses, 1);
}
