//! Best-effort discovery of the AALM result table.
//!
//! AALM writes `<exe_dir>/<run>/Out_<run>.csv`. The run name it uses is
//! normally the one we put into the input file, but the executable may
//! rename the run, and older builds have been seen writing elsewhere, so the
//! lookup falls back in order:
//!
//! 1. the expected path for the synthesized run name,
//! 2. the expected path for the run name the executable printed,
//! 3. the most recently modified `*/Out_*.csv` under the executable directory.
//!
//! The directory scan has no correctness guarantee when several runs share
//! the executable directory; prefer unique run names in that setting.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::summary::parse_reported_run_name;

/// Which lookup found the result table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LocateStrategy {
    Expected,
    ReportedRunName,
    DirectoryScan,
}

impl fmt::Display for LocateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LocateStrategy::Expected => "expected",
            LocateStrategy::ReportedRunName => "reported_run_name",
            LocateStrategy::DirectoryScan => "directory_scan",
        };
        f.write_str(s)
    }
}

/// A result table on disk and how it was found.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocatedResult {
    pub path: PathBuf,
    pub strategy: LocateStrategy,
}

/// `<exe_dir>/<run>/Out_<run>.csv`
pub fn expected_result_path(exe_dir: &Path, run_name: &str) -> PathBuf {
    exe_dir.join(run_name).join(format!("Out_{run_name}.csv"))
}

fn is_result_file(path: &Path) -> bool {
    path.is_file()
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("Out_") && n.ends_with(".csv"))
}

/// Newest `Out_*.csv` one level below `exe_dir`. Unreadable entries are skipped.
pub fn scan_for_results(exe_dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(exe_dir).ok()?;

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for subdir in entries.filter_map(|e| e.ok()).map(|e| e.path()).filter(|p| p.is_dir()) {
        let Ok(files) = std::fs::read_dir(&subdir) else {
            continue;
        };
        for path in files.filter_map(|e| e.ok()).map(|e| e.path()) {
            if !is_result_file(&path) {
                continue;
            }
            let modified = std::fs::metadata(&path)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            if newest.as_ref().map_or(true, |(t, _)| modified > *t) {
                newest = Some((modified, path));
            }
        }
    }

    newest.map(|(_, path)| path)
}

/// Find the result table for `run_name`, falling back as described in the
/// module docs. `stdout` is the executable's console output.
pub fn locate_results(exe_dir: &Path, run_name: &str, stdout: &str) -> Option<LocatedResult> {
    let expected = expected_result_path(exe_dir, run_name);
    if expected.is_file() {
        return Some(LocatedResult {
            path: expected,
            strategy: LocateStrategy::Expected,
        });
    }
    debug!(path = %expected.display(), "expected result file absent");

    if let Some(reported) = parse_reported_run_name(stdout) {
        let path = expected_result_path(exe_dir, &reported);
        if path.is_file() {
            return Some(LocatedResult {
                path,
                strategy: LocateStrategy::ReportedRunName,
            });
        }
        debug!(reported = %reported, "no result file for reported run name");
    }

    scan_for_results(exe_dir).map(|path| LocatedResult {
        path,
        strategy: LocateStrategy::DirectoryScan,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::Duration;

    fn write_result(exe_dir: &Path, run: &str) -> PathBuf {
        let path = expected_result_path(exe_dir, run);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "Days,Cblood\n0,0.0\n").unwrap();
        path
    }

    fn set_mtime(path: &Path, secs_after_epoch: u64) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs_after_epoch))
            .unwrap();
    }

    #[test]
    fn test_expected_path_layout() {
        assert_eq!(
            expected_result_path(Path::new("/aalm"), "WebSim"),
            PathBuf::from("/aalm/WebSim/Out_WebSim.csv")
        );
    }

    #[test]
    fn test_expected_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_result(dir.path(), "WebSim");
        write_result(dir.path(), "Renamed");

        let found = locate_results(dir.path(), "WebSim", "Run name = Renamed").unwrap();
        assert_eq!(found.path, path);
        assert_eq!(found.strategy, LocateStrategy::Expected);
    }

    #[test]
    fn test_reported_run_name_checked_before_scan() {
        let dir = tempfile::tempdir().unwrap();
        let reported = write_result(dir.path(), "Renamed");
        let newer = write_result(dir.path(), "Newer");
        set_mtime(&reported, 1_000);
        set_mtime(&newer, 2_000);

        let found = locate_results(dir.path(), "WebSim", "Run name = Renamed\n").unwrap();
        assert_eq!(found.path, reported);
        assert_eq!(found.strategy, LocateStrategy::ReportedRunName);
    }

    #[test]
    fn test_scan_picks_most_recent() {
        let dir = tempfile::tempdir().unwrap();
        let old = write_result(dir.path(), "Old");
        let new = write_result(dir.path(), "New");
        set_mtime(&old, 1_000);
        set_mtime(&new, 5_000);

        let found = locate_results(dir.path(), "WebSim", "Run name = Ghost").unwrap();
        assert_eq!(found.path, new);
        assert_eq!(found.strategy, LocateStrategy::DirectoryScan);
    }

    #[test]
    fn test_scan_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("WebSim")).unwrap();
        fs::write(dir.path().join("WebSim").join("Log_WebSim.txt"), "x").unwrap();
        fs::write(dir.path().join("Out_top_level.csv"), "x").unwrap();

        assert!(scan_for_results(dir.path()).is_none());
        assert!(locate_results(dir.path(), "WebSim", "").is_none());
    }

    #[test]
    fn test_missing_exe_dir_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan_for_results(&dir.path().join("gone")).is_none());
    }
}
