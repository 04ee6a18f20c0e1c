//! Locating the AALM executable and launching a staged run.
//!
//! The AALM binary resolves its input and output paths relative to its own
//! directory, so the synthesized input is copied next to the executable and
//! the process runs with that directory as its working directory. The binary
//! also expects `<run name>/` to exist before it starts writing results.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{AalmError, Result};
use crate::obs;
use crate::runner::{Invocation, ModelRunner, ProcessOutput};

/// Directory, relative to the install home, holding the bundled model.
pub const BUNDLE_DIR: &str = "aalm_original";

/// Executable names to try, in order, for the current platform.
pub fn executable_names() -> &'static [&'static str] {
    if cfg!(windows) {
        &["AALM_64.exe"]
    } else {
        &["AALM_64", "AALM_64.exe"]
    }
}

/// Ordered candidate paths for the executable.
///
/// An explicit override always comes first. For each platform name the
/// bundled copy under `home` is tried, then the bundle relative to the
/// current directory, then the current directory itself.
pub fn executable_candidates(home: &Path, explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(path) = explicit {
        candidates.push(path.to_path_buf());
    }
    for name in executable_names() {
        candidates.push(home.join(BUNDLE_DIR).join(name));
        candidates.push(Path::new(BUNDLE_DIR).join(name));
        candidates.push(PathBuf::from(name));
    }
    candidates
}

/// Pick the first candidate that exists as a file.
///
/// The returned path is absolute so it stays valid once the working
/// directory changes.
pub fn resolve_executable(candidates: &[PathBuf]) -> Result<PathBuf> {
    for candidate in candidates {
        if candidate.is_file() {
            let resolved = candidate.canonicalize()?;
            debug!(executable = %resolved.display(), "resolved AALM executable");
            return Ok(resolved);
        }
    }
    Err(AalmError::ExecutableNotFound {
        searched: candidates.to_vec(),
    })
}

/// An input file placed where the executable will find it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedInput {
    pub executable: PathBuf,
    pub exe_dir: PathBuf,
    pub input_file_name: String,
    pub input_path: PathBuf,
    pub run_name: String,
    /// `<exe_dir>/<run_name>`, created before launch.
    pub output_dir: PathBuf,
}

impl StagedInput {
    pub fn invocation(&self, timeout: Duration) -> Invocation {
        Invocation {
            executable: self.executable.clone(),
            working_dir: self.exe_dir.clone(),
            input_file_name: self.input_file_name.clone(),
            timeout,
        }
    }
}

/// Directory containing `executable`.
pub fn executable_dir(executable: &Path) -> PathBuf {
    match executable.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Copy the synthesized input from `source` next to the executable and
/// pre-create the run's output directory.
pub fn stage_input(
    executable: &Path,
    source: &Path,
    input_file_name: &str,
    run_name: &str,
) -> Result<StagedInput> {
    let exe_dir = executable_dir(executable);
    let input_path = exe_dir.join(input_file_name);
    std::fs::copy(source, &input_path)?;

    let output_dir = exe_dir.join(run_name);
    std::fs::create_dir_all(&output_dir)?;

    debug!(
        input = %input_path.display(),
        output_dir = %output_dir.display(),
        "staged AALM input"
    );

    Ok(StagedInput {
        executable: executable.to_path_buf(),
        exe_dir,
        input_file_name: input_file_name.to_string(),
        input_path,
        run_name: run_name.to_string(),
        output_dir,
    })
}

/// Run a staged input and turn a non-zero exit into an error.
pub async fn invoke(
    runner: &dyn ModelRunner,
    staged: &StagedInput,
    timeout: Duration,
) -> Result<ProcessOutput> {
    obs::emit_simulation_started(&staged.run_name, &staged.executable, runner.name());

    let output = match runner.run(&staged.invocation(timeout)).await {
        Ok(output) => output,
        Err(err) => {
            obs::emit_simulation_failed(&staged.run_name, &err);
            return Err(err);
        }
    };

    obs::emit_simulation_finished(&staged.run_name, output.duration_ms, output.exit_code);

    if !output.success() {
        return Err(AalmError::NonZeroExit {
            code: output.exit_code,
            stderr: output.stderr,
            stdout: output.stdout,
        });
    }

    info!(run_name = %staged.run_name, duration_ms = output.duration_ms, "AALM run complete");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingRunner {
        calls: AtomicU32,
        exit_code: i32,
    }

    #[async_trait]
    impl ModelRunner for CountingRunner {
        async fn run(&self, _invocation: &Invocation) -> Result<ProcessOutput> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(ProcessOutput {
                exit_code: self.exit_code,
                stdout: "stdout text".to_string(),
                stderr: "stderr text".to_string(),
                duration_ms: 1,
            })
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[test]
    fn test_candidates_start_with_override_then_bundle() {
        let home = Path::new("/opt/easy-aalm");
        let candidates = executable_candidates(home, Some(Path::new("/custom/AALM")));
        let first_name = executable_names()[0];

        assert_eq!(candidates[0], PathBuf::from("/custom/AALM"));
        assert_eq!(candidates[1], home.join(BUNDLE_DIR).join(first_name));
        assert_eq!(candidates[2], Path::new(BUNDLE_DIR).join(first_name));
        assert_eq!(candidates[3], PathBuf::from(first_name));
        assert_eq!(candidates.len(), 1 + 3 * executable_names().len());
    }

    #[test]
    fn test_resolve_reports_every_searched_path() {
        let dir = tempfile::tempdir().unwrap();
        let candidates = vec![dir.path().join("a"), dir.path().join("b")];

        match resolve_executable(&candidates) {
            Err(AalmError::ExecutableNotFound { searched }) => assert_eq!(searched, candidates),
            other => panic!("expected ExecutableNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_skips_directories_and_returns_first_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("AALM_64")).unwrap();
        std::fs::write(dir.path().join("AALM_64.exe"), b"").unwrap();

        let resolved = resolve_executable(&[
            dir.path().join("AALM_64"),
            dir.path().join("AALM_64.exe"),
        ])
        .unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("AALM_64.exe"));
    }

    #[test]
    fn test_stage_input_copies_file_and_creates_output_dir() {
        let exe_dir = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        let exe = exe_dir.path().join("AALM_64");
        std::fs::write(&exe, b"").unwrap();
        let source = scratch.path().join("input.txt");
        std::fs::write(&source, "Name,WebSim\n").unwrap();

        let staged = stage_input(&exe, &source, "LeggettInput_web.txt", "WebSim").unwrap();

        assert_eq!(staged.exe_dir, exe_dir.path());
        assert_eq!(
            std::fs::read_to_string(exe_dir.path().join("LeggettInput_web.txt")).unwrap(),
            "Name,WebSim\n"
        );
        assert!(exe_dir.path().join("WebSim").is_dir());

        let invocation = staged.invocation(Duration::from_secs(60));
        assert_eq!(invocation.working_dir, exe_dir.path());
        assert_eq!(invocation.input_file_name, "LeggettInput_web.txt");
    }

    #[test]
    fn test_executable_dir_of_bare_name_is_current_dir() {
        assert_eq!(executable_dir(Path::new("AALM_64.exe")), PathBuf::from("."));
        assert_eq!(
            executable_dir(Path::new("/opt/aalm/AALM_64")),
            PathBuf::from("/opt/aalm")
        );
    }

    fn staged_in(dir: &Path) -> StagedInput {
        StagedInput {
            executable: dir.join("AALM_64"),
            exe_dir: dir.to_path_buf(),
            input_file_name: "LeggettInput_web.txt".to_string(),
            input_path: dir.join("LeggettInput_web.txt"),
            run_name: "WebSim".to_string(),
            output_dir: dir.join("WebSim"),
        }
    }

    #[tokio::test]
    async fn test_invoke_success_returns_output() {
        let dir = tempfile::tempdir().unwrap();
        let runner = CountingRunner {
            calls: AtomicU32::new(0),
            exit_code: 0,
        };

        let output = invoke(&runner, &staged_in(dir.path()), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(output.stdout, "stdout text");
        assert_eq!(runner.calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_invoke_non_zero_exit_carries_both_streams() {
        let dir = tempfile::tempdir().unwrap();
        let runner = CountingRunner {
            calls: AtomicU32::new(0),
            exit_code: 1,
        };

        match invoke(&runner, &staged_in(dir.path()), Duration::from_secs(1)).await {
            Err(AalmError::NonZeroExit {
                code,
                stderr,
                stdout,
            }) => {
                assert_eq!(code, 1);
                assert_eq!(stderr, "stderr text");
                assert_eq!(stdout, "stdout text");
            }
            other => panic!("expected NonZeroExit, got {:?}", other),
        }
    }
}
