//! Error taxonomy for Easy AALM.

use std::path::{Path, PathBuf};

/// Errors produced while preparing, running or reading an AALM simulation.
///
/// A missing or unreadable result table is deliberately *not* an error: the
/// pipeline degrades to showing the raw process output instead.
#[derive(Debug, thiserror::Error)]
pub enum AalmError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("could not find the AALM executable (searched: {})", join_paths(.searched))]
    ExecutableNotFound { searched: Vec<PathBuf> },

    #[error("template file not found at {0:?}")]
    TemplateNotFound(PathBuf),

    #[error("template schema mismatch: {0}")]
    TemplateSchema(String),

    #[error("simulation timed out after {limit_ms}ms; try reducing the age range")]
    Timeout { limit_ms: u64 },

    #[error("AALM simulation failed with exit code {code}:\n{stderr}")]
    NonZeroExit {
        code: i32,
        stderr: String,
        stdout: String,
    },

    #[error("failed to launch {path:?}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("result table error: {0}")]
    ResultTable(String),

    #[error("chart error: {0}")]
    Chart(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AalmError {
    /// Whether the failure happened before the executable was started.
    pub fn is_pre_launch(&self) -> bool {
        matches!(
            self,
            AalmError::InvalidParameter(_)
                | AalmError::ExecutableNotFound { .. }
                | AalmError::TemplateNotFound(_)
                | AalmError::TemplateSchema(_)
                | AalmError::Config(_)
        )
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Shorthand used by modules that only need to attach a path to an io error.
pub(crate) fn template_missing(path: &Path) -> AalmError {
    AalmError::TemplateNotFound(path.to_path_buf())
}

/// Result type for Easy AALM operations.
pub type Result<T> = std::result::Result<T, AalmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executable_not_found_lists_candidates() {
        let err = AalmError::ExecutableNotFound {
            searched: vec![
                PathBuf::from("aalm_original/AALM_64.exe"),
                PathBuf::from("AALM_64.exe"),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("could not find the AALM executable"));
        assert!(msg.contains("aalm_original/AALM_64.exe, AALM_64.exe"));
    }

    #[test]
    fn test_timeout_message_carries_hint() {
        let err = AalmError::Timeout { limit_ms: 60_000 };
        let msg = err.to_string();
        assert!(msg.contains("60000ms"));
        assert!(msg.contains("reducing the age range"));
    }

    #[test]
    fn test_non_zero_exit_includes_stderr() {
        let err = AalmError::NonZeroExit {
            code: 3,
            stderr: "forrtl: severe (24): end-of-file".to_string(),
            stdout: "partial".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("exit code 3"));
        assert!(msg.contains("end-of-file"));
    }

    #[test]
    fn test_pre_launch_classification() {
        assert!(AalmError::ExecutableNotFound { searched: vec![] }.is_pre_launch());
        assert!(template_missing(Path::new("x.txt")).is_pre_launch());
        assert!(!AalmError::Timeout { limit_ms: 1 }.is_pre_launch());
        assert!(!AalmError::NonZeroExit {
            code: 1,
            stderr: String::new(),
            stdout: String::new()
        }
        .is_pre_launch());
    }
}
