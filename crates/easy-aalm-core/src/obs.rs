//! Structured observability hooks for the simulation lifecycle.
//!
//! Every hook emits a single `tracing` event with an `event` field so log
//! pipelines can filter on it:
//!
//! - `simulation.started` / `simulation.finished` / `simulation.failed`
//! - `result.located` / `result.missing`
//! - `export.written`

use std::path::Path;

use tracing::{info, warn};

use crate::locator::LocateStrategy;

/// RAII guard that enters a span tagged with the run name.
///
/// ```ignore
/// let _span = RunSpan::enter("WebSim");
/// // everything logged here carries run_name = "WebSim"
/// ```
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    pub fn enter(run_name: &str) -> Self {
        Self {
            _span: run_span(run_name).entered(),
        }
    }
}

/// The run span itself, for instrumenting futures.
pub fn run_span(run_name: &str) -> tracing::Span {
    tracing::info_span!("aalm.run", run_name = %run_name)
}

pub fn emit_simulation_started(run_name: &str, executable: &Path, runner: &str) {
    info!(
        event = "simulation.started",
        run_name = %run_name,
        executable = %executable.display(),
        runner = %runner,
    );
}

pub fn emit_simulation_finished(run_name: &str, duration_ms: u64, exit_code: i32) {
    info!(
        event = "simulation.finished",
        run_name = %run_name,
        duration_ms = duration_ms,
        exit_code = exit_code,
    );
}

/// Launch failure or timeout (warning level).
pub fn emit_simulation_failed(run_name: &str, error: &dyn std::fmt::Display) {
    warn!(event = "simulation.failed", run_name = %run_name, error = %error);
}

pub fn emit_result_located(run_name: &str, strategy: LocateStrategy, path: &Path) {
    info!(
        event = "result.located",
        run_name = %run_name,
        strategy = %strategy,
        path = %path.display(),
    );
}

pub fn emit_result_missing(run_name: &str) {
    warn!(event = "result.missing", run_name = %run_name);
}

pub fn emit_export_written(kind: &str, path: &Path, rows: usize) {
    info!(
        event = "export.written",
        kind = %kind,
        path = %path.display(),
        rows = rows,
    );
}
