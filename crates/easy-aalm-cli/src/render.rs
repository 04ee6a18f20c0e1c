//! Terminal rendering of a finished run.

use easy_aalm_core::{render_report_md, ResultOutcome, RunOutcome};

/// Report plus, when no table could be used, the raw model output.
pub fn render_outcome(outcome: &RunOutcome) -> String {
    let mut out = render_report_md(&outcome.report);

    match &outcome.result {
        ResultOutcome::Table { .. } => {}
        ResultOutcome::Unparseable { path, error, .. } => {
            out.push_str(&format!(
                "\nCould not parse output CSV {}: {error}\n",
                path.display()
            ));
            push_raw(&mut out, &outcome.process.stdout);
        }
        ResultOutcome::Missing => {
            out.push_str("\nOutput CSV not found. Showing raw output:\n");
            push_raw(&mut out, &outcome.process.stdout);
        }
    }
    out
}

/// Both streams of a failed run, stderr first.
pub fn render_failure(code: i32, stderr: &str, stdout: &str) -> String {
    let mut out = format!("AALM simulation failed (exit code {code})\n");
    if !stderr.trim().is_empty() {
        out.push_str("\n--- stderr ---\n");
        out.push_str(stderr.trim_end());
        out.push('\n');
    }
    if !stdout.trim().is_empty() {
        out.push_str("\n--- stdout ---\n");
        out.push_str(stdout.trim_end());
        out.push('\n');
    }
    out
}

fn push_raw(out: &mut String, raw: &str) {
    out.push_str("```\n");
    out.push_str(raw.trim_end());
    out.push_str("\n```\n");
}
