//! Headline metrics and the persisted run summary.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::export::ExportPaths;
use crate::locator::LocateStrategy;
use crate::params::{AgeRange, ExposureParams, NormalizedExposure};
use crate::template::SchemaWarning;

/// CDC blood lead reference value (μg/dL).
pub const CDC_REFERENCE_UG_DL: f64 = 3.5;

pub const REPORT_SCHEMA_VERSION: &str = "1.0";

/// File name of the JSON summary written next to the exports.
pub const SUMMARY_FILE_NAME: &str = "summary.json";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdStatus {
    Above,
    Below,
}

impl ThresholdStatus {
    /// `Above` only for a reported average strictly over the threshold.
    pub fn classify(average_bll: Option<f64>, threshold: f64) -> Self {
        match average_bll {
            Some(avg) if avg > threshold => ThresholdStatus::Above,
            _ => ThresholdStatus::Below,
        }
    }
}

impl fmt::Display for ThresholdStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdStatus::Above => f.write_str("Above"),
            ThresholdStatus::Below => f.write_str("Below"),
        }
    }
}

/// The three headline figures shown after a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metrics {
    pub average_bll: Option<f64>,
    pub age_range: AgeRange,
    pub threshold: f64,
    pub status: ThresholdStatus,
}

impl Metrics {
    pub fn new(average_bll: Option<f64>, age_range: AgeRange, threshold: f64) -> Self {
        Self {
            average_bll,
            age_range,
            threshold,
            status: ThresholdStatus::classify(average_bll, threshold),
        }
    }

    /// `2.35 μg/dL`, or empty when the run did not report an average.
    pub fn average_bll_display(&self) -> String {
        self.average_bll
            .map(|v| format!("{v:.2} μg/dL"))
            .unwrap_or_default()
    }

    pub fn threshold_label(&self) -> String {
        format!("CDC Threshold ({} μg/dL)", self.threshold)
    }
}

/// Canonical `summary.json` artifact for one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunReport {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub run_name: String,
    pub params: ExposureParams,
    pub normalized: NormalizedExposure,
    pub metrics: Metrics,
    /// SHA-256 of the synthesized input file.
    pub input_digest: String,
    pub executable: PathBuf,
    pub duration_ms: u64,
    pub locate_strategy: Option<LocateStrategy>,
    pub result_path: Option<PathBuf>,
    pub result_rows: Option<usize>,
    pub exports: Option<ExportPaths>,
    pub chart_path: Option<PathBuf>,
    /// Why a located table produced no exports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_error: Option<String>,
    pub warnings: Vec<SchemaWarning>,
}

pub fn write_report_json(path: &Path, report: &RunReport) -> Result<()> {
    let content = serde_json::to_string_pretty(report)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn read_report_json(path: &Path) -> Result<RunReport> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Markdown summary for terminal output.
pub fn render_report_md(report: &RunReport) -> String {
    let metrics = &report.metrics;
    let average = metrics.average_bll_display();

    let mut out = String::new();
    out.push_str(&format!("# AALM Run `{}`\n\n", report.run_name));
    out.push_str("## Results\n");
    out.push_str(&format!(
        "- Average Blood Lead Level: {}\n- Age Range: {}\n- {}: {}\n\n",
        if average.is_empty() { "-" } else { average.as_str() },
        metrics.age_range,
        metrics.threshold_label(),
        metrics.status
    ));

    out.push_str("## Output\n");
    match (&report.result_path, report.locate_strategy) {
        (Some(path), Some(strategy)) => {
            out.push_str(&format!("- result table: `{}` ({})\n", path.display(), strategy));
        }
        (Some(path), None) => {
            out.push_str(&format!("- result table: `{}`\n", path.display()));
        }
        (None, _) => out.push_str("- result table: not found\n"),
    }
    if let Some(error) = &report.result_error {
        out.push_str(&format!("- problem: {error}\n"));
    }
    if let Some(rows) = report.result_rows {
        out.push_str(&format!("- rows: {rows}\n"));
    }
    if let Some(exports) = &report.exports {
        out.push_str(&format!(
            "- daily export: `{}`\n- weekly export: `{}`\n",
            exports.daily.display(),
            exports.weekly.display()
        ));
    }
    if let Some(chart) = &report.chart_path {
        out.push_str(&format!("- chart: `{}`\n", chart.display()));
    }

    if !report.warnings.is_empty() {
        out.push_str("\n## Template Warnings\n");
        for w in &report.warnings {
            out.push_str(&format!("- line {} ({}): {}\n", w.line, w.row, w.reason));
        }
    }
    out
}
