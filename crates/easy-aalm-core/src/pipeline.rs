//! One operator submission, end to end.
//!
//! ```text
//! ExposureParams ─► normalize ─► Template::synthesize ─► scratch TempDir
//!                                                        │
//!            stage next to executable ◄──────────────────┘
//!                     │
//!               ModelRunner::run ─► OutputSummary + locate_results
//!                                          │
//!                         ResultTable ─► exports, chart, summary.json
//! ```
//!
//! Anything that goes wrong before or during the process run is an error.
//! A result table that cannot be found or read is not: the run still
//! produces a report and the raw process output is kept for display.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn, Instrument};

use crate::chart::{self, ChartConfig};
use crate::config::AalmConfig;
use crate::error::Result;
use crate::export::{self, ExportPaths};
use crate::invoker::{self, executable_dir, resolve_executable};
use crate::locator::{locate_results, LocateStrategy, LocatedResult};
use crate::obs;
use crate::params::ExposureParams;
use crate::report::{self, Metrics, RunReport, REPORT_SCHEMA_VERSION, SUMMARY_FILE_NAME};
use crate::runner::{ModelRunner, ProcessOutput, SubprocessRunner};
use crate::summary::OutputSummary;
use crate::table::ResultTable;
use crate::template::{Synthesis, Template};

/// File name of the chart written into the output directory.
pub const CHART_FILE_NAME: &str = "blood_lead.svg";

/// What became of the result table after a successful process run.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultOutcome {
    /// Table read and exported.
    Table {
        located: LocatedResult,
        rows: usize,
        /// `None` when the export files could not be written.
        exports: Option<ExportPaths>,
        /// `None` when the table lacks `Days`/`Cblood` or the chart failed.
        chart: Option<PathBuf>,
    },
    /// A file was found but could not be read as a table.
    Unparseable {
        path: PathBuf,
        strategy: LocateStrategy,
        error: String,
    },
    /// No result file anywhere.
    Missing,
}

impl ResultOutcome {
    pub fn is_table(&self) -> bool {
        matches!(self, ResultOutcome::Table { .. })
    }
}

/// Everything a completed run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: RunReport,
    pub summary: OutputSummary,
    /// Raw process output, always kept for display.
    pub process: ProcessOutput,
    pub result: ResultOutcome,
    pub summary_path: PathBuf,
}

/// An input file written without running the model.
#[derive(Debug, Clone)]
pub struct SynthesizedInput {
    pub run_name: String,
    pub path: PathBuf,
    pub synthesis: Synthesis,
}

pub struct Pipeline {
    config: AalmConfig,
    runner: Arc<dyn ModelRunner>,
}

impl Pipeline {
    pub fn new(config: AalmConfig) -> Self {
        Self::with_runner(config, Arc::new(SubprocessRunner))
    }

    pub fn with_runner(config: AalmConfig, runner: Arc<dyn ModelRunner>) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &AalmConfig {
        &self.config
    }

    /// Template synthesis shared by [`run`](Self::run) and
    /// [`synthesize_only`](Self::synthesize_only).
    fn synthesize(&self, params: &ExposureParams, run_name: &str) -> Result<Synthesis> {
        self.config.validate()?;
        let normalized = params.normalize()?;
        let template = Template::load(&self.config.template_path())?;
        let synthesis = template.synthesize(&normalized, run_name);
        if self.config.strict_template {
            synthesis.ensure_clean()?;
        }
        Ok(synthesis)
    }

    /// Write the synthesized input to `dest` without invoking the model.
    pub fn synthesize_only(&self, params: &ExposureParams, dest: &Path) -> Result<SynthesizedInput> {
        let run_name = self.config.effective_run_name();
        let _span = obs::RunSpan::enter(&run_name);

        let synthesis = self.synthesize(params, &run_name)?;
        synthesis.write_to(dest)?;
        info!(path = %dest.display(), digest = %synthesis.digest(), "wrote AALM input");

        Ok(SynthesizedInput {
            run_name,
            path: dest.to_path_buf(),
            synthesis,
        })
    }

    /// Repeat result discovery for an earlier run. `stdout` is that run's
    /// console output, if it was kept.
    pub fn locate_only(&self, run_name: &str, stdout: Option<&str>) -> Result<Option<LocatedResult>> {
        let executable = resolve_executable(&self.config.executable_candidates())?;
        Ok(locate_results(
            &executable_dir(&executable),
            run_name,
            stdout.unwrap_or_default(),
        ))
    }

    /// Run the model once and write exports, chart and `summary.json`
    /// into `output_dir`.
    pub async fn run(&self, params: &ExposureParams, output_dir: &Path) -> Result<RunOutcome> {
        let run_name = self.config.effective_run_name();
        let span = obs::run_span(&run_name);
        self.run_named(params, output_dir, run_name)
            .instrument(span)
            .await
    }

    async fn run_named(
        &self,
        params: &ExposureParams,
        output_dir: &Path,
        run_name: String,
    ) -> Result<RunOutcome> {
        let synthesis = self.synthesize(params, &run_name)?;
        let executable = resolve_executable(&self.config.executable_candidates())?;

        // Scratch copy is removed when `scratch` drops, on every path.
        let scratch = tempfile::Builder::new().prefix("easy-aalm-").tempdir()?;
        let scratch_input = scratch.path().join(&self.config.input_file_name);
        synthesis.write_to(&scratch_input)?;

        let staged = invoker::stage_input(
            &executable,
            &scratch_input,
            &self.config.input_file_name,
            &run_name,
        )?;
        let process = invoker::invoke(self.runner.as_ref(), &staged, self.config.timeout()).await?;
        drop(scratch);

        let summary = OutputSummary::parse(&process.stdout);
        std::fs::create_dir_all(output_dir)?;

        let result = match locate_results(&staged.exe_dir, &run_name, &process.stdout) {
            Some(located) => {
                obs::emit_result_located(&run_name, located.strategy, &located.path);
                self.present(located, params.age.end_years, output_dir)
            }
            None => {
                obs::emit_result_missing(&run_name);
                ResultOutcome::Missing
            }
        };

        let (locate_strategy, result_path, result_rows, exports, chart_path) = match &result {
            ResultOutcome::Table {
                located,
                rows,
                exports,
                chart,
            } => (
                Some(located.strategy),
                Some(located.path.clone()),
                Some(*rows),
                exports.clone(),
                chart.clone(),
            ),
            ResultOutcome::Unparseable { path, strategy, .. } => {
                (Some(*strategy), Some(path.clone()), None, None, None)
            }
            ResultOutcome::Missing => (None, None, None, None, None),
        };
        let result_error = match &result {
            ResultOutcome::Unparseable { error, .. } => {
                Some(format!("could not parse result table: {error}"))
            }
            ResultOutcome::Table { exports: None, .. } => {
                Some("could not write export files".to_string())
            }
            _ => None,
        };

        let report = RunReport {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            run_name: run_name.clone(),
            params: params.clone(),
            normalized: params.normalize()?,
            metrics: Metrics::new(summary.average_bll, params.age, self.config.cdc_threshold),
            input_digest: synthesis.digest(),
            executable,
            duration_ms: process.duration_ms,
            locate_strategy,
            result_path,
            result_rows,
            exports,
            chart_path,
            result_error,
            warnings: synthesis.report().warnings.clone(),
        };

        let summary_path = output_dir.join(SUMMARY_FILE_NAME);
        report::write_report_json(&summary_path, &report)?;
        obs::emit_export_written("summary", &summary_path, 1);

        Ok(RunOutcome {
            report,
            summary,
            process,
            result,
            summary_path,
        })
    }

    /// Read the located table and write the presentation artifacts.
    fn present(
        &self,
        located: LocatedResult,
        end_years: u32,
        output_dir: &Path,
    ) -> ResultOutcome {
        let table = match ResultTable::from_path(&located.path) {
            Ok(table) => table,
            Err(err) => {
                warn!(path = %located.path.display(), error = %err, "could not parse result table");
                return ResultOutcome::Unparseable {
                    path: located.path,
                    strategy: located.strategy,
                    error: err.to_string(),
                };
            }
        };

        let exports =
            match export::write_exports(&table, output_dir, end_years, self.config.weekly_stride) {
                Ok(exports) => Some(exports),
                Err(err) => {
                    warn!(dir = %output_dir.display(), error = %err, "could not write exports");
                    None
                }
            };
        let chart = self.draw_chart(&table, output_dir);

        ResultOutcome::Table {
            rows: table.len(),
            located,
            exports,
            chart,
        }
    }

    fn draw_chart(&self, table: &ResultTable, output_dir: &Path) -> Option<PathBuf> {
        let series = match table.bll_series() {
            Ok(Some(series)) if !series.is_empty() => series,
            Ok(_) => {
                debug!("result table has no Days/Cblood data; skipping chart");
                return None;
            }
            Err(err) => {
                warn!(error = %err, "skipping chart");
                return None;
            }
        };

        let config = ChartConfig {
            reference_level: self.config.cdc_threshold,
            ..ChartConfig::default()
        };
        let path = output_dir.join(CHART_FILE_NAME);
        match chart::write_svg(&series, &config, &path) {
            Ok(()) => {
                obs::emit_export_written("chart", &path, series.len());
                Some(path)
            }
            Err(err) => {
                warn!(error = %err, "chart rendering failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AalmError;
    use crate::runner::Invocation;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct NeverRunner {
        calls: AtomicU32,
    }

    #[async_trait]
    impl ModelRunner for NeverRunner {
        async fn run(&self, _invocation: &Invocation) -> Result<ProcessOutput> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            unreachable!("runner must not be called")
        }

        fn name(&self) -> &str {
            "never"
        }
    }

    fn config_in(dir: &Path) -> AalmConfig {
        AalmConfig {
            home: Some(dir.to_path_buf()),
            executable: Some(dir.join("missing").join("AALM_64")),
            template: Some(dir.join("template.txt")),
            ..AalmConfig::default()
        }
    }

    #[tokio::test]
    async fn test_invalid_params_fail_before_anything_else() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(NeverRunner {
            calls: AtomicU32::new(0),
        });
        let pipeline = Pipeline::with_runner(config_in(dir.path()), runner.clone());
        let params = ExposureParams {
            food_value: -1.0,
            ..ExposureParams::default()
        };

        let err = pipeline.run(&params, &dir.path().join("out")).await.unwrap_err();
        assert!(matches!(err, AalmError::InvalidParameter(_)));
        assert_eq!(runner.calls.load(Ordering::Relaxed), 0);
        assert!(!dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn test_missing_template_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::with_runner(
            config_in(dir.path()),
            Arc::new(NeverRunner {
                calls: AtomicU32::new(0),
            }),
        );
        let err = pipeline
            .run(&ExposureParams::default(), &dir.path().join("out"))
            .await
            .unwrap_err();
        assert!(matches!(err, AalmError::TemplateNotFound(_)));
    }

    #[test]
    fn test_synthesize_only_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("template.txt"), "Name,Ex\nSim,age_range,2,0,1\n").unwrap();
        let pipeline = Pipeline::new(config_in(dir.path()));
        let dest = dir.path().join("input.txt");

        let written = pipeline
            .synthesize_only(&ExposureParams::default(), &dest)
            .unwrap();
        assert_eq!(written.run_name, "WebSim");
        assert_eq!(
            std::fs::read_to_string(&dest).unwrap(),
            "Name,WebSim\nSim,age_range,2,0,32850\n"
        );
    }

    #[test]
    fn test_strict_mode_rejects_incomplete_template() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("template.txt"), "Name,Ex\n").unwrap();
        let config = AalmConfig {
            strict_template: true,
            ..config_in(dir.path())
        };
        let err = Pipeline::new(config)
            .synthesize_only(&ExposureParams::default(), &dir.path().join("input.txt"))
            .unwrap_err();
        assert!(matches!(err, AalmError::TemplateSchema(_)));
        assert!(!dir.path().join("input.txt").exists());
    }
}
