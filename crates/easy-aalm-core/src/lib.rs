//! Easy AALM Core Library
//!
//! Turns a handful of exposure parameters into an input file for the
//! All-Ages Lead Model, runs the model executable, and collects its results
//! into exports, a chart and a JSON summary.

pub mod chart;
pub mod config;
pub mod error;
pub mod export;
pub mod invoker;
pub mod locator;
pub mod obs;
pub mod params;
pub mod pipeline;
pub mod report;
pub mod runner;
pub mod summary;
pub mod table;
pub mod telemetry;
pub mod template;
pub mod units;

pub use config::AalmConfig;
pub use error::{AalmError, Result};
pub use export::{write_exports, ExportPaths};
pub use invoker::{executable_candidates, resolve_executable, StagedInput};
pub use locator::{locate_results, LocateStrategy, LocatedResult};
pub use params::{AgeRange, ExposureParams, NormalizedExposure, Sex};
pub use pipeline::{Pipeline, ResultOutcome, RunOutcome, SynthesizedInput};
pub use report::{render_report_md, Metrics, RunReport, ThresholdStatus, CDC_REFERENCE_UG_DL};
pub use runner::{Invocation, ModelRunner, ProcessOutput, SubprocessRunner};
pub use summary::OutputSummary;
pub use table::{ResultTable, SeriesPoint};
pub use telemetry::init_tracing;
pub use template::{SchemaWarning, Synthesis, SynthesisReport, Template};
pub use units::{FoodUnit, WaterUnit};

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
