//! Downloadable CSV exports of the result table.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::obs;
use crate::table::ResultTable;

/// Default decimation for the weekly export.
pub const WEEKLY_STRIDE: usize = 7;

/// `aalm_results_{end}y.csv`
pub fn daily_file_name(end_years: u32) -> String {
    format!("aalm_results_{end_years}y.csv")
}

/// `aalm_results_{end}y_weekly.csv`
pub fn weekly_file_name(end_years: u32) -> String {
    format!("aalm_results_{end_years}y_weekly.csv")
}

/// Every `stride`-th row of the daily table, starting with the first.
///
/// This is plain sampling; nothing is averaged.
pub fn weekly_sample(table: &ResultTable, stride: usize) -> ResultTable {
    table.every_nth(stride)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportPaths {
    pub daily: PathBuf,
    pub weekly: PathBuf,
}

/// Write both exports into `output_dir`.
pub fn write_exports(
    table: &ResultTable,
    output_dir: &Path,
    end_years: u32,
    stride: usize,
) -> Result<ExportPaths> {
    std::fs::create_dir_all(output_dir)?;

    let daily = output_dir.join(daily_file_name(end_years));
    table.write_csv(&daily)?;
    obs::emit_export_written("daily", &daily, table.len());

    let weekly_table = weekly_sample(table, stride);
    let weekly = output_dir.join(weekly_file_name(end_years));
    weekly_table.write_csv(&weekly)?;
    obs::emit_export_written("weekly", &weekly, weekly_table.len());

    Ok(ExportPaths { daily, weekly })
}
