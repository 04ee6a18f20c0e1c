//! The AALM result table (`Out_<run>.csv`).
//!
//! AALM pads its headers and values with spaces, so every field is trimmed on
//! read. Values are kept as text; only the `Days` and `Cblood` columns get
//! typed access.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AalmError, Result};
use crate::params::DAYS_PER_YEAR;

pub const DAYS_COLUMN: &str = "Days";
pub const BLOOD_LEAD_COLUMN: &str = "Cblood";

/// One point of the blood-lead time series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SeriesPoint {
    pub age_years: f64,
    /// μg/dL
    pub bll: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ResultTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(AalmError::ResultTable("result file has no header row".to_string()));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.iter().all(|f| f.is_empty()) {
                continue;
            }
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// `(Days / 365, Cblood)` for every row.
    ///
    /// `Ok(None)` when either column is absent. A value in those columns that
    /// is not a number is an error.
    pub fn bll_series(&self) -> Result<Option<Vec<SeriesPoint>>> {
        let (Some(days_idx), Some(bll_idx)) = (
            self.column_index(DAYS_COLUMN),
            self.column_index(BLOOD_LEAD_COLUMN),
        ) else {
            return Ok(None);
        };

        let mut series = Vec::with_capacity(self.rows.len());
        for (i, row) in self.rows.iter().enumerate() {
            let days = numeric_cell(row, days_idx, DAYS_COLUMN, i)?;
            let bll = numeric_cell(row, bll_idx, BLOOD_LEAD_COLUMN, i)?;
            series.push(SeriesPoint {
                age_years: days / f64::from(DAYS_PER_YEAR),
                bll,
            });
        }
        Ok(Some(series))
    }

    /// Rows `0, n, 2n, ...`, headers unchanged. A stride of 0 is treated as 1.
    pub fn every_nth(&self, n: usize) -> ResultTable {
        let n = n.max(1);
        ResultTable {
            headers: self.headers.clone(),
            rows: self.rows.iter().step_by(n).cloned().collect(),
        }
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn numeric_cell(row: &[String], idx: usize, column: &str, row_no: usize) -> Result<f64> {
    let cell = row.get(idx).map(String::as_str).unwrap_or("");
    cell.parse().map_err(|_| {
        AalmError::ResultTable(format!(
            "row {}: {column} value {cell:?} is not a number",
            row_no + 1
        ))
    })
}
