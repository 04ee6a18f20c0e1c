//! AALM input-file synthesis.
//!
//! The AALM input is a comma-separated text file where every row starts with
//! a `(section, key)` label pair followed by positional values whose meaning
//! is owned by the model. A small set of rows is rewritten per run; every
//! other line is carried over byte-for-byte.
//!
//! Rows that match a target label but do not have the expected shape are left
//! untouched and reported as [`SchemaWarning`]s instead of being guessed at.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{template_missing, AalmError, Result};
use crate::params::NormalizedExposure;

/// Rows of the template that are rewritten for each run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TargetRow {
    /// `Name,<run>` on the first line.
    RunName,
    /// `Sim,age_range,_,<start day>,<end day>`
    AgeRange,
    /// `Growth,sex,_,<code>`
    Sex,
    /// `Food,source_amt1,<n>,<v1>..<vn>`
    FoodAmount,
    /// `Water,concs1,_,<µg/L>`
    WaterConcentration,
    /// `Soil,concs1,_,<PPM>`
    SoilConcentration,
    /// `Dust,concs1,_,<PPM>`
    DustConcentration,
}

impl TargetRow {
    pub const ALL: [TargetRow; 7] = [
        TargetRow::RunName,
        TargetRow::AgeRange,
        TargetRow::Sex,
        TargetRow::FoodAmount,
        TargetRow::WaterConcentration,
        TargetRow::SoilConcentration,
        TargetRow::DustConcentration,
    ];

    /// The `(section, key)` label. The run-name row only has a section.
    pub fn label(&self) -> (&'static str, Option<&'static str>) {
        match self {
            TargetRow::RunName => ("Name", None),
            TargetRow::AgeRange => ("Sim", Some("age_range")),
            TargetRow::Sex => ("Growth", Some("sex")),
            TargetRow::FoodAmount => ("Food", Some("source_amt1")),
            TargetRow::WaterConcentration => ("Water", Some("concs1")),
            TargetRow::SoilConcentration => ("Soil", Some("concs1")),
            TargetRow::DustConcentration => ("Dust", Some("concs1")),
        }
    }

    fn matching(index: usize, fields: &[&str]) -> Option<TargetRow> {
        if index == 0 && fields.first() == Some(&"Name") {
            return Some(TargetRow::RunName);
        }
        if fields.len() < 2 {
            return None;
        }
        TargetRow::ALL.into_iter().find(|row| {
            let (section, key) = row.label();
            key.is_some_and(|key| fields[0] == section && fields[1] == key)
        })
    }

    /// Smallest field count needed to rewrite this row.
    fn min_fields(&self) -> usize {
        match self {
            TargetRow::RunName => 2,
            TargetRow::AgeRange => 5,
            TargetRow::FoodAmount => 3,
            TargetRow::Sex
            | TargetRow::WaterConcentration
            | TargetRow::SoilConcentration
            | TargetRow::DustConcentration => 4,
        }
    }
}

impl std::fmt::Display for TargetRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.label() {
            (section, Some(key)) => write!(f, "{section},{key}"),
            (section, None) => f.write_str(section),
        }
    }
}

/// One line of the template, kept verbatim including its line ending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateLine {
    raw: String,
}

impl TemplateLine {
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Comma-split fields with trailing whitespace (and the line ending) removed.
    pub fn fields(&self) -> Vec<&str> {
        self.raw.trim_end().split(',').collect()
    }
}

/// A parsed example input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    lines: Vec<TemplateLine>,
}

impl Template {
    /// Split template text into lines, preserving line endings.
    pub fn parse(text: &str) -> Self {
        let lines = text
            .split_inclusive('\n')
            .map(|raw| TemplateLine {
                raw: raw.to_string(),
            })
            .collect();
        Self { lines }
    }

    /// Read a template from disk.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(template_missing(path));
        }
        let text = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "loaded AALM template");
        Ok(Self::parse(&text))
    }

    pub fn lines(&self) -> &[TemplateLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Rewrite the target rows for one run.
    pub fn synthesize(&self, exposure: &NormalizedExposure, run_name: &str) -> Synthesis {
        let mut report = SynthesisReport::default();
        let mut lines = Vec::with_capacity(self.lines.len());

        for (index, line) in self.lines.iter().enumerate() {
            let fields = line.fields();
            let Some(row) = TargetRow::matching(index, &fields) else {
                lines.push(line.raw.clone());
                continue;
            };

            let line_no = index + 1;
            match patch_fields(row, &fields, exposure, run_name) {
                Ok((patched, notes)) => {
                    for reason in notes {
                        report.warn(line_no, row, reason);
                    }
                    report.rewritten.push(RewrittenRow { line: line_no, row });
                    lines.push(format!("{patched}\n"));
                }
                Err(reason) => {
                    report.warn(line_no, row, reason);
                    lines.push(line.raw.clone());
                }
            }
        }

        report.missing = TargetRow::ALL
            .into_iter()
            .filter(|row| !report.rewritten.iter().any(|r| r.row == *row))
            .filter(|row| !report.warnings.iter().any(|w| w.row == *row))
            .collect();
        for row in &report.missing {
            warn!(row = %row, "template has no row for target");
        }

        Synthesis { lines, report }
    }
}

/// Apply the rewrite for `row` and return the re-joined line plus non-fatal
/// notes about slots that could not be filled. `Err` leaves the line untouched.
fn patch_fields(
    row: TargetRow,
    fields: &[&str],
    exposure: &NormalizedExposure,
    run_name: &str,
) -> std::result::Result<(String, Vec<String>), String> {
    if fields.len() < row.min_fields() {
        return Err(format!(
            "expected at least {} fields, found {}",
            row.min_fields(),
            fields.len()
        ));
    }

    let mut owned: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
    let mut notes = Vec::new();

    match row {
        TargetRow::RunName => owned[1] = run_name.to_string(),
        TargetRow::AgeRange => {
            owned[3] = exposure.start_day.to_string();
            owned[4] = exposure.end_day.to_string();
        }
        TargetRow::Sex => owned[3] = exposure.sex_code.to_string(),
        TargetRow::FoodAmount => {
            let count: usize = owned[2]
                .trim()
                .parse()
                .map_err(|_| format!("repetition count '{}' is not an integer", owned[2]))?;
            let value = format!("{:.2}", exposure.food_ug_per_day);
            let available = owned.len() - 3;
            for slot in owned.iter_mut().skip(3).take(count) {
                *slot = value.clone();
            }
            if count > available {
                notes.push(format!(
                    "declares {count} values but only {available} are present"
                ));
            }
        }
        TargetRow::WaterConcentration => owned[3] = format!("{:.2}", exposure.water_ug_per_l),
        TargetRow::SoilConcentration => owned[3] = exposure.soil_ppm.to_string(),
        TargetRow::DustConcentration => owned[3] = exposure.dust_ppm.to_string(),
    }

    Ok((owned.join(","), notes))
}

/// A target row that was rewritten.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RewrittenRow {
    /// 1-based line number.
    pub line: usize,
    pub row: TargetRow,
}

/// A target row whose shape did not match what the rewrite expects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaWarning {
    /// 1-based line number.
    pub line: usize,
    pub row: TargetRow,
    pub reason: String,
}

/// What the synthesizer did to the template.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SynthesisReport {
    pub rewritten: Vec<RewrittenRow>,
    pub warnings: Vec<SchemaWarning>,
    /// Target rows absent from the template.
    pub missing: Vec<TargetRow>,
}

impl SynthesisReport {
    fn warn(&mut self, line: usize, row: TargetRow, reason: String) {
        warn!(line, row = %row, reason = %reason, "template row does not match expected shape");
        self.warnings.push(SchemaWarning { line, row, reason });
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.missing.is_empty()
    }
}

/// The synthesized input file plus a report of what changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesis {
    lines: Vec<String>,
    report: SynthesisReport,
}

impl Synthesis {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn report(&self) -> &SynthesisReport {
        &self.report
    }

    pub fn to_text(&self) -> String {
        self.lines.concat()
    }

    /// SHA-256 hex digest of the synthesized text.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for line in &self.lines {
            hasher.update(line.as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    /// Fail on any schema warning or missing target row.
    pub fn ensure_clean(&self) -> Result<()> {
        if let Some(w) = self.report.warnings.first() {
            return Err(AalmError::TemplateSchema(format!(
                "line {} ({}): {}",
                w.line, w.row, w.reason
            )));
        }
        if let Some(row) = self.report.missing.first() {
            return Err(AalmError::TemplateSchema(format!(
                "template has no {row} row"
            )));
        }
        Ok(())
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_text())?;
        Ok(())
    }
}
