//! Summary values scraped from the AALM console output.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

fn average_bll_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"Average BLL over simulation\s*=\s*([\d.]+)").expect("valid regex")
    })
}

fn run_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"Run name = (\S+)").expect("valid regex"))
}

/// What the executable reported on stdout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OutputSummary {
    /// Average blood lead over the simulation (μg/dL), when reported.
    pub average_bll: Option<f64>,

    /// Run name as the executable understood it.
    pub reported_run_name: Option<String>,
}

impl OutputSummary {
    pub fn parse(stdout: &str) -> Self {
        Self {
            average_bll: parse_average_bll(stdout),
            reported_run_name: parse_reported_run_name(stdout),
        }
    }
}

/// First `Average BLL over simulation = <x>` value. A match that is not a
/// number (e.g. `1.2.3`) counts as absent.
pub fn parse_average_bll(stdout: &str) -> Option<f64> {
    average_bll_pattern()
        .captures(stdout)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn parse_reported_run_name(stdout: &str) -> Option<String> {
    run_name_pattern()
        .captures(stdout)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}
