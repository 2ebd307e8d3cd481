//! CSV-based assumption loader
//!
//! Loads rate tables from CSV files in data/assumptions/

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use super::benchmarks::{BenchmarkRange, ExpenseLine};
use super::cmhc::CmhcBand;
use super::land_transfer::Bracket;
use crate::deal::PropertyType;
use crate::error::{AnalysisError, Result};

/// Default path to assumptions directory
pub const DEFAULT_ASSUMPTIONS_PATH: &str = "data/assumptions";

fn table_error(file: &str, reason: impl Into<String>) -> AnalysisError {
    AnalysisError::Assumptions {
        file: file.to_string(),
        reason: reason.into(),
    }
}

fn check_rate(file: &str, what: &str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(table_error(file, format!("{} {} is outside [0, 1]", what, value)));
    }
    Ok(())
}

/// Load CMHC premium bands
/// Columns: max_ltv, standard_rate, non_traditional_rate
pub fn load_cmhc_premiums(path: &Path) -> Result<Vec<CmhcBand>> {
    const FILE: &str = "cmhc_premiums.csv";
    let mut reader = csv::Reader::from_path(path.join(FILE))?;

    let mut bands = Vec::new();
    for result in reader.deserialize() {
        let band: CmhcBand = result?;
        check_rate(FILE, "max_ltv", band.max_ltv)?;
        check_rate(FILE, "standard_rate", band.standard_rate)?;
        check_rate(FILE, "non_traditional_rate", band.non_traditional_rate)?;
        bands.push(band);
    }

    if bands.is_empty() {
        return Err(table_error(FILE, "no premium bands"));
    }
    Ok(bands)
}

#[derive(Debug, Deserialize)]
struct BracketRow {
    jurisdiction: String,
    threshold: f64,
    rate: f64,
}

/// Load land transfer tax brackets grouped by schedule key
/// Columns: jurisdiction, threshold, rate
pub fn load_land_transfer_brackets(path: &Path) -> Result<HashMap<String, Vec<Bracket>>> {
    const FILE: &str = "land_transfer_brackets.csv";
    let mut reader = csv::Reader::from_path(path.join(FILE))?;

    let mut schedules: HashMap<String, Vec<Bracket>> = HashMap::new();
    for result in reader.deserialize() {
        let row: BracketRow = result?;
        check_rate(FILE, "rate", row.rate)?;
        if row.threshold < 0.0 {
            return Err(table_error(FILE, format!("negative threshold for {}", row.jurisdiction)));
        }
        schedules
            .entry(row.jurisdiction.trim().to_ascii_uppercase())
            .or_default()
            .push(Bracket {
                threshold: row.threshold,
                rate: row.rate,
            });
    }

    Ok(schedules)
}

/// Load stress test rule overrides
/// Columns: rule, value
pub fn load_stress_test_rules(path: &Path) -> Result<Vec<(String, f64)>> {
    const FILE: &str = "stress_test.csv";
    let mut reader = csv::Reader::from_path(path.join(FILE))?;

    let mut rules = Vec::new();
    for result in reader.records() {
        let record = result?;
        let key = record.get(0).unwrap_or_default().trim().to_string();
        let value: f64 = record
            .get(1)
            .unwrap_or_default()
            .trim()
            .parse()
            .map_err(|e| table_error(FILE, format!("rule '{}': {}", key, e)))?;
        rules.push((key, value));
    }

    Ok(rules)
}

/// A benchmark override row; `line == None` is the total expense ratio
#[derive(Debug, Clone)]
pub struct BenchmarkRow {
    pub property_type: PropertyType,
    pub line: Option<ExpenseLine>,
    pub range: BenchmarkRange,
}

#[derive(Debug, Deserialize)]
struct RawBenchmarkRow {
    property_type: String,
    line: String,
    low: f64,
    high: f64,
}

/// Load expense benchmarks
/// Columns: property_type, line, low, high (line "total" for the overall ratio)
pub fn load_expense_benchmarks(path: &Path) -> Result<Vec<BenchmarkRow>> {
    const FILE: &str = "expense_benchmarks.csv";
    let mut reader = csv::Reader::from_path(path.join(FILE))?;

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let raw: RawBenchmarkRow = result?;
        if raw.low > raw.high {
            return Err(table_error(FILE, format!("low > high for {} {}", raw.property_type, raw.line)));
        }
        let property_type: PropertyType = raw
            .property_type
            .parse()
            .map_err(|e: AnalysisError| table_error(FILE, e.to_string()))?;
        let line = match raw.line.trim() {
            "total" => None,
            other => Some(
                other
                    .parse::<ExpenseLine>()
                    .map_err(|e| table_error(FILE, e.to_string()))?,
            ),
        };
        rows.push(BenchmarkRow {
            property_type,
            line,
            range: BenchmarkRange::new(raw.low, raw.high),
        });
    }

    Ok(rows)
}

/// Load deal score weights
/// Columns: component, weight
pub fn load_scoring_weights(path: &Path) -> Result<Vec<(String, f64)>> {
    const FILE: &str = "scoring_weights.csv";
    let mut reader = csv::Reader::from_path(path.join(FILE))?;

    let mut weights = Vec::new();
    for result in reader.records() {
        let record = result?;
        let component = record.get(0).unwrap_or_default().trim().to_string();
        let weight: f64 = record
            .get(1)
            .unwrap_or_default()
            .trim()
            .parse()
            .map_err(|e| table_error(FILE, format!("component '{}': {}", component, e)))?;
        if weight < 0.0 {
            return Err(table_error(FILE, format!("negative weight for '{}'", component)));
        }
        weights.push((component, weight));
    }

    Ok(weights)
}

/// All raw tables loaded from an assumptions directory
pub struct LoadedAssumptions {
    pub cmhc_bands: Vec<CmhcBand>,
    pub land_transfer_brackets: HashMap<String, Vec<Bracket>>,
    pub stress_test_rules: Vec<(String, f64)>,
    pub expense_benchmarks: Vec<BenchmarkRow>,
    pub scoring_weights: Vec<(String, f64)>,
}

impl LoadedAssumptions {
    /// Load all assumptions from the default path
    pub fn load_default() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_ASSUMPTIONS_PATH))
    }

    /// Load all assumptions from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        log::debug!("loading assumptions from {}", path.display());
        Ok(Self {
            cmhc_bands: load_cmhc_premiums(path)?,
            land_transfer_brackets: load_land_transfer_brackets(path)?,
            stress_test_rules: load_stress_test_rules(path)?,
            expense_benchmarks: load_expense_benchmarks(path)?,
            scoring_weights: load_scoring_weights(path)?,
        })
    }
}
