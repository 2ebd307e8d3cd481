//! Operating expense benchmarks by property type, as shares of effective gross income

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::deal::PropertyType;
use crate::error::AnalysisError;

/// Operating expense line items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseLine {
    PropertyTax,
    Insurance,
    Utilities,
    CondoFees,
    Maintenance,
    Management,
    CapexReserve,
    Other,
}

impl ExpenseLine {
    pub const ALL: [ExpenseLine; 8] = [
        ExpenseLine::PropertyTax,
        ExpenseLine::Insurance,
        ExpenseLine::Utilities,
        ExpenseLine::CondoFees,
        ExpenseLine::Maintenance,
        ExpenseLine::Management,
        ExpenseLine::CapexReserve,
        ExpenseLine::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseLine::PropertyTax => "property_tax",
            ExpenseLine::Insurance => "insurance",
            ExpenseLine::Utilities => "utilities",
            ExpenseLine::CondoFees => "condo_fees",
            ExpenseLine::Maintenance => "maintenance",
            ExpenseLine::Management => "management",
            ExpenseLine::CapexReserve => "capex_reserve",
            ExpenseLine::Other => "other",
        }
    }
}

impl fmt::Display for ExpenseLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpenseLine {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExpenseLine::ALL
            .iter()
            .find(|line| line.as_str() == s.trim())
            .copied()
            .ok_or_else(|| AnalysisError::invalid("expense_line", format!("unknown line '{}'", s)))
    }
}

/// Typical range (inclusive) of a ratio
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRange {
    pub low: f64,
    pub high: f64,
}

impl BenchmarkRange {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low - 1e-9 && value <= self.high + 1e-9
    }

    pub fn midpoint(&self) -> f64 {
        (self.low + self.high) / 2.0
    }
}

/// Benchmarks for one property type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyBenchmarks {
    /// Total operating expense ratio
    pub total: BenchmarkRange,
    /// Per-line ratios
    pub lines: HashMap<ExpenseLine, BenchmarkRange>,
}

impl PropertyBenchmarks {
    fn standard(total: BenchmarkRange, condo_fees: BenchmarkRange) -> Self {
        let mut lines = HashMap::new();
        lines.insert(ExpenseLine::PropertyTax, BenchmarkRange::new(0.08, 0.15));
        lines.insert(ExpenseLine::Insurance, BenchmarkRange::new(0.02, 0.05));
        lines.insert(ExpenseLine::Utilities, BenchmarkRange::new(0.0, 0.10));
        lines.insert(ExpenseLine::CondoFees, condo_fees);
        lines.insert(ExpenseLine::Maintenance, BenchmarkRange::new(0.05, 0.10));
        lines.insert(ExpenseLine::Management, BenchmarkRange::new(0.04, 0.10));
        lines.insert(ExpenseLine::CapexReserve, BenchmarkRange::new(0.03, 0.08));
        lines.insert(ExpenseLine::Other, BenchmarkRange::new(0.0, 0.05));
        Self { total, lines }
    }

    pub fn line(&self, line: ExpenseLine) -> Option<BenchmarkRange> {
        self.lines.get(&line).copied()
    }
}

/// Expense benchmarks for every property type
#[derive(Debug, Clone)]
pub struct ExpenseBenchmarks {
    by_type: HashMap<PropertyType, PropertyBenchmarks>,
}

impl Default for ExpenseBenchmarks {
    fn default() -> Self {
        let by_type = PropertyType::ALL
            .iter()
            .map(|&t| (t, Self::builtin(t)))
            .collect();
        Self { by_type }
    }
}

impl ExpenseBenchmarks {
    fn builtin(property_type: PropertyType) -> PropertyBenchmarks {
        let no_condo = BenchmarkRange::new(0.0, 0.0);
        match property_type {
            PropertyType::SingleFamily => PropertyBenchmarks::standard(BenchmarkRange::new(0.30, 0.40), no_condo),
            PropertyType::Condo => {
                PropertyBenchmarks::standard(BenchmarkRange::new(0.35, 0.50), BenchmarkRange::new(0.0, 0.30))
            }
            PropertyType::SmallMultiplex => PropertyBenchmarks::standard(BenchmarkRange::new(0.35, 0.45), no_condo),
            PropertyType::Multifamily => PropertyBenchmarks::standard(BenchmarkRange::new(0.40, 0.50), no_condo),
        }
    }

    /// Benchmarks for a property type
    pub fn for_type(&self, property_type: PropertyType) -> PropertyBenchmarks {
        self.by_type
            .get(&property_type)
            .cloned()
            .unwrap_or_else(|| Self::builtin(property_type))
    }

    /// Replace a single range; `line == None` sets the total ratio range
    pub fn set(&mut self, property_type: PropertyType, line: Option<ExpenseLine>, range: BenchmarkRange) {
        let entry = self
            .by_type
            .entry(property_type)
            .or_insert_with(|| Self::builtin(property_type));
        match line {
            Some(line) => {
                entry.lines.insert(line, range);
            }
            None => entry.total = range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_benchmarks() {
        let benchmarks = ExpenseBenchmarks::default();

        let condo = benchmarks.for_type(PropertyType::Condo);
        assert_eq!(condo.total, BenchmarkRange::new(0.35, 0.50));
        assert_eq!(condo.line(ExpenseLine::CondoFees).unwrap().high, 0.30);

        let sfh = benchmarks.for_type(PropertyType::SingleFamily);
        assert_eq!(sfh.line(ExpenseLine::CondoFees).unwrap().high, 0.0);
    }

    #[test]
    fn test_override_total() {
        let mut benchmarks = ExpenseBenchmarks::default();
        benchmarks.set(PropertyType::Multifamily, None, BenchmarkRange::new(0.38, 0.48));
        assert_eq!(benchmarks.for_type(PropertyType::Multifamily).total.low, 0.38);
    }

    #[test]
    fn test_parse_expense_line() {
        assert_eq!("capex_reserve".parse::<ExpenseLine>().unwrap(), ExpenseLine::CapexReserve);
        assert!("roof".parse::<ExpenseLine>().is_err());
    }
}
