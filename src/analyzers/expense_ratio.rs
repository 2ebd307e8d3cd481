//! Operating expense ratio benchmarking against typical ranges by property type

use serde::{Deserialize, Serialize};

use crate::assumptions::{BenchmarkRange, ExpenseBenchmarks, ExpenseLine};
use crate::deal::{OperatingExpenses, PropertyType};
use crate::error::{AnalysisError, Result};

/// Share of income the "50% rule" sets aside for operating expenses
const FIFTY_PERCENT_RULE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BenchmarkStatus {
    Below,
    Within,
    Above,
}

impl BenchmarkStatus {
    fn classify(ratio: f64, range: BenchmarkRange) -> Self {
        if ratio < range.low {
            BenchmarkStatus::Below
        } else if ratio > range.high {
            BenchmarkStatus::Above
        } else {
            BenchmarkStatus::Within
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineComparison {
    pub line: ExpenseLine,
    pub amount: f64,
    /// Share of effective gross income
    pub ratio: f64,
    pub benchmark: BenchmarkRange,
    pub status: BenchmarkStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseReport {
    pub property_type: PropertyType,
    pub effective_gross_income: f64,
    pub total_expenses: f64,
    pub total_ratio: f64,
    pub total_benchmark: BenchmarkRange,
    pub total_status: BenchmarkStatus,
    pub lines: Vec<LineComparison>,
    /// Expenses the 50% rule would predict
    pub fifty_percent_estimate: f64,
    /// Actual expenses less the 50% rule estimate
    pub fifty_percent_variance: f64,
    pub notes: Vec<String>,
}

/// Compare operating expenses with benchmarks for the property type
pub fn benchmark_expenses(
    expenses: &OperatingExpenses,
    effective_gross_income: f64,
    property_type: PropertyType,
    benchmarks: &ExpenseBenchmarks,
) -> Result<ExpenseReport> {
    if !effective_gross_income.is_finite() || effective_gross_income <= 0.0 {
        return Err(AnalysisError::invalid("effective_gross_income", "must be positive"));
    }

    let table = benchmarks.for_type(property_type);
    let mut notes = Vec::new();

    let lines: Vec<LineComparison> = ExpenseLine::ALL
        .iter()
        .filter_map(|&line| {
            let benchmark = table.line(line)?;
            let amount = expenses.line(line);
            let ratio = amount / effective_gross_income;
            Some(LineComparison {
                line,
                amount,
                ratio,
                benchmark,
                status: BenchmarkStatus::classify(ratio, benchmark),
            })
        })
        .collect();

    let total_ratio = expenses.total / effective_gross_income;
    let total_status = BenchmarkStatus::classify(total_ratio, table.total);
    let fifty_percent_estimate = effective_gross_income * FIFTY_PERCENT_RULE;

    if expenses.management == 0.0 {
        notes.push("no management fee: assumes the owner self-manages".to_string());
    }
    for comparison in &lines {
        match comparison.status {
            BenchmarkStatus::Above => notes.push(format!(
                "{} at {:.1}% of income is above the typical {:.1}-{:.1}%",
                comparison.line,
                comparison.ratio * 100.0,
                comparison.benchmark.low * 100.0,
                comparison.benchmark.high * 100.0
            )),
            BenchmarkStatus::Below if comparison.line != ExpenseLine::Management => notes.push(format!(
                "{} at {:.1}% of income is below the typical {:.1}-{:.1}%",
                comparison.line,
                comparison.ratio * 100.0,
                comparison.benchmark.low * 100.0,
                comparison.benchmark.high * 100.0
            )),
            _ => {}
        }
    }

    Ok(ExpenseReport {
        property_type,
        effective_gross_income,
        total_expenses: expenses.total,
        total_ratio,
        total_benchmark: table.total,
        total_status,
        lines,
        fifty_percent_estimate,
        fifty_percent_variance: expenses.total - fifty_percent_estimate,
        notes,
    })
}
