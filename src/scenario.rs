//! Scenario runner for batch analysis and side-by-side deal comparison
//!
//! Loads assumptions once, then analyzes any number of deals against them
//! without re-reading CSV files.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::assumptions::Assumptions;
use crate::deal::{DealAnalysis, DealAnalyzer, DealInput, Grade};
use crate::error::{AnalysisError, Result};

/// Pre-loaded scenario runner
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::from_csv()?;
/// let deals = load_deals("demos/portfolio.csv")?;
/// let report = runner.compare(&deals)?;
/// println!("best score: {:?}", report.best_score);
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    assumptions: Assumptions,
}

/// One deal's headline metrics in a comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonEntry {
    pub name: String,
    pub score: f64,
    pub grade: Grade,
    pub cap_rate: f64,
    pub cash_on_cash: Option<f64>,
    pub dscr: Option<f64>,
    pub monthly_cash_flow: f64,
    pub total_cash_required: f64,
    pub irr: Option<f64>,
}

impl From<&DealAnalysis> for ComparisonEntry {
    fn from(analysis: &DealAnalysis) -> Self {
        Self {
            name: analysis.name.clone(),
            score: analysis.score.total,
            grade: analysis.score.grade,
            cap_rate: analysis.ratios.cap_rate,
            cash_on_cash: analysis.ratios.cash_on_cash,
            dscr: analysis.ratios.dscr,
            monthly_cash_flow: analysis.cash_flow.monthly_cash_flow,
            total_cash_required: analysis.acquisition.total_cash_required,
            irr: analysis.projection.irr,
        }
    }
}

/// A deal that could not be analyzed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonFailure {
    pub name: String,
    pub error: String,
}

/// Deals ranked by score with the leader on each headline metric
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub generated_at: DateTime<Utc>,
    /// Highest score first
    pub entries: Vec<ComparisonEntry>,
    pub failures: Vec<ComparisonFailure>,
    pub best_cap_rate: Option<String>,
    pub best_cash_on_cash: Option<String>,
    pub best_cash_flow: Option<String>,
    pub best_score: Option<String>,
}

impl ScenarioRunner {
    /// Runner with the built-in Canadian tables
    pub fn new() -> Self {
        Self {
            assumptions: Assumptions::default_canada(),
        }
    }

    /// Load assumptions from data/assumptions
    pub fn from_csv() -> Result<Self> {
        Ok(Self {
            assumptions: Assumptions::from_csv()?,
        })
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        Ok(Self {
            assumptions: Assumptions::from_csv_path(path)?,
        })
    }

    pub fn with_assumptions(assumptions: Assumptions) -> Self {
        Self { assumptions }
    }

    pub fn analyze(&self, deal: &DealInput) -> Result<DealAnalysis> {
        DealAnalyzer::new(&self.assumptions).analyze(deal)
    }

    /// Analyze deals in parallel; results keep the input order
    pub fn analyze_batch(&self, deals: &[DealInput]) -> Vec<Result<DealAnalysis>> {
        let analyzer = DealAnalyzer::new(&self.assumptions);
        deals.par_iter().map(|deal| analyzer.analyze(deal)).collect()
    }

    /// Analyze and rank deals side by side
    pub fn compare(&self, deals: &[DealInput]) -> Result<ComparisonReport> {
        if deals.is_empty() {
            return Err(AnalysisError::invalid("deals", "nothing to compare"));
        }

        let mut entries = Vec::new();
        let mut failures = Vec::new();
        for (deal, result) in deals.iter().zip(self.analyze_batch(deals)) {
            match result {
                Ok(analysis) => entries.push(ComparisonEntry::from(&analysis)),
                Err(e) => {
                    log::warn!("skipping '{}': {}", deal.name, e);
                    failures.push(ComparisonFailure {
                        name: deal.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        entries.sort_by(|a, b| b.score.total_cmp(&a.score));

        let leader = |metric: fn(&ComparisonEntry) -> f64| {
            entries
                .iter()
                .max_by(|a, b| metric(a).total_cmp(&metric(b)))
                .map(|e| e.name.clone())
        };
        // No cash left in the deal counts as the best possible return
        let best_cash_on_cash = leader(|e| e.cash_on_cash.unwrap_or(f64::INFINITY));
        let best_cap_rate = leader(|e| e.cap_rate);
        let best_cash_flow = leader(|e| e.monthly_cash_flow);
        let best_score = entries.first().map(|e| e.name.clone());

        Ok(ComparisonReport {
            generated_at: Utc::now(),
            entries,
            failures,
            best_cap_rate,
            best_cash_on_cash,
            best_cash_flow,
            best_score,
        })
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.assumptions
    }

    /// Mutable access for what-if overrides
    pub fn assumptions_mut(&mut self) -> &mut Assumptions {
        &mut self.assumptions
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jurisdiction::Province;

    fn deals() -> Vec<DealInput> {
        let mut strong = DealInput::new("strong", 400_000.0, 3_600.0, 0.05, Province::NewBrunswick);
        strong.annual_property_tax = 4_000.0;
        strong.annual_insurance = 1_200.0;
        let mut weak = DealInput::new("weak", 900_000.0, 3_200.0, 0.05, Province::BritishColumbia);
        weak.annual_property_tax = 3_500.0;
        let mut broken = DealInput::new("broken", 500_000.0, 2_000.0, 0.05, Province::Ontario);
        broken.units = 0;
        vec![weak, strong, broken]
    }

    #[test]
    fn test_batch_keeps_order() {
        let runner = ScenarioRunner::new();
        let results = runner.analyze_batch(&deals());
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().name, "weak");
        assert_eq!(results[1].as_ref().unwrap().name, "strong");
        assert!(results[2].is_err());
    }

    #[test]
    fn test_compare_ranks_by_score() {
        let runner = ScenarioRunner::new();
        let report = runner.compare(&deals()).unwrap();

        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "broken");
        assert_eq!(report.entries[0].name, "strong");
        assert_eq!(report.best_score.as_deref(), Some("strong"));
        assert_eq!(report.best_cap_rate.as_deref(), Some("strong"));
        assert_eq!(report.best_cash_flow.as_deref(), Some("strong"));
    }

    #[test]
    fn test_compare_empty() {
        assert!(ScenarioRunner::new().compare(&[]).is_err());
    }

    #[test]
    fn test_csv_assumptions_match_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/assumptions");
        let from_csv = ScenarioRunner::from_csv_path(&path).unwrap();
        let builtin = ScenarioRunner::new();

        let deal = &deals()[1];
        let a = from_csv.analyze(deal).unwrap();
        let b = builtin.analyze(deal).unwrap();
        assert!((a.score.total - b.score.total).abs() < 1e-9);
        assert!((a.acquisition.total_cash_required - b.acquisition.total_cash_required).abs() < 1e-6);
    }
}
