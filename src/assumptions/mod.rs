//! Rate and constant tables: CMHC premiums, land transfer tax, stress test rules,
//! expense benchmarks and scoring weights

mod benchmarks;
mod cmhc;
mod land_transfer;
mod scoring;
mod stress;
pub mod loader;

pub use benchmarks::{BenchmarkRange, ExpenseBenchmarks, ExpenseLine, PropertyBenchmarks};
pub use cmhc::{CmhcBand, CmhcPremiumTable, DownPaymentSource};
pub use land_transfer::{Bracket, LandTransferTables};
pub use loader::LoadedAssumptions;
pub use scoring::{GradeThresholds, ScoringWeights};
pub use stress::StressTestRules;

use std::path::Path;

use crate::error::Result;

/// Container for all analysis assumptions
#[derive(Debug, Clone)]
pub struct Assumptions {
    pub cmhc: CmhcPremiumTable,
    pub land_transfer: LandTransferTables,
    pub stress_test: StressTestRules,
    pub expense_benchmarks: ExpenseBenchmarks,
    pub scoring: ScoringWeights,
    pub grades: GradeThresholds,
}

impl Assumptions {
    /// Built-in Canadian tables
    pub fn default_canada() -> Self {
        Self {
            cmhc: CmhcPremiumTable::current(),
            land_transfer: LandTransferTables::current(),
            stress_test: StressTestRules::default(),
            expense_benchmarks: ExpenseBenchmarks::default(),
            scoring: ScoringWeights::default(),
            grades: GradeThresholds::default(),
        }
    }

    /// Load assumptions from CSV files in the default location (data/assumptions/)
    pub fn from_csv() -> Result<Self> {
        Self::from_csv_path(Path::new(loader::DEFAULT_ASSUMPTIONS_PATH))
    }

    /// Load assumptions from CSV files in a specific directory
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let loaded = LoadedAssumptions::load_from(path)?;
        Ok(Self::from_loaded(loaded))
    }

    /// Apply loaded tables on top of the built-in defaults
    pub fn from_loaded(loaded: LoadedAssumptions) -> Self {
        let mut assumptions = Self::default_canada();

        assumptions.cmhc = CmhcPremiumTable::with_bands(loaded.cmhc_bands);

        if !loaded.land_transfer_brackets.is_empty() {
            assumptions.land_transfer = LandTransferTables::with_schedules(loaded.land_transfer_brackets);
        }

        assumptions.stress_test.apply_overrides(&loaded.stress_test_rules);

        for row in loaded.expense_benchmarks {
            assumptions.expense_benchmarks.set(row.property_type, row.line, row.range);
        }

        for (component, weight) in &loaded.scoring_weights {
            if !assumptions.scoring.set(component, *weight) {
                log::warn!("ignoring unknown scoring component '{}'", component);
            }
        }

        assumptions
    }
}

impl Default for Assumptions {
    fn default() -> Self {
        Self::default_canada()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deal::PropertyType;
    use crate::jurisdiction::Province;

    #[test]
    fn test_csv_matches_builtin_tables() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join(loader::DEFAULT_ASSUMPTIONS_PATH);
        let loaded = Assumptions::from_csv_path(&dir).expect("bundled assumptions load");
        let builtin = Assumptions::default_canada();

        assert_eq!(loaded.cmhc.bands(), builtin.cmhc.bands());
        assert_eq!(
            loaded.land_transfer.provincial(Province::Ontario),
            builtin.land_transfer.provincial(Province::Ontario)
        );
        assert_eq!(
            loaded.land_transfer.provincial(Province::BritishColumbia),
            builtin.land_transfer.provincial(Province::BritishColumbia)
        );
        assert_eq!(loaded.stress_test, builtin.stress_test);
        assert_eq!(loaded.scoring, builtin.scoring);
        assert_eq!(
            loaded.expense_benchmarks.for_type(PropertyType::Condo).total,
            builtin.expense_benchmarks.for_type(PropertyType::Condo).total
        );
    }
}
