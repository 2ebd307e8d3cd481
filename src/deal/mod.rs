//! Rental deal inputs, the analysis pipeline and the deal score

mod analyzer;
mod input;
mod score;
pub mod loader;

pub use analyzer::{
    analyze_deal, AcquisitionCosts, CashFlow, DealAnalysis, DealAnalyzer, Financing, OperatingExpenses, Ratios,
    Revenue,
};
pub(crate) use analyzer::borrower_stress_input;
pub use input::{BorrowerProfile, DealInput, PropertyType, MAX_HOLD_YEARS};
pub use score::{score_deal, DealScore, Grade};
