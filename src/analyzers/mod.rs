//! Specialized calculators built on the deal analysis

pub mod acre;
pub mod adu;
pub mod airbnb;
pub mod expense_ratio;
pub mod financing;
pub mod risk;

pub use acre::{score_market, AcreInput, AcreScore, MarketTier};
pub use adu::{estimate_adu, AduEstimate, AduFinancing, AduInput, AduType};
pub use airbnb::{compare_rental_strategies, LtrInput, RentalComparison, RentalComparisonInput, RentalStrategy, StrInput};
pub use expense_ratio::{benchmark_expenses, BenchmarkStatus, ExpenseReport};
pub use financing::{optimize_financing, FinancingOutcome, FinancingReport, FinancingStrategy, Objective};
pub use risk::{assess_risk, RiskInput, RiskLevel, RiskReport};
