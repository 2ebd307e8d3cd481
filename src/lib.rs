//! Canadian Realty - investment analysis for Canadian residential real estate
//!
//! This library provides:
//! - Mortgage payments with semi-annual compounding, amortization schedules
//!   and the OSFI stress test
//! - CMHC default insurance premiums and minimum down payments
//! - Provincial and municipal land transfer tax with first-time buyer rebates
//! - Rental deal analysis, scoring and hold-period projections with IRR
//! - Market (ACRE), ADU, short-term rental, risk, expense and financing analyzers
//! - Parallel batch analysis and deal comparison

pub mod analyzers;
pub mod assumptions;
pub mod deal;
pub mod error;
pub mod jurisdiction;
pub mod mortgage;
pub mod projection;
pub mod scenario;
pub mod scoring;
pub mod tax;

// Re-export commonly used types
pub use assumptions::Assumptions;
pub use deal::{analyze_deal, DealAnalysis, DealAnalyzer, DealInput, DealScore, Grade, PropertyType};
pub use error::{AnalysisError, Result};
pub use jurisdiction::{Municipality, Province};
pub use mortgage::{AmortizationSchedule, MortgageTerms, PaymentFrequency};
pub use projection::{HoldProjection, ProjectionEngine};
pub use scenario::{ComparisonReport, ScenarioRunner};
