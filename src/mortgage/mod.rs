//! Mortgage math: payments, amortization, stress test qualification and CMHC insurance

mod amortization;
mod payment;
pub mod cmhc;

pub use amortization::{balance_after, paid_over, AmortizationRow, AmortizationSchedule, YearSummary};
pub use cmhc::{minimum_down_payment, CmhcRequest, CmhcResult};
pub use payment::{
    effective_annual_rate, level_payment, monthly_equivalent, payment, periodic_rate, principal_for_payment,
    Compounding, MortgageTerms, PaymentFrequency, MAX_AMORTIZATION_YEARS,
};
pub use stress_test::{qualifying_rate, StressTestInput, StressTestResult};
