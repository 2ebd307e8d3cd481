//! Amortized mortgage payments with Canadian compounding conventions
//!
//! Canadian fixed-rate mortgages quote an annual rate compounded
//! semi-annually (Interest Act). The periodic rate for n payments per year is
//! `(1 + r/2)^(2/n) - 1`; variable-rate products compound monthly.
//! The level payment is the standard annuity formula
//! `P * i / (1 - (1 + i)^-N)`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ensure_non_negative, AnalysisError, Result};

/// Longest amortization accepted (years)
pub const MAX_AMORTIZATION_YEARS: u32 = 40;

/// How often payments are made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFrequency {
    #[default]
    Monthly,
    SemiMonthly,
    BiWeekly,
    /// Half the monthly payment every two weeks (one extra monthly payment a year)
    AcceleratedBiWeekly,
    Weekly,
    /// A quarter of the monthly payment every week
    AcceleratedWeekly,
}

impl PaymentFrequency {
    pub fn periods_per_year(&self) -> u32 {
        match self {
            PaymentFrequency::Monthly => 12,
            PaymentFrequency::SemiMonthly => 24,
            PaymentFrequency::BiWeekly | PaymentFrequency::AcceleratedBiWeekly => 26,
            PaymentFrequency::Weekly | PaymentFrequency::AcceleratedWeekly => 52,
        }
    }

    pub fn is_accelerated(&self) -> bool {
        matches!(
            self,
            PaymentFrequency::AcceleratedBiWeekly | PaymentFrequency::AcceleratedWeekly
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentFrequency::Monthly => "monthly",
            PaymentFrequency::SemiMonthly => "semi_monthly",
            PaymentFrequency::BiWeekly => "bi_weekly",
            PaymentFrequency::AcceleratedBiWeekly => "accelerated_bi_weekly",
            PaymentFrequency::Weekly => "weekly",
            PaymentFrequency::AcceleratedWeekly => "accelerated_weekly",
        }
    }
}

impl fmt::Display for PaymentFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentFrequency {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "monthly" => Ok(PaymentFrequency::Monthly),
            "semi_monthly" => Ok(PaymentFrequency::SemiMonthly),
            "bi_weekly" | "biweekly" => Ok(PaymentFrequency::BiWeekly),
            "accelerated_bi_weekly" | "accelerated_biweekly" => Ok(PaymentFrequency::AcceleratedBiWeekly),
            "weekly" => Ok(PaymentFrequency::Weekly),
            "accelerated_weekly" => Ok(PaymentFrequency::AcceleratedWeekly),
            other => Err(AnalysisError::invalid(
                "payment_frequency",
                format!("unknown frequency '{}'", other),
            )),
        }
    }
}

/// Interest compounding convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compounding {
    /// Fixed-rate mortgages (Interest Act)
    #[default]
    SemiAnnual,
    /// Variable-rate mortgages
    Monthly,
}

impl FromStr for Compounding {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "semi_annual" | "semiannual" | "fixed" => Ok(Compounding::SemiAnnual),
            "monthly" | "variable" => Ok(Compounding::Monthly),
            other => Err(AnalysisError::invalid("compounding", format!("unknown compounding '{}'", other))),
        }
    }
}

impl Compounding {
    fn periods_per_year(&self) -> f64 {
        match self {
            Compounding::SemiAnnual => 2.0,
            Compounding::Monthly => 12.0,
        }
    }
}

/// Rate per payment period for a nominal annual rate
pub fn periodic_rate(annual_rate: f64, compounding: Compounding, periods_per_year: u32) -> f64 {
    let m = compounding.periods_per_year();
    (1.0 + annual_rate / m).powf(m / periods_per_year as f64) - 1.0
}

/// Effective annual rate for a nominal annual rate
pub fn effective_annual_rate(annual_rate: f64, compounding: Compounding) -> f64 {
    let m = compounding.periods_per_year();
    (1.0 + annual_rate / m).powf(m) - 1.0
}

/// Level payment that retires `principal` over `periods` at `rate` per period
pub fn level_payment(principal: f64, rate: f64, periods: u32) -> f64 {
    if periods == 0 {
        return principal;
    }
    if rate.abs() < 1e-15 {
        return principal / periods as f64;
    }
    principal * rate / (1.0 - (1.0 + rate).powi(-(periods as i32)))
}

/// Principal that a level payment can retire (inverse of `level_payment`)
pub fn principal_for_payment(payment: f64, rate: f64, periods: u32) -> f64 {
    if periods == 0 {
        return payment;
    }
    if rate.abs() < 1e-15 {
        return payment * periods as f64;
    }
    payment * (1.0 - (1.0 + rate).powi(-(periods as i32))) / rate
}

/// Scale a per-period payment to its monthly equivalent
pub fn monthly_equivalent(payment: f64, frequency: PaymentFrequency) -> f64 {
    payment * frequency.periods_per_year() as f64 / 12.0
}

/// Loan terms needed to compute payments and balances
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MortgageTerms {
    pub principal: f64,
    /// Nominal annual rate, e.g. 0.0489
    pub annual_rate: f64,
    pub amortization_years: u32,
    #[serde(default)]
    pub frequency: PaymentFrequency,
    #[serde(default)]
    pub compounding: Compounding,
}

impl MortgageTerms {
    /// Monthly, semi-annually compounded terms
    pub fn new(principal: f64, annual_rate: f64, amortization_years: u32) -> Self {
        Self {
            principal,
            annual_rate,
            amortization_years,
            frequency: PaymentFrequency::Monthly,
            compounding: Compounding::SemiAnnual,
        }
    }

    pub fn with_frequency(mut self, frequency: PaymentFrequency) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_compounding(mut self, compounding: Compounding) -> Self {
        self.compounding = compounding;
        self
    }

    /// Same loan at a different rate (used for stress and renewal tests)
    pub fn at_rate(mut self, annual_rate: f64) -> Self {
        self.annual_rate = annual_rate;
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure_non_negative("principal", self.principal)?;
        if !self.annual_rate.is_finite() || self.annual_rate < 0.0 || self.annual_rate > 1.0 {
            return Err(AnalysisError::invalid(
                "annual_rate",
                format!("must be between 0 and 1, got {}", self.annual_rate),
            ));
        }
        if self.amortization_years == 0 || self.amortization_years > MAX_AMORTIZATION_YEARS {
            return Err(AnalysisError::invalid(
                "amortization_years",
                format!("must be between 1 and {}, got {}", MAX_AMORTIZATION_YEARS, self.amortization_years),
            ));
        }
        Ok(())
    }

    pub fn periods_per_year(&self) -> u32 {
        self.frequency.periods_per_year()
    }

    /// Scheduled number of payments over the full amortization
    pub fn total_periods(&self) -> u32 {
        self.amortization_years * self.periods_per_year()
    }

    pub fn periodic_rate(&self) -> f64 {
        periodic_rate(self.annual_rate, self.compounding, self.periods_per_year())
    }

    pub fn effective_annual_rate(&self) -> f64 {
        effective_annual_rate(self.annual_rate, self.compounding)
    }

    /// Payment per period
    ///
    /// Accelerated frequencies pay the monthly payment divided by 2 (bi-weekly)
    /// or 4 (weekly), which shortens the actual amortization.
    pub fn payment(&self) -> Result<f64> {
        self.validate()?;
        let payment = match self.frequency {
            PaymentFrequency::AcceleratedBiWeekly => self.monthly_schedule_payment() / 2.0,
            PaymentFrequency::AcceleratedWeekly => self.monthly_schedule_payment() / 4.0,
            _ => level_payment(self.principal, self.periodic_rate(), self.total_periods()),
        };
        Ok(payment)
    }

    /// Monthly equivalent of the periodic payment
    pub fn monthly_payment(&self) -> Result<f64> {
        Ok(monthly_equivalent(self.payment()?, self.frequency))
    }

    /// Total paid per year
    pub fn annual_payment(&self) -> Result<f64> {
        Ok(self.payment()? * self.periods_per_year() as f64)
    }

    fn monthly_schedule_payment(&self) -> f64 {
        let rate = periodic_rate(self.annual_rate, self.compounding, 12);
        level_payment(self.principal, rate, self.amortization_years * 12)
    }
}

/// Payment per period for the given terms
pub fn payment(
    principal: f64,
    annual_rate: f64,
    amortization_years: u32,
    frequency: PaymentFrequency,
    compounding: Compounding,
) -> Result<f64> {
    MortgageTerms {
        principal,
        annual_rate,
        amortization_years,
        frequency,
        compounding,
    }
    .payment()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_semi_annual_periodic_rate() {
        // 6% compounded semi-annually: (1.03)^(1/6) - 1
        let rate = periodic_rate(0.06, Compounding::SemiAnnual, 12);
        assert_relative_eq!(rate, 0.004938622, epsilon = 1e-9);

        let eff = effective_annual_rate(0.06, Compounding::SemiAnnual);
        assert_relative_eq!(eff, 0.0609, epsilon = 1e-12);
    }

    #[test]
    fn test_monthly_payment_canadian_convention() {
        // $400,000 at 5% over 25 years, semi-annual compounding
        let terms = MortgageTerms::new(400_000.0, 0.05, 25);
        let pmt = terms.payment().unwrap();
        assert!((pmt - 2326.42).abs() < 0.05, "payment was {}", pmt);

        // Monthly compounding produces a slightly higher payment
        let variable = terms.with_compounding(Compounding::Monthly).payment().unwrap();
        assert!((variable - 2338.36).abs() < 0.05, "payment was {}", variable);
        assert!(variable > pmt);
    }

    #[test]
    fn test_zero_rate_payment() {
        let terms = MortgageTerms::new(120_000.0, 0.0, 10);
        assert_relative_eq!(terms.payment().unwrap(), 1_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_accelerated_bi_weekly() {
        let monthly = MortgageTerms::new(300_000.0, 0.045, 25);
        let accel = monthly.with_frequency(PaymentFrequency::AcceleratedBiWeekly);

        let m = monthly.payment().unwrap();
        let a = accel.payment().unwrap();
        assert_relative_eq!(a, m / 2.0, epsilon = 1e-9);

        // 26 half payments = 13 monthly payments per year
        assert_relative_eq!(accel.annual_payment().unwrap(), m * 13.0, epsilon = 1e-6);

        // Regular bi-weekly has the same annual cost as monthly, give or take compounding
        let bi = monthly.with_frequency(PaymentFrequency::BiWeekly);
        assert!((bi.annual_payment().unwrap() - m * 12.0).abs() / (m * 12.0) < 0.005);
    }

    #[test]
    fn test_inverse_payment() {
        let rate = periodic_rate(0.05, Compounding::SemiAnnual, 12);
        let pmt = level_payment(250_000.0, rate, 300);
        assert_relative_eq!(principal_for_payment(pmt, rate, 300), 250_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_validation() {
        assert!(MortgageTerms::new(-1.0, 0.05, 25).payment().is_err());
        assert!(MortgageTerms::new(100_000.0, 0.05, 0).payment().is_err());
        assert!(MortgageTerms::new(100_000.0, 0.05, 41).payment().is_err());
        assert!(MortgageTerms::new(100_000.0, -0.01, 25).payment().is_err());
    }

    #[test]
    fn test_parse_frequency() {
        assert_eq!("accelerated-biweekly".parse::<PaymentFrequency>().unwrap(), PaymentFrequency::AcceleratedBiWeekly);
        assert_eq!("Monthly".parse::<PaymentFrequency>().unwrap(), PaymentFrequency::Monthly);
        assert!("daily".parse::<PaymentFrequency>().is_err());
    }
}
