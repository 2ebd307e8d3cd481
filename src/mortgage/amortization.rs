//! Amortization schedules and outstanding balances

use serde::{Deserialize, Serialize};

use super::payment::MortgageTerms;
use crate::error::Result;

/// A single payment in the schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub period: u32,
    /// Loan year the payment falls in (1-indexed)
    pub year: u32,
    pub payment: f64,
    pub interest: f64,
    pub principal: f64,
    pub balance: f64,
}

/// Interest and principal totals for one loan year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearSummary {
    pub year: u32,
    pub payments: f64,
    pub interest: f64,
    pub principal: f64,
    pub ending_balance: f64,
}

/// Full payment-by-payment schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub terms: MortgageTerms,
    pub rows: Vec<AmortizationRow>,
}

impl AmortizationSchedule {
    /// Build the schedule; the last payment is trimmed so the balance lands on zero
    pub fn build(terms: &MortgageTerms) -> Result<Self> {
        let payment = terms.payment()?;
        let rate = terms.periodic_rate();
        let periods_per_year = terms.periods_per_year();

        let mut rows = Vec::with_capacity(terms.total_periods() as usize);
        let mut balance = terms.principal;

        for period in 1..=terms.total_periods() {
            if balance <= 0.005 {
                break;
            }

            let interest = balance * rate;
            let mut principal = (payment - interest).min(balance);
            if period == terms.total_periods() {
                // Clear floating-point residue on the final scheduled payment
                principal = balance;
            }
            balance -= principal;

            rows.push(AmortizationRow {
                period,
                year: (period - 1) / periods_per_year + 1,
                payment: interest + principal,
                interest,
                principal,
                balance: if balance.abs() < 0.005 { 0.0 } else { balance },
            });
        }

        Ok(Self { terms: *terms, rows })
    }

    pub fn total_interest(&self) -> f64 {
        self.rows.iter().map(|r| r.interest).sum()
    }

    pub fn total_paid(&self) -> f64 {
        self.rows.iter().map(|r| r.payment).sum()
    }

    /// Number of payments until the loan is retired
    pub fn payoff_periods(&self) -> u32 {
        self.rows.len() as u32
    }

    /// Years (fractional) until the loan is retired
    pub fn payoff_years(&self) -> f64 {
        self.payoff_periods() as f64 / self.terms.periods_per_year() as f64
    }

    /// Balance after a given number of payments
    pub fn balance_at(&self, period: u32) -> f64 {
        if period == 0 {
            return self.terms.principal;
        }
        self.rows
            .get(period as usize - 1)
            .map(|r| r.balance)
            .unwrap_or(0.0)
    }

    /// Roll payments up by loan year
    pub fn yearly_totals(&self) -> Vec<YearSummary> {
        let mut years: Vec<YearSummary> = Vec::new();
        for row in &self.rows {
            match years.last_mut() {
                Some(summary) if summary.year == row.year => {
                    summary.payments += row.payment;
                    summary.interest += row.interest;
                    summary.principal += row.principal;
                    summary.ending_balance = row.balance;
                }
                _ => years.push(YearSummary {
                    year: row.year,
                    payments: row.payment,
                    interest: row.interest,
                    principal: row.principal,
                    ending_balance: row.balance,
                }),
            }
        }
        years
    }
}

/// Outstanding balance after `periods` payments (closed form)
///
/// `B_k = P(1+i)^k - pmt * ((1+i)^k - 1) / i`, floored at zero
pub fn balance_after(terms: &MortgageTerms, periods: u32) -> Result<f64> {
    let payment = terms.payment()?;
    let rate = terms.periodic_rate();

    let balance = if rate.abs() < 1e-15 {
        terms.principal - payment * periods as f64
    } else {
        let growth = (1.0 + rate).powi(periods as i32);
        terms.principal * growth - payment * (growth - 1.0) / rate
    };

    Ok(balance.max(0.0))
}

/// Principal and interest paid over the first `periods` payments
pub fn paid_over(terms: &MortgageTerms, periods: u32) -> Result<(f64, f64)> {
    let payment = terms.payment()?;
    let ending = balance_after(terms, periods)?;
    let principal = terms.principal - ending;
    let total = if ending <= 0.0 {
        // Loan retired early; count only what was owed
        principal + interest_until_payoff(terms, periods)?
    } else {
        payment * periods as f64
    };
    Ok((principal, (total - principal).max(0.0)))
}

fn interest_until_payoff(terms: &MortgageTerms, periods: u32) -> Result<f64> {
    let schedule = AmortizationSchedule::build(terms)?;
    Ok(schedule
        .rows
        .iter()
        .take(periods as usize)
        .map(|r| r.interest)
        .sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mortgage::payment::PaymentFrequency;
    use approx::assert_relative_eq;

    #[test]
    fn test_schedule_retires_loan() {
        let terms = MortgageTerms::new(400_000.0, 0.05, 25);
        let schedule = AmortizationSchedule::build(&terms).unwrap();

        assert_eq!(schedule.payoff_periods(), 300);
        assert_eq!(schedule.rows.last().unwrap().balance, 0.0);

        let principal: f64 = schedule.rows.iter().map(|r| r.principal).sum();
        assert_relative_eq!(principal, 400_000.0, epsilon = 1e-6);
        assert_relative_eq!(schedule.total_paid() - schedule.total_interest(), 400_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_closed_form_matches_schedule() {
        let terms = MortgageTerms::new(350_000.0, 0.0425, 30);
        let schedule = AmortizationSchedule::build(&terms).unwrap();

        for k in [1, 12, 60, 180] {
            let closed = balance_after(&terms, k).unwrap();
            assert!((closed - schedule.balance_at(k)).abs() < 1e-4, "period {}", k);
        }
        assert_eq!(balance_after(&terms, 360).unwrap().round(), 0.0);
    }

    #[test]
    fn test_accelerated_pays_off_early() {
        let terms = MortgageTerms::new(400_000.0, 0.05, 25).with_frequency(PaymentFrequency::AcceleratedBiWeekly);
        let schedule = AmortizationSchedule::build(&terms).unwrap();

        assert!(schedule.payoff_years() < 22.5, "payoff after {} years", schedule.payoff_years());
        assert_eq!(schedule.rows.last().unwrap().balance, 0.0);

        let monthly = AmortizationSchedule::build(&MortgageTerms::new(400_000.0, 0.05, 25)).unwrap();
        assert!(schedule.total_interest() < monthly.total_interest());
    }

    #[test]
    fn test_yearly_totals() {
        let terms = MortgageTerms::new(200_000.0, 0.05, 20);
        let schedule = AmortizationSchedule::build(&terms).unwrap();
        let years = schedule.yearly_totals();

        assert_eq!(years.len(), 20);
        assert!(years[0].interest > years[0].principal);
        assert!(years[19].principal > years[19].interest);
        assert_relative_eq!(years[0].ending_balance, schedule.balance_at(12), epsilon = 1e-9);
    }

    #[test]
    fn test_first_year_paid_over() {
        let terms = MortgageTerms::new(400_000.0, 0.05, 25);
        let (principal, interest) = paid_over(&terms, 12).unwrap();
        let payment = terms.payment().unwrap();

        assert_relative_eq!(principal + interest, payment * 12.0, epsilon = 1e-6);
        assert!(interest > 19_000.0 && interest < 20_000.0, "interest {}", interest);
    }
}
