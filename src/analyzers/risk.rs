//! Deal risk score, risk flags, renewal rate shock and sensitivity scenarios
//!
//! Each factor is mapped onto 0-100 risk (higher is riskier) between a
//! comfortable level and a dangerous one, then combined with fixed weights.

use serde::{Deserialize, Serialize};

use crate::assumptions::Assumptions;
use crate::deal::{DealAnalysis, DealAnalyzer, DealInput};
use crate::error::{ensure_non_negative, Result};
use crate::mortgage::{balance_after, MortgageTerms};
use crate::scoring::{linear_score, weighted_total, ScoreComponent};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskInput {
    #[serde(default)]
    pub property_age_years: f64,
    /// Liquid reserves available after closing
    #[serde(default)]
    pub cash_reserves: f64,
    /// Rate increase assumed at mortgage renewal
    #[serde(default = "default_rate_shock")]
    pub rate_shock: f64,
}

fn default_rate_shock() -> f64 {
    0.02
}

impl Default for RiskInput {
    fn default() -> Self {
        Self {
            property_age_years: 0.0,
            cash_reserves: 0.0,
            rate_shock: default_rate_shock(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Severe,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score < 25.0 {
            RiskLevel::Low
        } else if score < 50.0 {
            RiskLevel::Moderate
        } else if score < 75.0 {
            RiskLevel::High
        } else {
            RiskLevel::Severe
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagSeverity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFlag {
    pub factor: String,
    pub severity: FlagSeverity,
    pub risk: f64,
}

/// Payment change when the mortgage renews at a higher rate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenewalShock {
    pub term_years: u32,
    pub balance_at_renewal: f64,
    pub renewal_rate: f64,
    pub remaining_amortization_years: u32,
    pub current_monthly_payment: f64,
    pub renewal_monthly_payment: f64,
    pub payment_increase: f64,
    /// Year-one NOI over renewal debt service
    pub shocked_dscr: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityScenario {
    pub name: String,
    pub monthly_cash_flow: f64,
    pub dscr: Option<f64>,
    pub cap_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    pub score: f64,
    pub level: RiskLevel,
    pub factors: Vec<ScoreComponent>,
    pub flags: Vec<RiskFlag>,
    pub renewal: Option<RenewalShock>,
    pub reserve_months: Option<f64>,
    pub sensitivity: Vec<SensitivityScenario>,
}

const WARNING_RISK: f64 = 60.0;
const CRITICAL_RISK: f64 = 85.0;

/// Renewal payment at contract rate plus the shock, over the remaining amortization
pub fn renewal_shock(input: &DealInput, analysis: &DealAnalysis, rate_shock: f64) -> Result<Option<RenewalShock>> {
    let terms = &analysis.financing.terms;
    if terms.principal <= 0.0 || input.term_years >= input.amortization_years {
        return Ok(None);
    }

    let balance_at_renewal = balance_after(terms, input.term_years * terms.periods_per_year())?;
    let remaining_amortization_years = input.amortization_years - input.term_years;
    let renewal_rate = input.interest_rate + rate_shock;
    let renewed = MortgageTerms::new(balance_at_renewal, renewal_rate, remaining_amortization_years)
        .with_frequency(terms.frequency)
        .with_compounding(terms.compounding);

    let current_monthly_payment = analysis.financing.monthly_payment;
    let renewal_monthly_payment = renewed.monthly_payment()?;
    let renewal_debt = renewed.annual_payment()?;

    Ok(Some(RenewalShock {
        term_years: input.term_years,
        balance_at_renewal,
        renewal_rate,
        remaining_amortization_years,
        current_monthly_payment,
        renewal_monthly_payment,
        payment_increase: renewal_monthly_payment - current_monthly_payment,
        shocked_dscr: (renewal_debt > 0.0).then(|| analysis.cash_flow.net_operating_income / renewal_debt),
    }))
}

/// Re-run the analysis under adverse assumptions
pub fn sensitivity(input: &DealInput, assumptions: &Assumptions) -> Result<Vec<SensitivityScenario>> {
    let analyzer = DealAnalyzer::new(assumptions);

    let mut scenarios: Vec<(&str, DealInput)> = Vec::new();

    let mut deal = input.clone();
    deal.monthly_rent *= 0.90;
    deal.other_monthly_income *= 0.90;
    scenarios.push(("rent -10%", deal));

    let mut deal = input.clone();
    deal.vacancy_rate = (deal.vacancy_rate + 0.05).min(1.0);
    scenarios.push(("vacancy +5 pts", deal));

    let mut deal = input.clone();
    deal.interest_rate = (deal.interest_rate + 0.01).min(1.0);
    scenarios.push(("rate +1%", deal));

    let mut deal = input.clone();
    deal.interest_rate = (deal.interest_rate + 0.02).min(1.0);
    scenarios.push(("rate +2%", deal));

    let mut deal = input.clone();
    deal.annual_property_tax *= 1.10;
    deal.annual_insurance *= 1.10;
    deal.monthly_utilities *= 1.10;
    deal.monthly_condo_fees *= 1.10;
    deal.other_annual_expenses *= 1.10;
    deal.maintenance_percent = (deal.maintenance_percent * 1.10).min(1.0);
    deal.management_percent = (deal.management_percent * 1.10).min(1.0);
    deal.capex_reserve_percent = (deal.capex_reserve_percent * 1.10).min(1.0);
    scenarios.push(("expenses +10%", deal));

    scenarios
        .into_iter()
        .map(|(name, deal)| {
            let analysis = analyzer.analyze(&deal)?;
            Ok(SensitivityScenario {
                name: name.to_string(),
                monthly_cash_flow: analysis.cash_flow.monthly_cash_flow,
                dscr: analysis.ratios.dscr,
                cap_rate: analysis.ratios.cap_rate,
            })
        })
        .collect()
}

/// Score the risk of an analyzed deal
pub fn assess_risk(
    input: &DealInput,
    analysis: &DealAnalysis,
    risk: &RiskInput,
    assumptions: &Assumptions,
) -> Result<RiskReport> {
    ensure_non_negative("property_age_years", risk.property_age_years)?;
    ensure_non_negative("cash_reserves", risk.cash_reserves)?;
    ensure_non_negative("rate_shock", risk.rate_shock)?;

    let renewal = renewal_shock(input, analysis, risk.rate_shock)?;

    let ltv = analysis.financing.insured_loan / input.purchase_price;
    let egi = analysis.revenue.effective_gross_income;
    let cash_flow_margin = (egi > 0.0).then(|| analysis.cash_flow.annual_cash_flow / egi);
    let monthly_carrying = (analysis.expenses.total + analysis.financing.annual_debt_service) / 12.0;
    let reserve_months = (monthly_carrying > 0.0).then(|| risk.cash_reserves / monthly_carrying);

    let dscr = analysis.ratios.dscr;
    let shocked_dscr = renewal.as_ref().and_then(|r| r.shocked_dscr);
    let break_even = analysis.ratios.break_even_occupancy;

    let factors = vec![
        ScoreComponent::linear("loan_to_value", ltv, 0.50, 0.95, 0.20),
        factor("dscr", dscr, 1.5, 1.0, 0.20, 0.0),
        factor("cash_flow_margin", cash_flow_margin, 0.20, 0.0, 0.10, 100.0),
        factor("break_even_occupancy", break_even, 0.70, 1.00, 0.15, 100.0),
        factor("renewal_dscr", shocked_dscr, 1.3, 0.9, 0.15, 0.0),
        factor("reserve_months", reserve_months, 6.0, 0.0, 0.10, 0.0),
        ScoreComponent::linear("property_age", risk.property_age_years, 10.0, 60.0, 0.05),
        ScoreComponent::linear("unit_concentration", input.units as f64, 6.0, 1.0, 0.05),
    ];

    let score = weighted_total(&factors);
    let flags: Vec<RiskFlag> = factors
        .iter()
        .filter(|f| f.score >= WARNING_RISK)
        .map(|f| RiskFlag {
            factor: f.name.clone(),
            severity: if f.score >= CRITICAL_RISK {
                FlagSeverity::Critical
            } else {
                FlagSeverity::Warning
            },
            risk: f.score,
        })
        .collect();

    log::debug!("risk score for '{}': {} ({} flags)", input.name, score, flags.len());

    Ok(RiskReport {
        score,
        level: RiskLevel::from_score(score),
        factors,
        flags,
        renewal,
        reserve_months,
        sensitivity: sensitivity(input, assumptions)?,
    })
}

/// Risk factor from an optional metric; `undefined` is the risk when the metric is None
fn factor(name: &str, value: Option<f64>, low: f64, high: f64, weight: f64, undefined: f64) -> ScoreComponent {
    let risk = value.map(|v| linear_score(v, low, high)).unwrap_or(undefined);
    ScoreComponent::new(name, value, risk, weight)
}
