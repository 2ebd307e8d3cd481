//! Financing strategy optimizer
//!
//! Each candidate strategy re-runs the deal analysis on a modified input
//! (and, for vendor take-back and BRRRR, layers the extra loan on top).
//! Outcomes are ranked by an objective; strategies that fail the stress
//! test rank after those that pass.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::assumptions::Assumptions;
use crate::deal::{borrower_stress_input, score_deal, DealAnalysis, DealAnalyzer, DealInput, Grade};
use crate::error::{ensure_fraction, AnalysisError, Result};
use crate::mortgage::stress_test::{self, StressTestResult};
use crate::mortgage::MortgageTerms;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FinancingStrategy {
    Conventional {
        down_payment_percent: f64,
        amortization_years: u32,
    },
    /// High-ratio mortgage with CMHC insurance
    Insured {
        down_payment_percent: f64,
        amortization_years: u32,
    },
    /// Seller finances part of the price as a second mortgage
    VendorTakeBack {
        down_payment_percent: f64,
        vtb_percent: f64,
        vtb_rate: f64,
        vtb_amortization_years: u32,
    },
    /// Buy, renovate, rent, refinance at the after-repair value
    Brrrr {
        rehab_cost: f64,
        after_repair_value: f64,
        refinance_ltv: f64,
        refinance_rate: f64,
    },
}

impl FinancingStrategy {
    pub fn label(&self) -> String {
        match self {
            FinancingStrategy::Conventional {
                down_payment_percent,
                amortization_years,
            } => format!("Conventional {:.0}% down, {}y", down_payment_percent * 100.0, amortization_years),
            FinancingStrategy::Insured {
                down_payment_percent,
                amortization_years,
            } => format!("Insured {:.0}% down, {}y", down_payment_percent * 100.0, amortization_years),
            FinancingStrategy::VendorTakeBack {
                down_payment_percent,
                vtb_percent,
                vtb_rate,
                ..
            } => format!(
                "VTB {:.0}% down + {:.0}% at {:.2}%",
                down_payment_percent * 100.0,
                vtb_percent * 100.0,
                vtb_rate * 100.0
            ),
            FinancingStrategy::Brrrr {
                after_repair_value,
                refinance_ltv,
                ..
            } => format!("BRRRR refinance {:.0}% of ${:.0}", refinance_ltv * 100.0, after_repair_value),
        }
    }

    /// Candidates evaluated when none are given
    pub fn default_candidates() -> Vec<FinancingStrategy> {
        let conventional = |down: f64, years: u32| FinancingStrategy::Conventional {
            down_payment_percent: down,
            amortization_years: years,
        };
        let insured = |down: f64| FinancingStrategy::Insured {
            down_payment_percent: down,
            amortization_years: 25,
        };
        vec![
            conventional(0.20, 25),
            conventional(0.20, 30),
            conventional(0.25, 25),
            conventional(0.35, 25),
            insured(0.05),
            insured(0.10),
            FinancingStrategy::VendorTakeBack {
                down_payment_percent: 0.10,
                vtb_percent: 0.10,
                vtb_rate: 0.06,
                vtb_amortization_years: 25,
            },
        ]
    }
}

/// What to optimize for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    MaxCashFlow,
    MaxCashOnCash,
    MinCashRequired,
    /// Highest deal score
    #[default]
    Balanced,
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Objective::MaxCashFlow => "max_cash_flow",
            Objective::MaxCashOnCash => "max_cash_on_cash",
            Objective::MinCashRequired => "min_cash_required",
            Objective::Balanced => "balanced",
        };
        f.write_str(name)
    }
}

impl FromStr for Objective {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "max_cash_flow" | "cash_flow" => Ok(Objective::MaxCashFlow),
            "max_cash_on_cash" | "cash_on_cash" => Ok(Objective::MaxCashOnCash),
            "min_cash_required" | "min_cash" => Ok(Objective::MinCashRequired),
            "balanced" | "score" => Ok(Objective::Balanced),
            other => Err(AnalysisError::invalid("objective", format!("unknown objective '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancingOutcome {
    pub strategy: FinancingStrategy,
    pub label: String,
    pub cash_required: f64,
    /// All mortgage payments, monthly
    pub monthly_payment: f64,
    pub monthly_cash_flow: f64,
    /// None when no cash is left in the deal
    pub cash_on_cash: Option<f64>,
    pub dscr: Option<f64>,
    /// Borrower passes the stress test (true when no borrower was given)
    pub qualifies: bool,
    pub score: f64,
    pub grade: Grade,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancingFailure {
    pub strategy: FinancingStrategy,
    pub label: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancingReport {
    pub objective: Objective,
    /// Best first
    pub ranked: Vec<FinancingOutcome>,
    pub failures: Vec<FinancingFailure>,
}

impl FinancingReport {
    pub fn best(&self) -> Option<&FinancingOutcome> {
        self.ranked.first()
    }
}

/// Extra debt and cash changes layered on a base analysis
struct Overlay {
    cash_required: f64,
    monthly_payment: f64,
    annual_debt_service: f64,
    /// Stress test redone with the overlay's debt; None without a borrower
    qualification: Option<StressTestResult>,
}

struct StrategyEvaluator<'a> {
    analyzer: DealAnalyzer<'a>,
    assumptions: &'a Assumptions,
}

impl<'a> StrategyEvaluator<'a> {
    fn evaluate(&self, input: &DealInput, strategy: &FinancingStrategy) -> Result<FinancingOutcome> {
        let mut deal = input.clone();
        match *strategy {
            FinancingStrategy::Conventional {
                down_payment_percent,
                amortization_years,
            } => {
                if down_payment_percent < 0.20 {
                    return Err(AnalysisError::invalid(
                        "down_payment_percent",
                        "conventional mortgages need at least 20% down",
                    ));
                }
                deal.down_payment_percent = down_payment_percent;
                deal.amortization_years = amortization_years;
                let analysis = self.analyzer.analyze(&deal)?;
                Ok(self.outcome(strategy, &analysis, None))
            }
            FinancingStrategy::Insured {
                down_payment_percent,
                amortization_years,
            } => {
                deal.down_payment_percent = down_payment_percent;
                deal.amortization_years = amortization_years;
                let analysis = self.analyzer.analyze(&deal)?;
                Ok(self.outcome(strategy, &analysis, None))
            }
            FinancingStrategy::VendorTakeBack {
                down_payment_percent,
                vtb_percent,
                vtb_rate,
                vtb_amortization_years,
            } => {
                ensure_fraction("vtb_percent", vtb_percent)?;
                if down_payment_percent + vtb_percent > 1.0 {
                    return Err(AnalysisError::invalid("vtb_percent", "down payment and VTB exceed the price"));
                }
                // The first mortgage is sized as if the VTB were cash
                deal.down_payment_percent = down_payment_percent + vtb_percent;
                let analysis = self.analyzer.analyze(&deal)?;

                let vtb_loan = input.purchase_price * vtb_percent;
                let vtb = MortgageTerms::new(vtb_loan, vtb_rate, vtb_amortization_years);
                let vtb_payment = vtb.monthly_payment()?;

                // The VTB payment counts as other debt against the first mortgage
                let first = MortgageTerms::new(analysis.financing.insured_loan, deal.interest_rate, deal.amortization_years);
                let qualification = match borrower_stress_input(&deal, &first) {
                    Some(mut stress) => {
                        stress.monthly_other_debts += vtb_payment;
                        Some(stress_test::evaluate(&stress, &self.assumptions.stress_test)?)
                    }
                    None => None,
                };

                let overlay = Overlay {
                    cash_required: analysis.acquisition.total_cash_required - vtb_loan,
                    monthly_payment: analysis.financing.monthly_payment + vtb_payment,
                    annual_debt_service: analysis.financing.annual_debt_service + vtb.annual_payment()?,
                    qualification,
                };
                Ok(self.outcome(strategy, &analysis, Some(overlay)))
            }
            FinancingStrategy::Brrrr {
                rehab_cost,
                after_repair_value,
                refinance_ltv,
                refinance_rate,
            } => {
                ensure_fraction("refinance_ltv", refinance_ltv)?;
                if !after_repair_value.is_finite() || after_repair_value <= 0.0 {
                    return Err(AnalysisError::invalid("after_repair_value", "must be positive"));
                }
                deal.renovation_budget = rehab_cost;
                let analysis = self.analyzer.analyze(&deal)?;

                let refinance_loan = after_repair_value * refinance_ltv;
                let cash_out = refinance_loan - analysis.financing.insured_loan;
                let refinanced = MortgageTerms {
                    principal: refinance_loan,
                    annual_rate: refinance_rate,
                    ..analysis.financing.terms
                };
                let qualification = borrower_stress_input(&deal, &refinanced)
                    .map(|stress| stress_test::evaluate(&stress, &self.assumptions.stress_test))
                    .transpose()?;
                let overlay = Overlay {
                    cash_required: (analysis.acquisition.total_cash_required - cash_out).max(0.0),
                    monthly_payment: refinanced.monthly_payment()?,
                    annual_debt_service: refinanced.annual_payment()?,
                    qualification,
                };
                Ok(self.outcome(strategy, &analysis, Some(overlay)))
            }
        }
    }

    fn outcome(&self, strategy: &FinancingStrategy, analysis: &DealAnalysis, overlay: Option<Overlay>) -> FinancingOutcome {
        let Some(overlay) = overlay else {
            return FinancingOutcome {
                strategy: strategy.clone(),
                label: strategy.label(),
                cash_required: analysis.acquisition.total_cash_required,
                monthly_payment: analysis.financing.monthly_payment,
                monthly_cash_flow: analysis.cash_flow.monthly_cash_flow,
                cash_on_cash: analysis.ratios.cash_on_cash,
                dscr: analysis.ratios.dscr,
                qualifies: analysis.qualification.as_ref().map_or(true, |q| q.passes),
                score: analysis.score.total,
                grade: analysis.score.grade,
            };
        };

        let qualifies = overlay.qualification.as_ref().map_or(true, |q| q.passes);
        let noi = analysis.cash_flow.net_operating_income;
        let annual_cash_flow = noi - overlay.annual_debt_service;
        let mut ratios = analysis.ratios.clone();
        ratios.cash_on_cash = (overlay.cash_required > 0.0).then(|| annual_cash_flow / overlay.cash_required);
        ratios.dscr = (overlay.annual_debt_service > 0.0).then(|| noi / overlay.annual_debt_service);
        let gross_potential_income = analysis.revenue.gross_potential_income;
        ratios.break_even_occupancy = (gross_potential_income > 0.0)
            .then(|| (analysis.expenses.total + overlay.annual_debt_service) / gross_potential_income);

        let score = score_deal(
            &ratios,
            annual_cash_flow / 12.0 / analysis.units as f64,
            &self.assumptions.scoring,
            &self.assumptions.grades,
        );

        FinancingOutcome {
            strategy: strategy.clone(),
            label: strategy.label(),
            cash_required: overlay.cash_required,
            monthly_payment: overlay.monthly_payment,
            monthly_cash_flow: annual_cash_flow / 12.0,
            cash_on_cash: ratios.cash_on_cash,
            dscr: ratios.dscr,
            qualifies,
            score: score.total,
            grade: score.grade,
        }
    }
}

/// Evaluate strategies in parallel and rank them by the objective
pub fn optimize_financing(
    input: &DealInput,
    assumptions: &Assumptions,
    strategies: &[FinancingStrategy],
    objective: Objective,
) -> Result<FinancingReport> {
    input.validate()?;

    let evaluator = StrategyEvaluator {
        analyzer: DealAnalyzer::new(assumptions),
        assumptions,
    };

    let results: Vec<(FinancingStrategy, Result<FinancingOutcome>)> = strategies
        .par_iter()
        .map(|strategy| (strategy.clone(), evaluator.evaluate(input, strategy)))
        .collect();

    let mut ranked = Vec::new();
    let mut failures = Vec::new();
    for (strategy, result) in results {
        match result {
            Ok(outcome) => ranked.push(outcome),
            Err(e) => {
                log::debug!("strategy '{}' not feasible: {}", strategy.label(), e);
                failures.push(FinancingFailure {
                    label: strategy.label(),
                    strategy,
                    error: e.to_string(),
                });
            }
        }
    }

    ranked.sort_by(|a, b| compare_outcomes(a, b, objective));

    Ok(FinancingReport {
        objective,
        ranked,
        failures,
    })
}

/// Ordering with the preferred outcome first
fn compare_outcomes(a: &FinancingOutcome, b: &FinancingOutcome, objective: Objective) -> Ordering {
    // Uncapped return (no cash left in) beats any finite one
    let coc = |o: &FinancingOutcome| o.cash_on_cash.unwrap_or(f64::INFINITY);

    b.qualifies.cmp(&a.qualifies).then_with(|| match objective {
        Objective::MaxCashFlow => b.monthly_cash_flow.total_cmp(&a.monthly_cash_flow),
        Objective::MaxCashOnCash => coc(b).total_cmp(&coc(a)),
        Objective::MinCashRequired => a.cash_required.total_cmp(&b.cash_required),
        Objective::Balanced => b.score.total_cmp(&a.score),
    })
}
