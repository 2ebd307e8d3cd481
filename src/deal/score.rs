//! Weighted 0-100 deal score and letter grade

use serde::{Deserialize, Serialize};
use std::fmt;

use super::analyzer::Ratios;
use crate::assumptions::{GradeThresholds, ScoringWeights};
use crate::scoring::{linear_score, weighted_total, ScoreComponent};

/// Letter grade for a deal score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: f64, thresholds: &GradeThresholds) -> Self {
        if score >= thresholds.a_plus {
            Grade::APlus
        } else if score >= thresholds.a {
            Grade::A
        } else if score >= thresholds.b {
            Grade::B
        } else if score >= thresholds.c {
            Grade::C
        } else if score >= thresholds.d {
            Grade::D
        } else {
            Grade::F
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite deal score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealScore {
    pub total: f64,
    pub grade: Grade,
    pub components: Vec<ScoreComponent>,
}

// Floors score 0, targets score 100
const CAP_RATE: (f64, f64) = (0.03, 0.08);
const CASH_ON_CASH: (f64, f64) = (0.0, 0.12);
const DSCR: (f64, f64) = (1.0, 1.5);
const CASH_FLOW_PER_UNIT: (f64, f64) = (0.0, 300.0);
const GRM: (f64, f64) = (20.0, 10.0);
const BREAK_EVEN_OCCUPANCY: (f64, f64) = (0.95, 0.70);

/// Score a deal from its ratios and monthly cash flow per unit
pub fn score_deal(
    ratios: &Ratios,
    monthly_cash_flow_per_unit: f64,
    weights: &ScoringWeights,
    thresholds: &GradeThresholds,
) -> DealScore {
    // Undefined cash-on-cash means no cash in the deal: full marks if it cash flows
    let coc_score = match ratios.cash_on_cash {
        Some(coc) => linear_score(coc, CASH_ON_CASH.0, CASH_ON_CASH.1),
        None if monthly_cash_flow_per_unit > 0.0 => 100.0,
        None => 0.0,
    };
    let dscr_score = match ratios.dscr {
        Some(dscr) => linear_score(dscr, DSCR.0, DSCR.1),
        None => 100.0,
    };
    let grm_score = match ratios.grm {
        Some(grm) => linear_score(grm, GRM.0, GRM.1),
        None => 0.0,
    };
    let break_even_score = match ratios.break_even_occupancy {
        Some(beo) => linear_score(beo, BREAK_EVEN_OCCUPANCY.0, BREAK_EVEN_OCCUPANCY.1),
        None => 0.0,
    };

    let components = vec![
        ScoreComponent::linear("cap_rate", ratios.cap_rate, CAP_RATE.0, CAP_RATE.1, weights.cap_rate),
        ScoreComponent::new("cash_on_cash", ratios.cash_on_cash, coc_score, weights.cash_on_cash),
        ScoreComponent::new("dscr", ratios.dscr, dscr_score, weights.dscr),
        ScoreComponent::linear(
            "cash_flow_per_unit",
            monthly_cash_flow_per_unit,
            CASH_FLOW_PER_UNIT.0,
            CASH_FLOW_PER_UNIT.1,
            weights.cash_flow_per_unit,
        ),
        ScoreComponent::new("grm", ratios.grm, grm_score, weights.grm),
        ScoreComponent::new(
            "break_even_occupancy",
            ratios.break_even_occupancy,
            break_even_score,
            weights.break_even_occupancy,
        ),
    ];

    let total = weighted_total(&components);
    DealScore {
        total,
        grade: Grade::from_score(total, thresholds),
        components,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratios(cap_rate: f64, coc: Option<f64>, dscr: Option<f64>, grm: Option<f64>, beo: f64) -> Ratios {
        Ratios {
            cap_rate,
            cash_on_cash: coc,
            dscr,
            grm,
            expense_ratio: Some(0.35),
            break_even_occupancy: Some(beo),
            rent_to_price: 0.005,
            year_one_roi: None,
            loan_to_value: 0.8,
        }
    }

    #[test]
    fn test_grade_thresholds() {
        let t = GradeThresholds::default();
        assert_eq!(Grade::from_score(95.0, &t), Grade::APlus);
        assert_eq!(Grade::from_score(90.0, &t), Grade::APlus);
        assert_eq!(Grade::from_score(85.0, &t), Grade::A);
        assert_eq!(Grade::from_score(70.0, &t), Grade::B);
        assert_eq!(Grade::from_score(65.0, &t), Grade::C);
        assert_eq!(Grade::from_score(50.0, &t), Grade::D);
        assert_eq!(Grade::from_score(49.9, &t), Grade::F);
    }

    #[test]
    fn test_perfect_deal() {
        let r = ratios(0.09, Some(0.15), Some(1.8), Some(8.0), 0.6);
        let score = score_deal(&r, 400.0, &ScoringWeights::default(), &GradeThresholds::default());
        assert_eq!(score.total, 100.0);
        assert_eq!(score.grade, Grade::APlus);
        assert_eq!(score.components.len(), 6);
    }

    #[test]
    fn test_midpoint_deal() {
        // Every component halfway between floor and target
        let r = ratios(0.055, Some(0.06), Some(1.25), Some(15.0), 0.825);
        let score = score_deal(&r, 150.0, &ScoringWeights::default(), &GradeThresholds::default());
        assert!((score.total - 50.0).abs() < 1e-9);
        assert_eq!(score.grade, Grade::D);
    }

    #[test]
    fn test_no_debt_gets_full_dscr_marks() {
        let r = ratios(0.03, Some(0.0), None, Some(20.0), 0.95);
        let score = score_deal(&r, 0.0, &ScoringWeights::default(), &GradeThresholds::default());
        // Only DSCR (weight 0.20) scores
        assert!((score.total - 20.0).abs() < 1e-9);
        assert_eq!(score.grade, Grade::F);
    }

    #[test]
    fn test_grade_serializes_with_plus() {
        assert_eq!(serde_json::to_string(&Grade::APlus).unwrap(), "\"A+\"");
        assert_eq!(Grade::B.to_string(), "B");
    }
}
