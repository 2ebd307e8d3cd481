//! Deal score weights and letter-grade thresholds

use serde::{Deserialize, Serialize};

/// Weights of each metric in the deal score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub cap_rate: f64,
    pub cash_on_cash: f64,
    pub dscr: f64,
    pub cash_flow_per_unit: f64,
    pub grm: f64,
    pub break_even_occupancy: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            cap_rate: 0.25,
            cash_on_cash: 0.25,
            dscr: 0.20,
            cash_flow_per_unit: 0.15,
            grm: 0.10,
            break_even_occupancy: 0.05,
        }
    }
}

impl ScoringWeights {
    pub fn total(&self) -> f64 {
        self.cap_rate + self.cash_on_cash + self.dscr + self.cash_flow_per_unit + self.grm + self.break_even_occupancy
    }

    /// Set one weight by component name, returns false for unknown names
    pub fn set(&mut self, component: &str, weight: f64) -> bool {
        let slot = match component {
            "cap_rate" => &mut self.cap_rate,
            "cash_on_cash" => &mut self.cash_on_cash,
            "dscr" => &mut self.dscr,
            "cash_flow_per_unit" => &mut self.cash_flow_per_unit,
            "grm" => &mut self.grm,
            "break_even_occupancy" => &mut self.break_even_occupancy,
            _ => return false,
        };
        *slot = weight;
        true
    }
}

/// Minimum score for each letter grade
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeThresholds {
    pub a_plus: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Default for GradeThresholds {
    fn default() -> Self {
        Self {
            a_plus: 90.0,
            a: 80.0,
            b: 70.0,
            c: 60.0,
            d: 50.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        assert!((ScoringWeights::default().total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_set_weight() {
        let mut weights = ScoringWeights::default();
        assert!(weights.set("grm", 0.0));
        assert!(!weights.set("vibes", 1.0));
        assert_eq!(weights.grm, 0.0);
        assert!((weights.total() - 0.90).abs() < 1e-12);
    }
}
