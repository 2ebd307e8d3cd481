//! Linear component scoring shared by the deal, ACRE and risk scores

use serde::{Deserialize, Serialize};

/// One weighted input to a composite score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub name: String,
    /// Raw metric value (None when undefined, e.g. DSCR with no debt)
    pub value: Option<f64>,
    /// Normalized score, 0-100
    pub score: f64,
    pub weight: f64,
}

impl ScoreComponent {
    pub fn new(name: &str, value: Option<f64>, score: f64, weight: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            score,
            weight,
        }
    }

    /// Score `value` linearly between `floor` (0) and `target` (100)
    pub fn linear(name: &str, value: f64, floor: f64, target: f64, weight: f64) -> Self {
        Self::new(name, Some(value), linear_score(value, floor, target), weight)
    }
}

/// Map `value` onto 0-100: `floor` scores 0, `target` scores 100, clamped.
/// A target below the floor scores lower-is-better metrics.
pub fn linear_score(value: f64, floor: f64, target: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let span = target - floor;
    if span.abs() < 1e-12 {
        return if value >= target { 100.0 } else { 0.0 };
    }
    ((value - floor) / span).clamp(0.0, 1.0) * 100.0
}

/// Weighted mean of component scores, normalized by total weight, one decimal
pub fn weighted_total(components: &[ScoreComponent]) -> f64 {
    let total_weight: f64 = components.iter().map(|c| c.weight).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    let sum: f64 = components.iter().map(|c| c.score * c.weight).sum();
    round1(sum / total_weight)
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_score() {
        assert!((linear_score(0.055, 0.03, 0.08) - 50.0).abs() < 1e-9);
        assert_eq!(linear_score(0.02, 0.03, 0.08), 0.0);
        assert_eq!(linear_score(0.10, 0.03, 0.08), 100.0);
    }

    #[test]
    fn test_lower_is_better() {
        // GRM: 20 scores 0, 10 scores 100
        assert!((linear_score(15.0, 20.0, 10.0) - 50.0).abs() < 1e-9);
        assert_eq!(linear_score(25.0, 20.0, 10.0), 0.0);
        assert_eq!(linear_score(8.0, 20.0, 10.0), 100.0);
    }

    #[test]
    fn test_weighted_total() {
        let components = vec![
            ScoreComponent::new("a", None, 100.0, 0.75),
            ScoreComponent::new("b", None, 0.0, 0.25),
        ];
        assert_eq!(weighted_total(&components), 75.0);

        // Weights are normalized
        let components = vec![
            ScoreComponent::new("a", None, 80.0, 2.0),
            ScoreComponent::new("b", None, 40.0, 2.0),
        ];
        assert_eq!(weighted_total(&components), 60.0);
        assert_eq!(weighted_total(&[]), 0.0);
    }

    #[test]
    fn test_non_finite_scores_zero() {
        assert_eq!(linear_score(f64::NAN, 0.0, 1.0), 0.0);
    }
}
