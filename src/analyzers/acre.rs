//! Market-fundamentals score for a region (ACRE method)
//!
//! Ten economic and rental-market indicators are scored 0-100 between a
//! floor and a target and combined with fixed weights.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ensure_non_negative, AnalysisError, Result};
use crate::scoring::{weighted_total, ScoreComponent};

/// Regional indicators; growth and rates are annual decimals, ratings are 0-10
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcreInput {
    #[serde(default)]
    pub region: String,
    pub population_growth: f64,
    pub job_growth: f64,
    pub unemployment_rate: f64,
    /// Rental vacancy rate
    pub vacancy_rate: f64,
    pub income_growth: f64,
    pub infrastructure_rating: f64,
    pub transit_rating: f64,
    /// Typical monthly rent over typical price
    pub rent_to_price: f64,
    /// Typical price over median household income
    pub price_to_income: f64,
    pub landlord_friendliness: f64,
}

/// Overall market tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketTier {
    Prime,
    Strong,
    Moderate,
    Weak,
}

impl MarketTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            MarketTier::Prime
        } else if score >= 65.0 {
            MarketTier::Strong
        } else if score >= 50.0 {
            MarketTier::Moderate
        } else {
            MarketTier::Weak
        }
    }
}

impl fmt::Display for MarketTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MarketTier::Prime => "Prime",
            MarketTier::Strong => "Strong",
            MarketTier::Moderate => "Moderate",
            MarketTier::Weak => "Weak",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcreScore {
    pub region: String,
    pub total: f64,
    pub tier: MarketTier,
    pub components: Vec<ScoreComponent>,
    /// Names of the three highest-scoring components
    pub strengths: Vec<String>,
    /// Names of the three lowest-scoring components
    pub weaknesses: Vec<String>,
}

/// (name, floor, target, weight)
const INDICATORS: [(&str, f64, f64, f64); 10] = [
    ("population_growth", 0.0, 0.02, 0.15),
    ("job_growth", 0.0, 0.02, 0.15),
    ("unemployment_rate", 0.08, 0.04, 0.10),
    ("vacancy_rate", 0.05, 0.01, 0.15),
    ("income_growth", 0.0, 0.04, 0.10),
    ("infrastructure_rating", 0.0, 10.0, 0.10),
    ("transit_rating", 0.0, 10.0, 0.05),
    ("rent_to_price", 0.004, 0.01, 0.10),
    ("price_to_income", 10.0, 4.0, 0.05),
    ("landlord_friendliness", 0.0, 10.0, 0.05),
];

impl AcreInput {
    fn values(&self) -> [f64; 10] {
        [
            self.population_growth,
            self.job_growth,
            self.unemployment_rate,
            self.vacancy_rate,
            self.income_growth,
            self.infrastructure_rating,
            self.transit_rating,
            self.rent_to_price,
            self.price_to_income,
            self.landlord_friendliness,
        ]
    }

    fn validate(&self) -> Result<()> {
        for value in self.values() {
            if !value.is_finite() {
                return Err(AnalysisError::invalid("acre", "indicators must be finite"));
            }
        }
        ensure_non_negative("unemployment_rate", self.unemployment_rate)?;
        ensure_non_negative("vacancy_rate", self.vacancy_rate)?;
        ensure_non_negative("rent_to_price", self.rent_to_price)?;
        ensure_non_negative("price_to_income", self.price_to_income)?;
        for (field, rating) in [
            ("infrastructure_rating", self.infrastructure_rating),
            ("transit_rating", self.transit_rating),
            ("landlord_friendliness", self.landlord_friendliness),
        ] {
            if !(0.0..=10.0).contains(&rating) {
                return Err(AnalysisError::invalid(field, "must be between 0 and 10"));
            }
        }
        Ok(())
    }
}

/// Score a regional market
pub fn score_market(input: &AcreInput) -> Result<AcreScore> {
    input.validate()?;

    let components: Vec<ScoreComponent> = INDICATORS
        .iter()
        .zip(input.values())
        .map(|(&(name, floor, target, weight), value)| ScoreComponent::linear(name, value, floor, target, weight))
        .collect();

    let total = weighted_total(&components);

    let mut ranked: Vec<&ScoreComponent> = components.iter().collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    let strengths = ranked.iter().take(3).map(|c| c.name.clone()).collect();
    let weaknesses = ranked.iter().rev().take(3).map(|c| c.name.clone()).collect();

    log::debug!("ACRE score for '{}': {}", input.region, total);

    Ok(AcreScore {
        region: input.region.clone(),
        total,
        tier: MarketTier::from_score(total),
        components,
        strengths,
        weaknesses,
    })
}
