//! Additional dwelling unit (secondary suite) conversion estimator

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{ensure_fraction, ensure_non_negative, AnalysisError, Result};
use crate::mortgage::MortgageTerms;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AduType {
    BasementSuite,
    GarageConversion,
    Addition,
    GardenSuite,
    LanewayHouse,
}

impl AduType {
    /// Typical hard cost per square foot
    pub fn cost_per_square_foot(&self) -> f64 {
        match self {
            AduType::BasementSuite => 150.0,
            AduType::GarageConversion => 200.0,
            AduType::Addition => 300.0,
            AduType::GardenSuite => 350.0,
            AduType::LanewayHouse => 400.0,
        }
    }

    /// Typical building permit and development charges
    pub fn default_permit_fees(&self) -> f64 {
        match self {
            AduType::BasementSuite => 3_000.0,
            AduType::GarageConversion => 4_000.0,
            AduType::Addition => 6_000.0,
            AduType::GardenSuite => 8_000.0,
            AduType::LanewayHouse => 10_000.0,
        }
    }
}

impl FromStr for AduType {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "basement_suite" | "basement" => Ok(AduType::BasementSuite),
            "garage_conversion" | "garage" => Ok(AduType::GarageConversion),
            "addition" => Ok(AduType::Addition),
            "garden_suite" | "garden" => Ok(AduType::GardenSuite),
            "laneway_house" | "laneway" => Ok(AduType::LanewayHouse),
            _ => Err(AnalysisError::invalid("adu_type", format!("unknown ADU type '{}'", s))),
        }
    }
}

/// Loan used to fund construction
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AduFinancing {
    pub rate: f64,
    pub amortization_years: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AduInput {
    pub adu_type: AduType,
    pub square_feet: f64,
    /// Regional cost adjustment (1.0 = typical)
    #[serde(default = "default_cost_multiplier")]
    pub cost_multiplier: f64,
    /// Overrides the typical permit fees for the type
    #[serde(default)]
    pub permit_fees: Option<f64>,
    /// Design and engineering, as a share of hard cost
    #[serde(default = "default_design_percent")]
    pub design_percent: f64,
    /// Share of hard cost
    #[serde(default = "default_contingency_percent")]
    pub contingency_percent: f64,
    pub expected_monthly_rent: f64,
    #[serde(default = "default_vacancy_rate")]
    pub vacancy_rate: f64,
    #[serde(default)]
    pub added_annual_expenses: f64,
    /// Cap rate used to value the added income
    #[serde(default = "default_cap_rate")]
    pub cap_rate: f64,
    #[serde(default)]
    pub financing: Option<AduFinancing>,
}

fn default_cost_multiplier() -> f64 {
    1.0
}
fn default_design_percent() -> f64 {
    0.08
}
fn default_contingency_percent() -> f64 {
    0.10
}
fn default_vacancy_rate() -> f64 {
    0.03
}
fn default_cap_rate() -> f64 {
    0.05
}

impl AduInput {
    pub fn new(adu_type: AduType, square_feet: f64, expected_monthly_rent: f64) -> Self {
        Self {
            adu_type,
            square_feet,
            cost_multiplier: default_cost_multiplier(),
            permit_fees: None,
            design_percent: default_design_percent(),
            contingency_percent: default_contingency_percent(),
            expected_monthly_rent,
            vacancy_rate: default_vacancy_rate(),
            added_annual_expenses: 0.0,
            cap_rate: default_cap_rate(),
            financing: None,
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.square_feet.is_finite() || self.square_feet <= 0.0 {
            return Err(AnalysisError::invalid("square_feet", "must be positive"));
        }
        if !self.cost_multiplier.is_finite() || self.cost_multiplier <= 0.0 {
            return Err(AnalysisError::invalid("cost_multiplier", "must be positive"));
        }
        if !self.cap_rate.is_finite() || self.cap_rate <= 0.0 || self.cap_rate > 1.0 {
            return Err(AnalysisError::invalid("cap_rate", "must be between 0 and 1"));
        }
        ensure_fraction("design_percent", self.design_percent)?;
        ensure_fraction("contingency_percent", self.contingency_percent)?;
        ensure_fraction("vacancy_rate", self.vacancy_rate)?;
        ensure_non_negative("expected_monthly_rent", self.expected_monthly_rent)?;
        ensure_non_negative("added_annual_expenses", self.added_annual_expenses)?;
        if let Some(fees) = self.permit_fees {
            ensure_non_negative("permit_fees", fees)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AduFinancingResult {
    pub monthly_payment: f64,
    pub monthly_cash_flow: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AduEstimate {
    pub hard_cost: f64,
    pub design_cost: f64,
    pub contingency: f64,
    pub permit_fees: f64,
    pub total_cost: f64,
    pub annual_gross_rent: f64,
    pub annual_net_rent: f64,
    /// None when the unit never pays for itself
    pub payback_years: Option<f64>,
    /// Annual net rent over total cost
    pub roi: f64,
    /// Added net income capitalized at the cap rate
    pub value_uplift: f64,
    /// Value uplift less total cost
    pub equity_created: f64,
    pub financing: Option<AduFinancingResult>,
}

/// Estimate the cost and return of adding a unit
pub fn estimate_adu(input: &AduInput) -> Result<AduEstimate> {
    input.validate()?;

    let hard_cost = input.square_feet * input.adu_type.cost_per_square_foot() * input.cost_multiplier;
    let design_cost = hard_cost * input.design_percent;
    let contingency = hard_cost * input.contingency_percent;
    let permit_fees = input.permit_fees.unwrap_or_else(|| input.adu_type.default_permit_fees());
    let total_cost = hard_cost + design_cost + contingency + permit_fees;

    let annual_gross_rent = input.expected_monthly_rent * 12.0;
    let annual_net_rent = annual_gross_rent * (1.0 - input.vacancy_rate) - input.added_annual_expenses;
    let payback_years = (annual_net_rent > 0.0).then(|| total_cost / annual_net_rent);
    let value_uplift = annual_net_rent.max(0.0) / input.cap_rate;

    let financing = match input.financing {
        Some(loan) => {
            let monthly_payment = MortgageTerms::new(total_cost, loan.rate, loan.amortization_years).monthly_payment()?;
            Some(AduFinancingResult {
                monthly_payment,
                monthly_cash_flow: annual_net_rent / 12.0 - monthly_payment,
            })
        }
        None => None,
    };

    Ok(AduEstimate {
        hard_cost,
        design_cost,
        contingency,
        permit_fees,
        total_cost,
        annual_gross_rent,
        annual_net_rent,
        payback_years,
        roi: annual_net_rent / total_cost,
        value_uplift,
        equity_created: value_uplift - total_cost,
        financing,
    })
}
