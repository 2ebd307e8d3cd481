//! Short-term (Airbnb) versus long-term rental comparison

use serde::{Deserialize, Serialize};

use crate::error::{ensure_fraction, ensure_non_negative, AnalysisError, Result};

/// Short-term net must beat long-term by this share to be recommended
const SHORT_TERM_MARGIN: f64 = 0.10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrInput {
    pub nightly_rate: f64,
    /// Share of the year's nights booked
    pub occupancy_rate: f64,
    #[serde(default = "default_average_stay")]
    pub average_stay_nights: f64,
    /// Charged to the guest per stay
    #[serde(default)]
    pub cleaning_fee_per_stay: f64,
    /// Paid to the cleaner per stay
    #[serde(default)]
    pub cleaning_cost_per_stay: f64,
    /// Host service fee, share of gross bookings
    #[serde(default = "default_platform_fee")]
    pub platform_fee_percent: f64,
    #[serde(default)]
    pub management_percent: f64,
    #[serde(default)]
    pub monthly_utilities: f64,
    #[serde(default)]
    pub monthly_supplies: f64,
    #[serde(default)]
    pub furnishing_cost: f64,
    #[serde(default = "default_furnishing_life")]
    pub furnishing_life_years: f64,
    #[serde(default)]
    pub annual_licensing_fees: f64,
    /// Municipal accommodation tax borne by the host, share of nightly revenue
    #[serde(default)]
    pub accommodation_tax_percent: f64,
    /// Whether local bylaws allow short-term rental of this property
    #[serde(default = "default_true")]
    pub str_permitted: bool,
}

fn default_average_stay() -> f64 {
    3.0
}
fn default_platform_fee() -> f64 {
    0.03
}
fn default_furnishing_life() -> f64 {
    5.0
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LtrInput {
    pub monthly_rent: f64,
    #[serde(default = "default_ltr_vacancy")]
    pub vacancy_rate: f64,
    /// Utilities paid by the landlord
    #[serde(default)]
    pub monthly_utilities: f64,
    #[serde(default)]
    pub management_percent: f64,
}

fn default_ltr_vacancy() -> f64 {
    0.04
}

/// Both strategies for the same property
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalComparisonInput {
    pub short_term: StrInput,
    pub long_term: LtrInput,
    /// Costs carried either way: property tax, insurance, debt service
    #[serde(default)]
    pub shared_annual_costs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RentalStrategy {
    ShortTerm,
    LongTerm,
    Marginal,
}

/// Annual figures for one strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalScenario {
    pub gross_income: f64,
    pub expenses: f64,
    pub net_income: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortTermDetail {
    pub nights_booked: f64,
    pub stays: f64,
    pub nightly_revenue: f64,
    pub cleaning_fees_collected: f64,
    pub platform_fees: f64,
    pub cleaning_costs: f64,
    pub furnishing_depreciation: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalComparison {
    pub short_term: RentalScenario,
    pub short_term_detail: ShortTermDetail,
    pub long_term: RentalScenario,
    /// Short-term net less long-term net
    pub difference: f64,
    /// Short-term net over long-term net; None when long-term net is not positive
    pub str_premium: Option<f64>,
    /// Occupancy at which short-term net equals long-term net; None if out of reach
    pub break_even_occupancy: Option<f64>,
    pub recommendation: RentalStrategy,
    pub notes: Vec<String>,
}

impl StrInput {
    fn validate(&self) -> Result<()> {
        ensure_non_negative("nightly_rate", self.nightly_rate)?;
        ensure_fraction("occupancy_rate", self.occupancy_rate)?;
        if !self.average_stay_nights.is_finite() || self.average_stay_nights < 1.0 {
            return Err(AnalysisError::invalid("average_stay_nights", "must be at least one night"));
        }
        if !self.furnishing_life_years.is_finite() || self.furnishing_life_years <= 0.0 {
            return Err(AnalysisError::invalid("furnishing_life_years", "must be positive"));
        }
        ensure_non_negative("cleaning_fee_per_stay", self.cleaning_fee_per_stay)?;
        ensure_non_negative("cleaning_cost_per_stay", self.cleaning_cost_per_stay)?;
        ensure_fraction("platform_fee_percent", self.platform_fee_percent)?;
        ensure_fraction("management_percent", self.management_percent)?;
        ensure_fraction("accommodation_tax_percent", self.accommodation_tax_percent)?;
        ensure_non_negative("monthly_utilities", self.monthly_utilities)?;
        ensure_non_negative("monthly_supplies", self.monthly_supplies)?;
        ensure_non_negative("furnishing_cost", self.furnishing_cost)?;
        ensure_non_negative("annual_licensing_fees", self.annual_licensing_fees)
    }

    /// Annual results at a given occupancy
    fn at_occupancy(&self, occupancy: f64, shared_annual_costs: f64) -> (RentalScenario, ShortTermDetail) {
        let nights_booked = 365.0 * occupancy;
        let stays = nights_booked / self.average_stay_nights;
        let nightly_revenue = nights_booked * self.nightly_rate;
        let cleaning_fees_collected = stays * self.cleaning_fee_per_stay;
        let gross_income = nightly_revenue + cleaning_fees_collected;

        let platform_fees = gross_income * self.platform_fee_percent;
        let cleaning_costs = stays * self.cleaning_cost_per_stay;
        let furnishing_depreciation = self.furnishing_cost / self.furnishing_life_years;
        let expenses = platform_fees
            + gross_income * self.management_percent
            + cleaning_costs
            + (self.monthly_utilities + self.monthly_supplies) * 12.0
            + furnishing_depreciation
            + self.annual_licensing_fees
            + nightly_revenue * self.accommodation_tax_percent
            + shared_annual_costs;

        (
            RentalScenario {
                gross_income,
                expenses,
                net_income: gross_income - expenses,
            },
            ShortTermDetail {
                nights_booked,
                stays,
                nightly_revenue,
                cleaning_fees_collected,
                platform_fees,
                cleaning_costs,
                furnishing_depreciation,
            },
        )
    }
}

impl LtrInput {
    fn validate(&self) -> Result<()> {
        ensure_non_negative("monthly_rent", self.monthly_rent)?;
        ensure_fraction("vacancy_rate", self.vacancy_rate)?;
        ensure_non_negative("monthly_utilities", self.monthly_utilities)?;
        ensure_fraction("management_percent", self.management_percent)
    }

    fn scenario(&self, shared_annual_costs: f64) -> RentalScenario {
        let gross_income = self.monthly_rent * 12.0 * (1.0 - self.vacancy_rate);
        let expenses =
            self.monthly_utilities * 12.0 + gross_income * self.management_percent + shared_annual_costs;
        RentalScenario {
            gross_income,
            expenses,
            net_income: gross_income - expenses,
        }
    }
}

/// Compare short-term and long-term rental of the same property
pub fn compare_rental_strategies(input: &RentalComparisonInput) -> Result<RentalComparison> {
    input.short_term.validate()?;
    input.long_term.validate()?;
    ensure_non_negative("shared_annual_costs", input.shared_annual_costs)?;

    let shared = input.shared_annual_costs;
    let (short_term, short_term_detail) = input.short_term.at_occupancy(input.short_term.occupancy_rate, shared);
    let long_term = input.long_term.scenario(shared);

    let difference = short_term.net_income - long_term.net_income;
    let str_premium = (long_term.net_income > 0.0).then(|| short_term.net_income / long_term.net_income);

    // Net income is linear in occupancy
    let empty = input.short_term.at_occupancy(0.0, shared).0.net_income;
    let full = input.short_term.at_occupancy(1.0, shared).0.net_income;
    let break_even_occupancy = if full > empty {
        let occupancy = (long_term.net_income - empty) / (full - empty);
        (0.0..=1.0).contains(&occupancy).then_some(occupancy)
    } else {
        None
    };

    let mut notes = Vec::new();
    let recommendation = if !input.short_term.str_permitted {
        notes.push("short-term rental is not permitted for this property".to_string());
        RentalStrategy::LongTerm
    } else if difference > long_term.net_income.abs() * SHORT_TERM_MARGIN {
        RentalStrategy::ShortTerm
    } else if difference < 0.0 {
        RentalStrategy::LongTerm
    } else {
        notes.push(format!(
            "short-term advantage under {:.0}% does not cover the extra management effort",
            SHORT_TERM_MARGIN * 100.0
        ));
        RentalStrategy::Marginal
    };
    if break_even_occupancy.is_none() && input.short_term.str_permitted {
        notes.push("no occupancy level makes short-term rental match long-term income".to_string());
    }

    log::debug!(
        "STR net ${:.0} vs LTR net ${:.0}: {:?}",
        short_term.net_income,
        long_term.net_income,
        recommendation
    );

    Ok(RentalComparison {
        short_term,
        short_term_detail,
        long_term,
        difference,
        str_premium,
        break_even_occupancy,
        recommendation,
        notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn comparison(nightly_rate: f64, occupancy_rate: f64) -> RentalComparisonInput {
        RentalComparisonInput {
            short_term: StrInput {
                nightly_rate,
                occupancy_rate,
                average_stay_nights: 3.65,
                cleaning_fee_per_stay: 100.0,
                cleaning_cost_per_stay: 80.0,
                platform_fee_percent: 0.03,
                management_percent: 0.0,
                monthly_utilities: 250.0,
                monthly_supplies: 50.0,
                furnishing_cost: 20_000.0,
                furnishing_life_years: 5.0,
                annual_licensing_fees: 500.0,
                accommodation_tax_percent: 0.0,
                str_permitted: true,
            },
            long_term: LtrInput {
                monthly_rent: 2_500.0,
                vacancy_rate: 0.0,
                monthly_utilities: 0.0,
                management_percent: 0.0,
            },
            shared_annual_costs: 10_000.0,
        }
    }

    #[test]
    fn test_short_term_figures() {
        let result = compare_rental_strategies(&comparison(200.0, 0.5)).unwrap();
        let detail = &result.short_term_detail;

        assert_relative_eq!(detail.nights_booked, 182.5, epsilon = 1e-9);
        assert_relative_eq!(detail.stays, 50.0, epsilon = 1e-9);
        assert_relative_eq!(detail.nightly_revenue, 36_500.0, epsilon = 1e-9);
        assert_relative_eq!(result.short_term.gross_income, 41_500.0, epsilon = 1e-9);

        // 1,245 platform + 4,000 cleaning + 3,600 utilities/supplies + 4,000 furnishing + 500 licence + 10,000 shared
        assert_relative_eq!(result.short_term.expenses, 23_345.0, epsilon = 1e-6);
        assert_relative_eq!(result.short_term.net_income, 18_155.0, epsilon = 1e-6);
        assert_relative_eq!(result.long_term.net_income, 20_000.0, epsilon = 1e-9);
        assert_eq!(result.recommendation, RentalStrategy::LongTerm);
    }

    #[test]
    fn test_break_even_occupancy() {
        let result = compare_rental_strategies(&comparison(200.0, 0.5)).unwrap();
        let occupancy = result.break_even_occupancy.unwrap();
        assert!(occupancy > 0.5 && occupancy < 0.6);

        let check = compare_rental_strategies(&comparison(200.0, occupancy)).unwrap();
        assert_relative_eq!(check.difference, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_short_term_recommended() {
        let result = compare_rental_strategies(&comparison(250.0, 0.75)).unwrap();
        assert!(result.difference > 2_000.0);
        assert_eq!(result.recommendation, RentalStrategy::ShortTerm);
        assert!(result.str_premium.unwrap() > 1.1);
    }

    #[test]
    fn test_small_advantage_is_marginal() {
        // Net rises $72,510 per unit of occupancy from $18,155 at 50%
        let result = compare_rental_strategies(&comparison(200.0, 0.54)).unwrap();
        assert_relative_eq!(result.short_term.net_income, 21_055.4, epsilon = 1e-6);
        assert_relative_eq!(result.difference, 1_055.4, epsilon = 1e-6);
        assert_eq!(result.recommendation, RentalStrategy::Marginal);
        assert!(result.notes.iter().any(|n| n.contains("10%")));
    }

    #[test]
    fn test_not_permitted_forces_long_term() {
        let mut input = comparison(250.0, 0.75);
        input.short_term.str_permitted = false;
        let result = compare_rental_strategies(&input).unwrap();
        assert_eq!(result.recommendation, RentalStrategy::LongTerm);
        assert!(!result.notes.is_empty());
    }

    #[test]
    fn test_unreachable_break_even() {
        let result = compare_rental_strategies(&comparison(40.0, 0.9)).unwrap();
        assert!(result.break_even_occupancy.is_none());
    }
}
