//! Deal input: property, purchase, financing and operating assumptions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::assumptions::DownPaymentSource;
use crate::error::{ensure_fraction, ensure_non_negative, AnalysisError, Result};
use crate::jurisdiction::{Municipality, Province};
use crate::mortgage::{Compounding, PaymentFrequency, MAX_AMORTIZATION_YEARS};

/// Property category used for expense benchmarks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    SingleFamily,
    Condo,
    /// Duplex to fourplex
    SmallMultiplex,
    /// Five units or more
    Multifamily,
}

impl PropertyType {
    pub const ALL: [PropertyType; 4] = [
        PropertyType::SingleFamily,
        PropertyType::Condo,
        PropertyType::SmallMultiplex,
        PropertyType::Multifamily,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::SingleFamily => "single_family",
            PropertyType::Condo => "condo",
            PropertyType::SmallMultiplex => "small_multiplex",
            PropertyType::Multifamily => "multifamily",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyType {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        PropertyType::ALL
            .iter()
            .find(|t| t.as_str() == needle)
            .copied()
            .ok_or_else(|| AnalysisError::invalid("property_type", format!("unknown property type '{}'", s)))
    }
}

/// Borrower income for stress-test qualification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BorrowerProfile {
    pub gross_annual_income: f64,
    #[serde(default)]
    pub monthly_other_debts: f64,
}

/// Flat description of a purchase to analyze
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealInput {
    #[serde(default)]
    pub name: String,

    // Purchase
    pub purchase_price: f64,
    #[serde(default = "default_down_payment_percent")]
    pub down_payment_percent: f64,
    pub province: Province,
    #[serde(default)]
    pub municipality: Option<Municipality>,
    #[serde(default)]
    pub first_time_buyer: bool,
    #[serde(default)]
    pub foreign_buyer: bool,
    #[serde(default)]
    pub owner_occupied: bool,
    #[serde(default)]
    pub down_payment_source: DownPaymentSource,
    #[serde(default = "default_units")]
    pub units: u32,
    /// Inferred from units and condo fees when absent
    #[serde(default)]
    pub property_type: Option<PropertyType>,

    // Financing
    pub interest_rate: f64,
    #[serde(default = "default_amortization_years")]
    pub amortization_years: u32,
    #[serde(default)]
    pub payment_frequency: PaymentFrequency,
    #[serde(default)]
    pub compounding: Compounding,
    /// Mortgage term before renewal
    #[serde(default = "default_term_years")]
    pub term_years: u32,

    // Revenue (monthly)
    pub monthly_rent: f64,
    #[serde(default)]
    pub other_monthly_income: f64,
    #[serde(default = "default_vacancy_rate")]
    pub vacancy_rate: f64,

    // Operating expenses
    #[serde(default)]
    pub annual_property_tax: f64,
    #[serde(default)]
    pub annual_insurance: f64,
    #[serde(default)]
    pub monthly_utilities: f64,
    #[serde(default)]
    pub monthly_condo_fees: f64,
    /// Share of gross rent
    #[serde(default = "default_maintenance_percent")]
    pub maintenance_percent: f64,
    /// Share of effective gross income
    #[serde(default)]
    pub management_percent: f64,
    /// Share of gross rent
    #[serde(default = "default_capex_reserve_percent")]
    pub capex_reserve_percent: f64,
    #[serde(default)]
    pub other_annual_expenses: f64,

    // Closing costs
    #[serde(default = "default_legal_fees")]
    pub legal_fees: f64,
    #[serde(default = "default_inspection_fee")]
    pub inspection_fee: f64,
    #[serde(default = "default_appraisal_fee")]
    pub appraisal_fee: f64,
    #[serde(default)]
    pub other_closing_costs: f64,
    #[serde(default)]
    pub renovation_budget: f64,

    // Hold period
    #[serde(default = "default_appreciation_rate")]
    pub appreciation_rate: f64,
    #[serde(default = "default_rent_growth_rate")]
    pub rent_growth_rate: f64,
    #[serde(default = "default_expense_growth_rate")]
    pub expense_growth_rate: f64,
    #[serde(default = "default_hold_years")]
    pub hold_years: u32,
    #[serde(default = "default_selling_cost_percent")]
    pub selling_cost_percent: f64,

    #[serde(default)]
    pub borrower: Option<BorrowerProfile>,
}

fn default_down_payment_percent() -> f64 { 0.20 }
fn default_units() -> u32 { 1 }
fn default_amortization_years() -> u32 { 25 }
fn default_term_years() -> u32 { 5 }
fn default_vacancy_rate() -> f64 { 0.04 }
fn default_maintenance_percent() -> f64 { 0.05 }
fn default_capex_reserve_percent() -> f64 { 0.05 }
fn default_legal_fees() -> f64 { 1_500.0 }
fn default_inspection_fee() -> f64 { 500.0 }
fn default_appraisal_fee() -> f64 { 400.0 }
fn default_appreciation_rate() -> f64 { 0.03 }
fn default_rent_growth_rate() -> f64 { 0.02 }
fn default_expense_growth_rate() -> f64 { 0.025 }
fn default_hold_years() -> u32 { 5 }
fn default_selling_cost_percent() -> f64 { 0.05 }

/// Longest hold period projected
pub const MAX_HOLD_YEARS: u32 = 40;

impl DealInput {
    /// Minimal deal with every optional field at its default
    pub fn new(name: &str, purchase_price: f64, monthly_rent: f64, interest_rate: f64, province: Province) -> Self {
        Self {
            name: name.to_string(),
            purchase_price,
            down_payment_percent: default_down_payment_percent(),
            province,
            municipality: None,
            first_time_buyer: false,
            foreign_buyer: false,
            owner_occupied: false,
            down_payment_source: DownPaymentSource::Traditional,
            units: default_units(),
            property_type: None,
            interest_rate,
            amortization_years: default_amortization_years(),
            payment_frequency: PaymentFrequency::Monthly,
            compounding: Compounding::SemiAnnual,
            term_years: default_term_years(),
            monthly_rent,
            other_monthly_income: 0.0,
            vacancy_rate: default_vacancy_rate(),
            annual_property_tax: 0.0,
            annual_insurance: 0.0,
            monthly_utilities: 0.0,
            monthly_condo_fees: 0.0,
            maintenance_percent: default_maintenance_percent(),
            management_percent: 0.0,
            capex_reserve_percent: default_capex_reserve_percent(),
            other_annual_expenses: 0.0,
            legal_fees: default_legal_fees(),
            inspection_fee: default_inspection_fee(),
            appraisal_fee: default_appraisal_fee(),
            other_closing_costs: 0.0,
            renovation_budget: 0.0,
            appreciation_rate: default_appreciation_rate(),
            rent_growth_rate: default_rent_growth_rate(),
            expense_growth_rate: default_expense_growth_rate(),
            hold_years: default_hold_years(),
            selling_cost_percent: default_selling_cost_percent(),
            borrower: None,
        }
    }

    /// Explicit property type, or one inferred from units and condo fees
    pub fn effective_property_type(&self) -> PropertyType {
        if let Some(t) = self.property_type {
            return t;
        }
        match self.units {
            0 | 1 if self.monthly_condo_fees > 0.0 => PropertyType::Condo,
            0 | 1 => PropertyType::SingleFamily,
            2..=4 => PropertyType::SmallMultiplex,
            _ => PropertyType::Multifamily,
        }
    }

    pub fn down_payment(&self) -> f64 {
        self.purchase_price * self.down_payment_percent
    }

    /// Check every field the pipeline depends on
    pub fn validate(&self) -> Result<()> {
        if !self.purchase_price.is_finite() || self.purchase_price <= 0.0 {
            return Err(AnalysisError::invalid("purchase_price", "must be positive"));
        }
        ensure_fraction("down_payment_percent", self.down_payment_percent)?;
        ensure_fraction("interest_rate", self.interest_rate)?;
        ensure_fraction("vacancy_rate", self.vacancy_rate)?;
        ensure_fraction("maintenance_percent", self.maintenance_percent)?;
        ensure_fraction("management_percent", self.management_percent)?;
        ensure_fraction("capex_reserve_percent", self.capex_reserve_percent)?;
        ensure_fraction("selling_cost_percent", self.selling_cost_percent)?;

        for (field, value) in [
            ("monthly_rent", self.monthly_rent),
            ("other_monthly_income", self.other_monthly_income),
            ("annual_property_tax", self.annual_property_tax),
            ("annual_insurance", self.annual_insurance),
            ("monthly_utilities", self.monthly_utilities),
            ("monthly_condo_fees", self.monthly_condo_fees),
            ("other_annual_expenses", self.other_annual_expenses),
            ("legal_fees", self.legal_fees),
            ("inspection_fee", self.inspection_fee),
            ("appraisal_fee", self.appraisal_fee),
            ("other_closing_costs", self.other_closing_costs),
            ("renovation_budget", self.renovation_budget),
        ] {
            ensure_non_negative(field, value)?;
        }

        for (field, value) in [
            ("appreciation_rate", self.appreciation_rate),
            ("rent_growth_rate", self.rent_growth_rate),
            ("expense_growth_rate", self.expense_growth_rate),
        ] {
            if !value.is_finite() || !(-0.5..=0.5).contains(&value) {
                return Err(AnalysisError::invalid(field, format!("must be between -0.5 and 0.5, got {}", value)));
            }
        }

        if self.units == 0 {
            return Err(AnalysisError::invalid("units", "must be at least 1"));
        }
        if self.amortization_years == 0 || self.amortization_years > MAX_AMORTIZATION_YEARS {
            return Err(AnalysisError::invalid(
                "amortization_years",
                format!("must be between 1 and {}", MAX_AMORTIZATION_YEARS),
            ));
        }
        if self.term_years == 0 || self.term_years > self.amortization_years {
            return Err(AnalysisError::invalid("term_years", "must be between 1 and the amortization"));
        }
        if self.hold_years == 0 || self.hold_years > MAX_HOLD_YEARS {
            return Err(AnalysisError::invalid(
                "hold_years",
                format!("must be between 1 and {}", MAX_HOLD_YEARS),
            ));
        }
        if let Some(city) = self.municipality {
            if city.province() != self.province {
                return Err(AnalysisError::invalid(
                    "municipality",
                    format!("{} is not in {}", city.name(), self.province.name()),
                ));
            }
        }
        if let Some(borrower) = &self.borrower {
            ensure_non_negative("borrower.gross_annual_income", borrower.gross_annual_income)?;
            ensure_non_negative("borrower.monthly_other_debts", borrower.monthly_other_debts)?;
        }
        Ok(())
    }
}
