//! Load deals from a CSV file, one deal per row
//!
//! Only `name`, `purchase_price`, `province`, `interest_rate` and
//! `monthly_rent` are required; any other column may be absent or blank
//! and falls back to the `DealInput` default.

use csv::Reader;
use std::io;
use std::path::Path;

use super::input::{BorrowerProfile, DealInput, PropertyType};
use crate::assumptions::DownPaymentSource;
use crate::error::Result;
use crate::jurisdiction::{Municipality, Province};
use crate::mortgage::{Compounding, PaymentFrequency};

/// Raw CSV row
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    name: String,
    purchase_price: f64,
    province: String,
    interest_rate: f64,
    monthly_rent: f64,
    #[serde(default)]
    municipality: Option<String>,
    #[serde(default)]
    property_type: Option<String>,
    #[serde(default)]
    units: Option<u32>,
    #[serde(default)]
    down_payment_percent: Option<f64>,
    #[serde(default)]
    amortization_years: Option<u32>,
    #[serde(default)]
    payment_frequency: Option<String>,
    #[serde(default)]
    term_years: Option<u32>,
    #[serde(default)]
    compounding: Option<String>,
    #[serde(default)]
    down_payment_source: Option<String>,
    #[serde(default)]
    other_monthly_income: Option<f64>,
    #[serde(default)]
    vacancy_rate: Option<f64>,
    #[serde(default)]
    annual_property_tax: Option<f64>,
    #[serde(default)]
    annual_insurance: Option<f64>,
    #[serde(default)]
    monthly_utilities: Option<f64>,
    #[serde(default)]
    monthly_condo_fees: Option<f64>,
    #[serde(default)]
    maintenance_percent: Option<f64>,
    #[serde(default)]
    management_percent: Option<f64>,
    #[serde(default)]
    capex_reserve_percent: Option<f64>,
    #[serde(default)]
    other_annual_expenses: Option<f64>,
    #[serde(default)]
    legal_fees: Option<f64>,
    #[serde(default)]
    inspection_fee: Option<f64>,
    #[serde(default)]
    appraisal_fee: Option<f64>,
    #[serde(default)]
    other_closing_costs: Option<f64>,
    #[serde(default)]
    renovation_budget: Option<f64>,
    #[serde(default)]
    owner_occupied: Option<bool>,
    #[serde(default)]
    first_time_buyer: Option<bool>,
    #[serde(default)]
    foreign_buyer: Option<bool>,
    #[serde(default)]
    appreciation_rate: Option<f64>,
    #[serde(default)]
    rent_growth_rate: Option<f64>,
    #[serde(default)]
    expense_growth_rate: Option<f64>,
    #[serde(default)]
    hold_years: Option<u32>,
    #[serde(default)]
    selling_cost_percent: Option<f64>,
    #[serde(default)]
    gross_annual_income: Option<f64>,
    #[serde(default)]
    monthly_other_debts: Option<f64>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl CsvRow {
    fn to_deal(self) -> Result<DealInput> {
        let province: Province = self.province.parse()?;
        let mut deal = DealInput::new(&self.name, self.purchase_price, self.monthly_rent, self.interest_rate, province);

        if let Some(city) = non_blank(self.municipality) {
            deal.municipality = Some(city.parse::<Municipality>()?);
        }
        if let Some(kind) = non_blank(self.property_type) {
            deal.property_type = Some(kind.parse::<PropertyType>()?);
        }
        if let Some(frequency) = non_blank(self.payment_frequency) {
            deal.payment_frequency = frequency.parse::<PaymentFrequency>()?;
        }
        if let Some(compounding) = non_blank(self.compounding) {
            deal.compounding = compounding.parse::<Compounding>()?;
        }
        if let Some(source) = non_blank(self.down_payment_source) {
            deal.down_payment_source = source.parse::<DownPaymentSource>()?;
        }

        macro_rules! apply {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = self.$field {
                    deal.$field = value;
                })*
            };
        }
        apply!(
            units,
            down_payment_percent,
            amortization_years,
            term_years,
            other_monthly_income,
            vacancy_rate,
            annual_property_tax,
            annual_insurance,
            monthly_utilities,
            monthly_condo_fees,
            maintenance_percent,
            management_percent,
            capex_reserve_percent,
            other_annual_expenses,
            legal_fees,
            inspection_fee,
            appraisal_fee,
            other_closing_costs,
            renovation_budget,
            owner_occupied,
            first_time_buyer,
            foreign_buyer,
            appreciation_rate,
            rent_growth_rate,
            expense_growth_rate,
            hold_years,
            selling_cost_percent,
        );

        if let Some(income) = self.gross_annual_income {
            deal.borrower = Some(BorrowerProfile {
                gross_annual_income: income,
                monthly_other_debts: self.monthly_other_debts.unwrap_or(0.0),
            });
        }

        Ok(deal)
    }
}

/// Load all deals from a CSV file
pub fn load_deals<P: AsRef<Path>>(path: P) -> Result<Vec<DealInput>> {
    let reader = Reader::from_path(path)?;
    collect_deals(reader)
}

/// Load deals from any CSV source (stdin, request bodies)
pub fn load_deals_from_reader<R: io::Read>(source: R) -> Result<Vec<DealInput>> {
    collect_deals(Reader::from_reader(source))
}

fn collect_deals<R: io::Read>(mut reader: Reader<R>) -> Result<Vec<DealInput>> {
    let mut deals = Vec::new();
    for result in reader.deserialize() {
        let row: CsvRow = result?;
        deals.push(row.to_deal()?);
    }
    log::info!("loaded {} deals", deals.len());
    Ok(deals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_minimal_columns() {
        let data = "\
name,purchase_price,province,interest_rate,monthly_rent
Halifax condo,350000,NS,0.0489,2100
Calgary house,620000,Alberta,0.0479,3000
";
        let deals = load_deals_from_reader(data.as_bytes()).unwrap();
        assert_eq!(deals.len(), 2);
        assert_eq!(deals[0].province, Province::NovaScotia);
        assert_eq!(deals[1].province, Province::Alberta);
        assert_eq!(deals[0].down_payment_percent, 0.20);
        assert!(deals[0].borrower.is_none());
    }

    #[test]
    fn test_optional_columns_and_blanks() {
        let data = "\
name,purchase_price,province,interest_rate,monthly_rent,municipality,units,vacancy_rate,payment_frequency,gross_annual_income
Triplex,900000,ON,0.05,6300,Toronto,3,0.03,accelerated_bi_weekly,180000
Bungalow,450000,ON,0.05,2400,,,,,
";
        let deals = load_deals_from_reader(data.as_bytes()).unwrap();

        let triplex = &deals[0];
        assert_eq!(triplex.municipality, Some(Municipality::Toronto));
        assert_eq!(triplex.units, 3);
        assert_eq!(triplex.vacancy_rate, 0.03);
        assert_eq!(triplex.payment_frequency, PaymentFrequency::AcceleratedBiWeekly);
        assert_eq!(triplex.borrower.map(|b| b.gross_annual_income), Some(180_000.0));

        let bungalow = &deals[1];
        assert_eq!(bungalow.municipality, None);
        assert_eq!(bungalow.units, 1);
        assert_eq!(bungalow.vacancy_rate, 0.04);
    }

    #[test]
    fn test_closing_cost_and_financing_columns() {
        let data = "\
name,purchase_price,province,interest_rate,monthly_rent,compounding,down_payment_source,legal_fees,inspection_fee,appraisal_fee,other_closing_costs,selling_cost_percent
Variable duplex,700000,MB,0.055,4100,variable,non-traditional,2200,650,0,1200,0.045
Fixed house,500000,MB,0.05,2700,,,,,,,
";
        let deals = load_deals_from_reader(data.as_bytes()).unwrap();

        let duplex = &deals[0];
        assert_eq!(duplex.compounding, Compounding::Monthly);
        assert_eq!(duplex.down_payment_source, DownPaymentSource::NonTraditional);
        assert_eq!(duplex.legal_fees, 2_200.0);
        assert_eq!(duplex.inspection_fee, 650.0);
        assert_eq!(duplex.appraisal_fee, 0.0);
        assert_eq!(duplex.other_closing_costs, 1_200.0);
        assert_eq!(duplex.selling_cost_percent, 0.045);

        let defaults = DealInput::new("", 1.0, 1.0, 0.05, Province::Manitoba);
        let house = &deals[1];
        assert_eq!(house.compounding, Compounding::SemiAnnual);
        assert_eq!(house.down_payment_source, DownPaymentSource::Traditional);
        assert_eq!(house.legal_fees, defaults.legal_fees);
        assert_eq!(house.selling_cost_percent, defaults.selling_cost_percent);
    }

    #[test]
    fn test_unknown_province_rejected() {
        let data = "name,purchase_price,province,interest_rate,monthly_rent\nX,1,ZZ,0.05,1\n";
        assert!(load_deals_from_reader(data.as_bytes()).is_err());
    }

    #[test]
    fn test_sample_portfolio() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/portfolio.csv");
        let deals = load_deals(path).unwrap();
        assert!(deals.len() >= 3);
        assert!(deals.iter().all(|d| d.validate().is_ok()));
    }
}
