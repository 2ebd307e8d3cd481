//! CMHC mortgage default insurance premium bands and program limits

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::AnalysisError;
use crate::jurisdiction::Province;

/// Where the down payment comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DownPaymentSource {
    /// Savings, RRSP, sale of property, non-repayable gift
    #[default]
    Traditional,
    /// Borrowed funds, lines of credit, lender incentives
    NonTraditional,
}

impl FromStr for DownPaymentSource {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "traditional" => Ok(DownPaymentSource::Traditional),
            "non_traditional" | "borrowed" => Ok(DownPaymentSource::NonTraditional),
            other => Err(AnalysisError::invalid(
                "down_payment_source",
                format!("unknown down payment source '{}'", other),
            )),
        }
    }
}

/// One loan-to-value band of the premium table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CmhcBand {
    /// Upper bound of the band (inclusive), e.g. 0.80
    pub max_ltv: f64,
    /// Premium as a share of the loan
    pub standard_rate: f64,
    /// Premium when the down payment is borrowed
    pub non_traditional_rate: f64,
}

/// Premium schedule and homeowner program limits
#[derive(Debug, Clone)]
pub struct CmhcPremiumTable {
    /// Bands sorted by ascending max LTV
    bands: Vec<CmhcBand>,

    /// Purchase price at or above which insurance is unavailable
    pub insured_price_cap: f64,

    /// Added to the premium rate when amortization exceeds the standard limit
    pub extended_amortization_surcharge: f64,

    /// Longest amortization without the surcharge (years)
    pub standard_amortization_years: u32,

    /// Longest amortization CMHC will insure (years)
    pub max_insured_amortization_years: u32,

    /// LTV above which insurance becomes mandatory
    pub conventional_ltv_threshold: f64,

    /// Homeowner program covers 1-4 unit properties
    pub max_insured_units: u32,

    /// Provincial sales tax charged on the premium
    provincial_tax: HashMap<Province, f64>,
}

impl CmhcPremiumTable {
    /// Premium schedule in force since the December 2024 program changes
    pub fn current() -> Self {
        Self::with_bands(vec![
            CmhcBand { max_ltv: 0.65, standard_rate: 0.0060, non_traditional_rate: 0.0060 },
            CmhcBand { max_ltv: 0.75, standard_rate: 0.0170, non_traditional_rate: 0.0170 },
            CmhcBand { max_ltv: 0.80, standard_rate: 0.0240, non_traditional_rate: 0.0240 },
            CmhcBand { max_ltv: 0.85, standard_rate: 0.0280, non_traditional_rate: 0.0280 },
            CmhcBand { max_ltv: 0.90, standard_rate: 0.0310, non_traditional_rate: 0.0310 },
            CmhcBand { max_ltv: 0.95, standard_rate: 0.0400, non_traditional_rate: 0.0450 },
        ])
    }

    /// Build a table from bands (e.g. loaded from CSV) with current program limits
    pub fn with_bands(mut bands: Vec<CmhcBand>) -> Self {
        bands.sort_by(|a, b| a.max_ltv.total_cmp(&b.max_ltv));

        let mut provincial_tax = HashMap::new();
        provincial_tax.insert(Province::Ontario, 0.08);
        provincial_tax.insert(Province::Quebec, 0.09);
        provincial_tax.insert(Province::Saskatchewan, 0.06);

        Self {
            bands,
            insured_price_cap: 1_500_000.0,
            extended_amortization_surcharge: 0.0020,
            standard_amortization_years: 25,
            max_insured_amortization_years: 30,
            conventional_ltv_threshold: 0.80,
            max_insured_units: 4,
            provincial_tax,
        }
    }

    /// Premium rate for a loan-to-value ratio, None when above the highest band
    pub fn premium_rate(&self, ltv: f64, source: DownPaymentSource) -> Option<f64> {
        self.bands
            .iter()
            .find(|band| ltv <= band.max_ltv + 1e-9)
            .map(|band| match source {
                DownPaymentSource::Traditional => band.standard_rate,
                DownPaymentSource::NonTraditional => band.non_traditional_rate,
            })
    }

    /// Highest insurable loan-to-value
    pub fn max_insured_ltv(&self) -> f64 {
        self.bands.last().map(|b| b.max_ltv).unwrap_or(0.0)
    }

    /// Sales tax rate applied to the premium in a province (0 where none)
    pub fn provincial_tax_rate(&self, province: Province) -> f64 {
        self.provincial_tax.get(&province).copied().unwrap_or(0.0)
    }

    pub fn bands(&self) -> &[CmhcBand] {
        &self.bands
    }
}

impl Default for CmhcPremiumTable {
    fn default() -> Self {
        Self::current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_premium_bands() {
        let table = CmhcPremiumTable::current();

        assert_eq!(table.premium_rate(0.60, DownPaymentSource::Traditional), Some(0.0060));
        assert_eq!(table.premium_rate(0.75, DownPaymentSource::Traditional), Some(0.0170));
        assert_eq!(table.premium_rate(0.8001, DownPaymentSource::Traditional), Some(0.0280));
        assert_eq!(table.premium_rate(0.90, DownPaymentSource::Traditional), Some(0.0310));
        assert_eq!(table.premium_rate(0.95, DownPaymentSource::Traditional), Some(0.0400));
        assert_eq!(table.premium_rate(0.95, DownPaymentSource::NonTraditional), Some(0.0450));
        assert_eq!(table.premium_rate(0.96, DownPaymentSource::Traditional), None);
    }

    #[test]
    fn test_provincial_tax() {
        let table = CmhcPremiumTable::current();

        assert_eq!(table.provincial_tax_rate(Province::Ontario), 0.08);
        assert_eq!(table.provincial_tax_rate(Province::Quebec), 0.09);
        assert_eq!(table.provincial_tax_rate(Province::Alberta), 0.0);
    }

    #[test]
    fn test_bands_sorted_on_construction() {
        let table = CmhcPremiumTable::with_bands(vec![
            CmhcBand { max_ltv: 0.95, standard_rate: 0.04, non_traditional_rate: 0.045 },
            CmhcBand { max_ltv: 0.85, standard_rate: 0.028, non_traditional_rate: 0.028 },
        ]);
        assert_eq!(table.premium_rate(0.84, DownPaymentSource::Traditional), Some(0.028));
        assert_eq!(table.max_insured_ltv(), 0.95);
    }
}
