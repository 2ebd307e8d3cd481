//! CMHC mortgage default insurance
//!
//! High-ratio mortgages (LTV above 80%) must be insured. The premium is a
//! percentage of the loan taken from the LTV band, is added to the mortgage,
//! and some provinces charge sales tax on it that is payable at closing.

use serde::{Deserialize, Serialize};

use crate::assumptions::{CmhcPremiumTable, DownPaymentSource};
use crate::error::{ensure_non_negative, AnalysisError, Result};
use crate::jurisdiction::Province;

/// Minimum down payment for a purchase price
///
/// 5% of the first $500,000, 10% of the portion up to the insured price cap,
/// and 20% of the full price at or above the cap.
pub fn minimum_down_payment(price: f64, table: &CmhcPremiumTable) -> f64 {
    if price >= table.insured_price_cap {
        price * 0.20
    } else if price <= 500_000.0 {
        price * 0.05
    } else {
        500_000.0 * 0.05 + (price - 500_000.0) * 0.10
    }
}

/// Purchase and loan details needed to price insurance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmhcRequest {
    pub purchase_price: f64,
    pub down_payment: f64,
    #[serde(default = "default_amortization")]
    pub amortization_years: u32,
    pub province: Province,
    #[serde(default)]
    pub source: DownPaymentSource,
    #[serde(default = "default_true")]
    pub owner_occupied: bool,
    #[serde(default = "default_units")]
    pub units: u32,
}

fn default_amortization() -> u32 {
    25
}

fn default_true() -> bool {
    true
}

fn default_units() -> u32 {
    1
}

/// Insurance premium and resulting loan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmhcResult {
    /// Loan before the premium
    pub loan_amount: f64,
    pub ltv: f64,
    pub insurance_required: bool,
    pub premium_rate: f64,
    pub premium: f64,
    /// Provincial sales tax on the premium (paid in cash at closing)
    pub provincial_tax: f64,
    /// Loan with the premium added
    pub insured_loan: f64,
    pub minimum_down_payment: f64,
}

/// Price the default insurance for a purchase
pub fn calculate(request: &CmhcRequest, table: &CmhcPremiumTable) -> Result<CmhcResult> {
    if !request.purchase_price.is_finite() || request.purchase_price <= 0.0 {
        return Err(AnalysisError::invalid("purchase_price", "must be positive"));
    }
    ensure_non_negative("down_payment", request.down_payment)?;
    if request.down_payment > request.purchase_price {
        return Err(AnalysisError::invalid("down_payment", "exceeds the purchase price"));
    }

    let loan_amount = request.purchase_price - request.down_payment;
    let ltv = loan_amount / request.purchase_price;
    let minimum = minimum_down_payment(request.purchase_price, table);

    if ltv <= table.conventional_ltv_threshold + 1e-9 {
        return Ok(CmhcResult {
            loan_amount,
            ltv,
            insurance_required: false,
            premium_rate: 0.0,
            premium: 0.0,
            provincial_tax: 0.0,
            insured_loan: loan_amount,
            minimum_down_payment: minimum,
        });
    }

    check_eligibility(request, table, minimum)?;

    let mut premium_rate = table
        .premium_rate(ltv, request.source)
        .ok_or(AnalysisError::InsufficientDownPayment {
            down_payment: request.down_payment,
            minimum,
        })?;
    if request.amortization_years > table.standard_amortization_years {
        premium_rate += table.extended_amortization_surcharge;
    }

    let premium = loan_amount * premium_rate;
    let provincial_tax = premium * table.provincial_tax_rate(request.province);

    log::debug!(
        "CMHC premium {:.2}% on ${:.0} (LTV {:.2}%)",
        premium_rate * 100.0,
        loan_amount,
        ltv * 100.0
    );

    Ok(CmhcResult {
        loan_amount,
        ltv,
        insurance_required: true,
        premium_rate,
        premium,
        provincial_tax,
        insured_loan: loan_amount + premium,
        minimum_down_payment: minimum,
    })
}

fn check_eligibility(request: &CmhcRequest, table: &CmhcPremiumTable, minimum: f64) -> Result<()> {
    if request.purchase_price >= table.insured_price_cap {
        return Err(AnalysisError::InsuranceUnavailable(format!(
            "purchase price ${:.0} is at or above the ${:.0} insured price cap; 20% down is required",
            request.purchase_price, table.insured_price_cap
        )));
    }
    if request.down_payment + 0.005 < minimum {
        return Err(AnalysisError::InsufficientDownPayment {
            down_payment: request.down_payment,
            minimum,
        });
    }
    if request.amortization_years > table.max_insured_amortization_years {
        return Err(AnalysisError::InsuranceUnavailable(format!(
            "amortization of {} years exceeds the {} year insured maximum",
            request.amortization_years, table.max_insured_amortization_years
        )));
    }
    if !request.owner_occupied {
        return Err(AnalysisError::InsuranceUnavailable(
            "non-owner-occupied rental purchases require at least 20% down".to_string(),
        ));
    }
    if request.units > table.max_insured_units {
        return Err(AnalysisError::InsuranceUnavailable(format!(
            "{} units exceeds the {} unit homeowner program limit",
            request.units, table.max_insured_units
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn request(price: f64, down: f64) -> CmhcRequest {
        CmhcRequest {
            purchase_price: price,
            down_payment: down,
            amortization_years: 25,
            province: Province::Ontario,
            source: DownPaymentSource::Traditional,
            owner_occupied: true,
            units: 1,
        }
    }

    #[test]
    fn test_minimum_down_payment() {
        let table = CmhcPremiumTable::current();

        assert_relative_eq!(minimum_down_payment(400_000.0, &table), 20_000.0);
        assert_relative_eq!(minimum_down_payment(700_000.0, &table), 45_000.0);
        assert_relative_eq!(minimum_down_payment(1_499_999.0, &table), 124_999.9, epsilon = 1e-6);
        assert_relative_eq!(minimum_down_payment(1_500_000.0, &table), 300_000.0);
    }

    #[test]
    fn test_conventional_has_no_premium() {
        let table = CmhcPremiumTable::current();
        let result = calculate(&request(500_000.0, 100_000.0), &table).unwrap();

        assert!(!result.insurance_required);
        assert_eq!(result.premium, 0.0);
        assert_relative_eq!(result.insured_loan, 400_000.0);
    }

    #[test]
    fn test_five_percent_down_in_ontario() {
        let table = CmhcPremiumTable::current();
        let result = calculate(&request(500_000.0, 25_000.0), &table).unwrap();

        assert!(result.insurance_required);
        assert_relative_eq!(result.premium_rate, 0.04);
        assert_relative_eq!(result.premium, 19_000.0, epsilon = 1e-9);
        assert_relative_eq!(result.insured_loan, 494_000.0, epsilon = 1e-9);
        assert_relative_eq!(result.provincial_tax, 1_520.0, epsilon = 1e-9);
    }

    #[test]
    fn test_extended_amortization_surcharge() {
        let table = CmhcPremiumTable::current();
        let mut req = request(600_000.0, 60_000.0);
        req.amortization_years = 30;
        req.province = Province::Alberta;

        let result = calculate(&req, &table).unwrap();
        assert_relative_eq!(result.premium_rate, 0.0310 + 0.0020, epsilon = 1e-12);
        assert_eq!(result.provincial_tax, 0.0);
    }

    #[test]
    fn test_ineligible_purchases() {
        let table = CmhcPremiumTable::current();

        // Below the blended minimum for a $700k purchase
        let err = calculate(&request(700_000.0, 35_000.0), &table).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientDownPayment { .. }));

        // Over the price cap
        let err = calculate(&request(1_600_000.0, 200_000.0), &table).unwrap_err();
        assert!(matches!(err, AnalysisError::InsuranceUnavailable(_)));

        // Investor purchase
        let mut investor = request(500_000.0, 50_000.0);
        investor.owner_occupied = false;
        assert!(matches!(
            calculate(&investor, &table).unwrap_err(),
            AnalysisError::InsuranceUnavailable(_)
        ));

        // 35-year amortization
        let mut long = request(500_000.0, 50_000.0);
        long.amortization_years = 35;
        assert!(calculate(&long, &table).is_err());
    }

    #[test]
    fn test_homeowner_program_unit_limit() {
        let table = CmhcPremiumTable::current();

        let mut fourplex = request(500_000.0, 50_000.0);
        fourplex.units = 4;
        let result = calculate(&fourplex, &table).unwrap();
        assert_relative_eq!(result.premium, 450_000.0 * 0.031, epsilon = 1e-9);

        let mut fiveplex = fourplex.clone();
        fiveplex.units = 5;
        let err = calculate(&fiveplex, &table).unwrap_err();
        assert!(matches!(err, AnalysisError::InsuranceUnavailable(ref m) if m.contains("5 units")));

        // Conventional loans are not limited by unit count
        let mut conventional = fiveplex;
        conventional.down_payment = 100_000.0;
        let result = calculate(&conventional, &table).unwrap();
        assert_relative_eq!(result.insured_loan, 400_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_non_traditional_down_payment() {
        let table = CmhcPremiumTable::current();
        let mut req = request(400_000.0, 20_000.0);
        req.source = DownPaymentSource::NonTraditional;
        req.province = Province::Quebec;

        let result = calculate(&req, &table).unwrap();
        assert_relative_eq!(result.premium_rate, 0.045);
        assert_relative_eq!(result.provincial_tax, 380_000.0 * 0.045 * 0.09, epsilon = 1e-9);
    }
}
