//! Provincial and municipal land transfer tax
//!
//! Most provinces levy a marginal, bracketed tax on the purchase price.
//! Alberta, Saskatchewan and Newfoundland and Labrador charge land titles
//! registration fees instead; the territories charge neither.

use serde::{Deserialize, Serialize};

use crate::assumptions::{Bracket, LandTransferTables};
use crate::error::{AnalysisError, Result};
use crate::jurisdiction::{Municipality, Province};

/// Marginal tax over a bracket schedule
pub fn bracket_tax(price: f64, brackets: &[Bracket]) -> f64 {
    let mut tax = 0.0;
    for (idx, bracket) in brackets.iter().enumerate() {
        if price <= bracket.threshold {
            break;
        }
        let upper = brackets
            .get(idx + 1)
            .map(|next| next.threshold)
            .unwrap_or(f64::INFINITY);
        tax += (price.min(upper) - bracket.threshold) * bracket.rate;
    }
    tax
}

/// Purchase details for the transfer tax
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LttRequest {
    pub price: f64,
    pub province: Province,
    #[serde(default)]
    pub municipality: Option<Municipality>,
    #[serde(default)]
    pub first_time_buyer: bool,
    #[serde(default)]
    pub foreign_buyer: bool,
    /// Only used for Alberta's mortgage registration fee
    #[serde(default)]
    pub mortgage_amount: f64,
}

impl LttRequest {
    pub fn new(price: f64, province: Province) -> Self {
        Self {
            price,
            province,
            municipality: None,
            first_time_buyer: false,
            foreign_buyer: false,
            mortgage_amount: 0.0,
        }
    }
}

/// Tax owing on closing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LttBreakdown {
    pub provincial: f64,
    pub municipal: f64,
    pub provincial_rebate: f64,
    pub municipal_rebate: f64,
    pub foreign_buyer_tax: f64,
    /// Land titles fees in provinces without a transfer tax
    pub registration_fees: f64,
    pub total: f64,
}

impl LttBreakdown {
    fn finish(mut self) -> Self {
        self.total = self.provincial + self.municipal - self.provincial_rebate - self.municipal_rebate
            + self.foreign_buyer_tax
            + self.registration_fees;
        self
    }

    /// Effective rate on the purchase price
    pub fn effective_rate(&self, price: f64) -> f64 {
        if price > 0.0 {
            self.total / price
        } else {
            0.0
        }
    }
}

/// Calculate land transfer tax, rebates and fees for a purchase
pub fn calculate_land_transfer_tax(request: &LttRequest, tables: &LandTransferTables) -> Result<LttBreakdown> {
    if !request.price.is_finite() || request.price <= 0.0 {
        return Err(AnalysisError::invalid("price", "must be positive"));
    }
    if let Some(city) = request.municipality {
        if city.province() != request.province {
            return Err(AnalysisError::invalid(
                "municipality",
                format!("{} is not in {}", city.name(), request.province.name()),
            ));
        }
    }

    let price = request.price;
    let mut breakdown = LttBreakdown::default();

    match request.province {
        Province::Alberta => {
            breakdown.registration_fees =
                alberta_title_fee(price) + if request.mortgage_amount > 0.0 { alberta_title_fee(request.mortgage_amount) } else { 0.0 };
        }
        Province::Saskatchewan => breakdown.registration_fees = saskatchewan_title_fee(price),
        Province::NewfoundlandAndLabrador => breakdown.registration_fees = newfoundland_registration_fee(price),
        Province::Quebec if request.municipality == Some(Municipality::Montreal) => {
            // Montreal sets its own schedule in place of the provincial one
            breakdown.provincial = schedule_tax(price, tables.municipal(Municipality::Montreal), "MONTREAL")?;
        }
        province => {
            if let Some(schedule) = tables.provincial(province) {
                breakdown.provincial = bracket_tax(price, schedule);
            } else {
                log::debug!("no land transfer tax schedule for {}", province.name());
            }
        }
    }

    if request.municipality == Some(Municipality::Toronto) {
        breakdown.municipal = schedule_tax(price, tables.municipal(Municipality::Toronto), "TORONTO")?;
    }

    if request.first_time_buyer {
        apply_first_time_buyer_relief(request, tables, &mut breakdown);
    }

    if request.foreign_buyer {
        breakdown.foreign_buyer_tax = match request.province {
            Province::Ontario => price * tables.ontario_foreign_buyer_rate,
            Province::BritishColumbia => price * tables.bc_foreign_buyer_rate,
            _ => 0.0,
        };
    }

    Ok(breakdown.finish())
}

fn schedule_tax(price: f64, schedule: Option<&[Bracket]>, key: &str) -> Result<f64> {
    schedule
        .map(|brackets| bracket_tax(price, brackets))
        .ok_or_else(|| AnalysisError::Assumptions {
            file: "land_transfer_brackets.csv".to_string(),
            reason: format!("missing {} schedule", key),
        })
}

fn apply_first_time_buyer_relief(request: &LttRequest, tables: &LandTransferTables, breakdown: &mut LttBreakdown) {
    let price = request.price;
    match request.province {
        Province::Ontario => {
            breakdown.provincial_rebate = breakdown.provincial.min(tables.ontario_fthb_rebate_max);
            if request.municipality == Some(Municipality::Toronto) {
                breakdown.municipal_rebate = breakdown.municipal.min(tables.toronto_fthb_rebate_max);
            }
        }
        Province::BritishColumbia => {
            let exempt_tax = tables
                .provincial(Province::BritishColumbia)
                .map(|s| bracket_tax(price.min(tables.bc_fthb_exempt_portion), s))
                .unwrap_or(0.0);
            let exemption = if price <= tables.bc_fthb_full_limit {
                exempt_tax
            } else if price < tables.bc_fthb_phase_out_limit {
                let span = tables.bc_fthb_phase_out_limit - tables.bc_fthb_full_limit;
                exempt_tax * (tables.bc_fthb_phase_out_limit - price) / span
            } else {
                0.0
            };
            breakdown.provincial_rebate = exemption.min(breakdown.provincial);
        }
        Province::PrinceEdwardIsland => breakdown.provincial_rebate = breakdown.provincial,
        _ => {}
    }
}

/// $50 plus $5 for every $5,000 or part thereof
fn alberta_title_fee(amount: f64) -> f64 {
    50.0 + 5.0 * (amount / 5_000.0).ceil()
}

fn saskatchewan_title_fee(value: f64) -> f64 {
    if value <= 500.0 {
        0.0
    } else if value <= 6_300.0 {
        25.0
    } else {
        value * 0.003
    }
}

/// $100 for the first $500 plus $0.40 per $100 or part thereof above
fn newfoundland_registration_fee(value: f64) -> f64 {
    100.0 + 0.40 * ((value - 500.0).max(0.0) / 100.0).ceil()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tables() -> LandTransferTables {
        LandTransferTables::current()
    }

    #[test]
    fn test_ontario_brackets() {
        // 55k*0.5% + 195k*1% + 150k*1.5% + 100k*2% = 275 + 1950 + 2250 + 2000
        let req = LttRequest::new(500_000.0, Province::Ontario);
        let ltt = calculate_land_transfer_tax(&req, &tables()).unwrap();
        assert_relative_eq!(ltt.provincial, 6_475.0, epsilon = 1e-9);
        assert_eq!(ltt.municipal, 0.0);
        assert_relative_eq!(ltt.total, 6_475.0, epsilon = 1e-9);
    }

    #[test]
    fn test_toronto_doubles_up_with_rebates() {
        let req = LttRequest {
            municipality: Some(Municipality::Toronto),
            first_time_buyer: true,
            ..LttRequest::new(800_000.0, Province::Ontario)
        };
        let ltt = calculate_land_transfer_tax(&req, &tables()).unwrap();

        assert_relative_eq!(ltt.provincial, 12_475.0, epsilon = 1e-9);
        assert_relative_eq!(ltt.municipal, 12_475.0, epsilon = 1e-9);
        assert_relative_eq!(ltt.provincial_rebate, 4_000.0);
        assert_relative_eq!(ltt.municipal_rebate, 4_475.0);
        assert_relative_eq!(ltt.total, 24_950.0 - 8_475.0, epsilon = 1e-9);
    }

    #[test]
    fn test_toronto_luxury_brackets() {
        let req = LttRequest {
            municipality: Some(Municipality::Toronto),
            ..LttRequest::new(3_500_000.0, Province::Ontario)
        };
        let ltt = calculate_land_transfer_tax(&req, &tables()).unwrap();
        // Ontario stops at 2.5%; Toronto adds 3.5% on the portion above $3M
        assert_relative_eq!(ltt.municipal - ltt.provincial, 500_000.0 * 0.01, epsilon = 1e-6);
    }

    #[test]
    fn test_bc_first_time_buyer_exemption() {
        let t = tables();
        let full = LttRequest {
            first_time_buyer: true,
            ..LttRequest::new(450_000.0, Province::BritishColumbia)
        };
        let ltt = calculate_land_transfer_tax(&full, &t).unwrap();
        assert_relative_eq!(ltt.provincial, 7_000.0, epsilon = 1e-9);
        assert_relative_eq!(ltt.total, 0.0, epsilon = 1e-9);

        // Above $500k only the tax on the first $500k is exempt
        let partial = LttRequest {
            first_time_buyer: true,
            ..LttRequest::new(700_000.0, Province::BritishColumbia)
        };
        let ltt = calculate_land_transfer_tax(&partial, &t).unwrap();
        assert_relative_eq!(ltt.provincial_rebate, 8_000.0, epsilon = 1e-9);
        assert_relative_eq!(ltt.total, 4_000.0, epsilon = 1e-9);

        // Halfway through the phase-out
        let phase = LttRequest {
            first_time_buyer: true,
            ..LttRequest::new(847_500.0, Province::BritishColumbia)
        };
        let ltt = calculate_land_transfer_tax(&phase, &t).unwrap();
        assert_relative_eq!(ltt.provincial_rebate, 4_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_montreal_replaces_quebec_schedule() {
        let t = tables();
        let qc = calculate_land_transfer_tax(&LttRequest::new(600_000.0, Province::Quebec), &t).unwrap();
        let mtl = calculate_land_transfer_tax(
            &LttRequest {
                municipality: Some(Municipality::Montreal),
                ..LttRequest::new(600_000.0, Province::Quebec)
            },
            &t,
        )
        .unwrap();

        assert_relative_eq!(mtl.provincial - qc.provincial, 47_700.0 * 0.005, epsilon = 1e-6);
        assert_eq!(mtl.municipal, 0.0);
    }

    #[test]
    fn test_fee_based_provinces() {
        let t = tables();

        let ab = LttRequest {
            mortgage_amount: 400_000.0,
            ..LttRequest::new(500_000.0, Province::Alberta)
        };
        let ltt = calculate_land_transfer_tax(&ab, &t).unwrap();
        assert_relative_eq!(ltt.registration_fees, (50.0 + 500.0) + (50.0 + 400.0));
        assert_eq!(ltt.provincial, 0.0);

        let sk = calculate_land_transfer_tax(&LttRequest::new(300_000.0, Province::Saskatchewan), &t).unwrap();
        assert_relative_eq!(sk.total, 900.0, epsilon = 1e-9);

        let nl = calculate_land_transfer_tax(&LttRequest::new(300_000.0, Province::NewfoundlandAndLabrador), &t).unwrap();
        assert_relative_eq!(nl.total, 100.0 + 0.40 * 2_995.0, epsilon = 1e-9);

        let yt = calculate_land_transfer_tax(&LttRequest::new(300_000.0, Province::Yukon), &t).unwrap();
        assert_eq!(yt.total, 0.0);
    }

    #[test]
    fn test_foreign_buyer_tax() {
        let req = LttRequest {
            foreign_buyer: true,
            ..LttRequest::new(1_000_000.0, Province::Ontario)
        };
        let ltt = calculate_land_transfer_tax(&req, &tables()).unwrap();
        assert_relative_eq!(ltt.foreign_buyer_tax, 250_000.0);
        assert!(ltt.total > 250_000.0);
    }

    #[test]
    fn test_bc_foreign_buyer_tax() {
        let t = tables();
        let req = LttRequest {
            foreign_buyer: true,
            ..LttRequest::new(1_000_000.0, Province::BritishColumbia)
        };
        let ltt = calculate_land_transfer_tax(&req, &t).unwrap();
        assert_relative_eq!(ltt.foreign_buyer_tax, 200_000.0, epsilon = 1e-9);
        assert_relative_eq!(ltt.total, ltt.provincial + 200_000.0, epsilon = 1e-9);

        let domestic = calculate_land_transfer_tax(&LttRequest::new(1_000_000.0, Province::BritishColumbia), &t).unwrap();
        assert_relative_eq!(domestic.provincial, ltt.provincial, epsilon = 1e-9);
        assert_eq!(domestic.foreign_buyer_tax, 0.0);
    }

    #[test]
    fn test_pei_first_time_buyer_fully_exempt() {
        let t = tables();
        let buyer = LttRequest {
            first_time_buyer: true,
            ..LttRequest::new(300_000.0, Province::PrinceEdwardIsland)
        };
        let ltt = calculate_land_transfer_tax(&buyer, &t).unwrap();
        assert_relative_eq!(ltt.provincial, 3_000.0, epsilon = 1e-9);
        assert_relative_eq!(ltt.provincial_rebate, 3_000.0, epsilon = 1e-9);
        assert_relative_eq!(ltt.total, 0.0, epsilon = 1e-9);

        let repeat = calculate_land_transfer_tax(&LttRequest::new(300_000.0, Province::PrinceEdwardIsland), &t).unwrap();
        assert_relative_eq!(repeat.total, 3_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_requests() {
        let t = tables();
        assert!(calculate_land_transfer_tax(&LttRequest::new(0.0, Province::Ontario), &t).is_err());

        let wrong_city = LttRequest {
            municipality: Some(Municipality::Toronto),
            ..LttRequest::new(500_000.0, Province::BritishColumbia)
        };
        assert!(calculate_land_transfer_tax(&wrong_city, &t).is_err());
    }

    #[test]
    fn test_bracket_tax_boundaries() {
        let brackets = [
            Bracket { threshold: 0.0, rate: 0.01 },
            Bracket { threshold: 100.0, rate: 0.02 },
        ];
        assert_eq!(bracket_tax(0.0, &brackets), 0.0);
        assert_relative_eq!(bracket_tax(100.0, &brackets), 1.0);
        assert_relative_eq!(bracket_tax(200.0, &brackets), 3.0);
    }
}
