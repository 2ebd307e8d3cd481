//! Land transfer tax bracket schedules and first-time buyer relief limits
//!
//! Bracketed jurisdictions are stored as marginal schedules keyed by a
//! schedule name ("ON", "TORONTO", "MONTREAL", ...). Fee-based provinces
//! (AB, SK, NL) are computed in `tax::land_transfer` and have no schedule.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::jurisdiction::{Municipality, Province};

/// Marginal rate applying to the portion of price above `threshold`
/// (up to the next bracket's threshold)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub threshold: f64,
    pub rate: f64,
}

/// All transfer tax schedules plus rebate and foreign buyer parameters
#[derive(Debug, Clone)]
pub struct LandTransferTables {
    schedules: HashMap<String, Vec<Bracket>>,

    /// Maximum Ontario first-time buyer refund
    pub ontario_fthb_rebate_max: f64,

    /// Maximum Toronto municipal first-time buyer rebate
    pub toronto_fthb_rebate_max: f64,

    /// BC first-time buyer exemption covers the tax on this much of the price
    pub bc_fthb_exempt_portion: f64,

    /// BC full exemption applies up to this price
    pub bc_fthb_full_limit: f64,

    /// BC exemption phases out to zero at this price
    pub bc_fthb_phase_out_limit: f64,

    /// Ontario non-resident speculation tax
    pub ontario_foreign_buyer_rate: f64,

    /// BC additional property transfer tax for foreign entities
    pub bc_foreign_buyer_rate: f64,
}

fn brackets(pairs: &[(f64, f64)]) -> Vec<Bracket> {
    pairs
        .iter()
        .map(|&(threshold, rate)| Bracket { threshold, rate })
        .collect()
}

impl LandTransferTables {
    /// Schedules in force for 2025 purchases
    pub fn current() -> Self {
        let mut schedules = HashMap::new();

        schedules.insert(
            "ON".to_string(),
            brackets(&[
                (0.0, 0.005),
                (55_000.0, 0.01),
                (250_000.0, 0.015),
                (400_000.0, 0.02),
                (2_000_000.0, 0.025),
            ]),
        );
        schedules.insert(
            "TORONTO".to_string(),
            brackets(&[
                (0.0, 0.005),
                (55_000.0, 0.01),
                (250_000.0, 0.015),
                (400_000.0, 0.02),
                (2_000_000.0, 0.025),
                (3_000_000.0, 0.035),
                (4_000_000.0, 0.045),
                (5_000_000.0, 0.055),
                (10_000_000.0, 0.065),
                (20_000_000.0, 0.075),
            ]),
        );
        schedules.insert(
            "BC".to_string(),
            brackets(&[
                (0.0, 0.01),
                (200_000.0, 0.02),
                (2_000_000.0, 0.03),
                (3_000_000.0, 0.05),
            ]),
        );
        schedules.insert(
            "QC".to_string(),
            brackets(&[(0.0, 0.005), (61_500.0, 0.01), (307_800.0, 0.015)]),
        );
        schedules.insert(
            "MONTREAL".to_string(),
            brackets(&[
                (0.0, 0.005),
                (61_500.0, 0.01),
                (307_800.0, 0.015),
                (552_300.0, 0.02),
                (1_104_700.0, 0.025),
                (2_136_500.0, 0.035),
                (3_113_000.0, 0.04),
            ]),
        );
        schedules.insert(
            "MB".to_string(),
            brackets(&[
                (0.0, 0.0),
                (30_000.0, 0.005),
                (90_000.0, 0.01),
                (150_000.0, 0.015),
                (200_000.0, 0.02),
            ]),
        );
        schedules.insert("NS".to_string(), brackets(&[(0.0, 0.015)]));
        schedules.insert("NB".to_string(), brackets(&[(0.0, 0.01)]));
        schedules.insert("PE".to_string(), brackets(&[(0.0, 0.01)]));

        Self::with_schedules(schedules)
    }

    /// Build from schedules (e.g. loaded from CSV) with current relief parameters
    pub fn with_schedules(mut schedules: HashMap<String, Vec<Bracket>>) -> Self {
        for schedule in schedules.values_mut() {
            schedule.sort_by(|a, b| a.threshold.total_cmp(&b.threshold));
        }

        Self {
            schedules,
            ontario_fthb_rebate_max: 4_000.0,
            toronto_fthb_rebate_max: 4_475.0,
            bc_fthb_exempt_portion: 500_000.0,
            bc_fthb_full_limit: 835_000.0,
            bc_fthb_phase_out_limit: 860_000.0,
            ontario_foreign_buyer_rate: 0.25,
            bc_foreign_buyer_rate: 0.20,
        }
    }

    /// Provincial schedule, None for fee-based or tax-free jurisdictions
    pub fn provincial(&self, province: Province) -> Option<&[Bracket]> {
        self.schedules.get(province.code()).map(Vec::as_slice)
    }

    /// Municipal schedule for a city
    pub fn municipal(&self, municipality: Municipality) -> Option<&[Bracket]> {
        let key = municipality.name().to_ascii_uppercase();
        self.schedules.get(&key).map(Vec::as_slice)
    }

    /// Schedule by its raw key
    pub fn schedule(&self, key: &str) -> Option<&[Bracket]> {
        self.schedules.get(&key.to_ascii_uppercase()).map(Vec::as_slice)
    }
}

impl Default for LandTransferTables {
    fn default() -> Self {
        Self::current()
    }
}
