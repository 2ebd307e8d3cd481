//! OSFI minimum qualifying rate and debt service limits

use serde::{Deserialize, Serialize};

/// Mortgage qualification rules (B-20 guideline and insurer GDS/TDS limits)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressTestRules {
    /// Added to the contract rate, e.g. 0.02
    pub buffer: f64,

    /// Minimum qualifying rate regardless of contract rate
    pub floor_rate: f64,

    /// Maximum gross debt service ratio
    pub gds_limit: f64,

    /// Maximum total debt service ratio
    pub tds_limit: f64,

    /// Share of rental income lenders add to qualifying income
    pub rental_income_offset: f64,

    /// Share of condo fees counted in housing costs
    pub condo_fee_share: f64,
}

impl Default for StressTestRules {
    fn default() -> Self {
        Self {
            buffer: 0.02,
            floor_rate: 0.0525,
            gds_limit: 0.39,
            tds_limit: 0.44,
            rental_income_offset: 0.50,
            condo_fee_share: 0.50,
        }
    }
}

impl StressTestRules {
    /// Override individual rules from (key, value) pairs, ignoring unknown keys
    pub fn apply_overrides(&mut self, values: &[(String, f64)]) {
        for (key, value) in values {
            match key.as_str() {
                "buffer" => self.buffer = *value,
                "floor_rate" => self.floor_rate = *value,
                "gds_limit" => self.gds_limit = *value,
                "tds_limit" => self.tds_limit = *value,
                "rental_income_offset" => self.rental_income_offset = *value,
                "condo_fee_share" => self.condo_fee_share = *value,
                other => log::warn!("ignoring unknown stress test rule '{}'", other),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let mut rules = StressTestRules::default();
        rules.apply_overrides(&[
            ("floor_rate".to_string(), 0.0575),
            ("unknown".to_string(), 1.0),
        ]);

        assert_eq!(rules.floor_rate, 0.0575);
        assert_eq!(rules.buffer, 0.02);
    }
}
