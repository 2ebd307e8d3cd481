//! Running state of a property through the hold period

use super::engine::{ProjectionBasis, ProjectionConfig};

/// Income, expense and value levels at the start of a projection year
#[derive(Debug, Clone)]
pub struct HoldState {
    /// Current projection year (1-indexed)
    pub year: u32,

    /// Annual rent at full occupancy
    pub gross_potential_rent: f64,

    /// Parking, laundry and other non-rent income
    pub other_income: f64,

    pub operating_expenses: f64,

    /// Market value at the end of the current year
    pub property_value: f64,
}

impl HoldState {
    /// Year-one levels from the acquisition basis
    pub fn from_basis(basis: &ProjectionBasis, config: &ProjectionConfig) -> Self {
        Self {
            year: 1,
            gross_potential_rent: basis.gross_potential_rent,
            other_income: basis.other_income,
            operating_expenses: basis.operating_expenses,
            property_value: basis.purchase_price * (1.0 + config.appreciation_rate),
        }
    }

    /// Grow income, expenses and value into the next year
    pub fn advance_year(&mut self, config: &ProjectionConfig) {
        self.year += 1;
        self.gross_potential_rent *= 1.0 + config.rent_growth_rate;
        self.other_income *= 1.0 + config.rent_growth_rate;
        self.operating_expenses *= 1.0 + config.expense_growth_rate;
        self.property_value *= 1.0 + config.appreciation_rate;
    }

    pub fn gross_potential_income(&self) -> f64 {
        self.gross_potential_rent + self.other_income
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_year_compounds_growth() {
        let config = ProjectionConfig {
            hold_years: 3,
            rent_growth_rate: 0.02,
            expense_growth_rate: 0.03,
            appreciation_rate: 0.04,
            selling_cost_percent: 0.05,
        };
        let basis = ProjectionBasis {
            purchase_price: 500_000.0,
            gross_potential_rent: 30_000.0,
            other_income: 1_000.0,
            vacancy_rate: 0.04,
            operating_expenses: 10_000.0,
            mortgage: None,
            total_cash_invested: 120_000.0,
        };

        let mut state = HoldState::from_basis(&basis, &config);
        assert!((state.property_value - 520_000.0).abs() < 1e-6);

        state.advance_year(&config);
        assert_eq!(state.year, 2);
        assert!((state.gross_potential_rent - 30_600.0).abs() < 1e-6);
        assert!((state.other_income - 1_020.0).abs() < 1e-6);
        assert!((state.operating_expenses - 10_300.0).abs() < 1e-6);
        assert!((state.property_value - 540_800.0).abs() < 1e-6);
    }
}
