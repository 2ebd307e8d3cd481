//! Year-by-year hold projection for a rental property

use log::debug;
use serde::{Deserialize, Serialize};

use super::cashflows::{HoldProjection, ProjectionYear, SaleSummary};
use super::irr::calculate_irr;
use super::state::HoldState;
use crate::deal::MAX_HOLD_YEARS;
use crate::error::{AnalysisError, Result};
use crate::mortgage::{paid_over, MortgageTerms};

/// Growth and disposition assumptions for a projection run
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProjectionConfig {
    pub hold_years: u32,
    pub rent_growth_rate: f64,
    pub expense_growth_rate: f64,
    pub appreciation_rate: f64,
    /// Commission and legal costs on sale, as a share of the sale price
    pub selling_cost_percent: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            hold_years: 5,
            rent_growth_rate: 0.02,
            expense_growth_rate: 0.025,
            appreciation_rate: 0.03,
            selling_cost_percent: 0.05,
        }
    }
}

/// Year-one position of the property at acquisition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionBasis {
    pub purchase_price: f64,
    pub gross_potential_rent: f64,
    pub other_income: f64,
    pub vacancy_rate: f64,
    pub operating_expenses: f64,
    /// None for an all-cash purchase
    pub mortgage: Option<MortgageTerms>,
    pub total_cash_invested: f64,
}

/// Projection engine
pub struct ProjectionEngine {
    config: ProjectionConfig,
}

impl ProjectionEngine {
    pub fn new(config: ProjectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Project the hold period, sell at the end and compute investor returns
    pub fn project(&self, basis: &ProjectionBasis) -> Result<HoldProjection> {
        if self.config.hold_years == 0 || self.config.hold_years > MAX_HOLD_YEARS {
            return Err(AnalysisError::invalid(
                "hold_years",
                format!("must be between 1 and {}", MAX_HOLD_YEARS),
            ));
        }

        let mut result = HoldProjection::new(basis.total_cash_invested);
        let mut state = HoldState::from_basis(basis, &self.config);
        let mut cumulative = 0.0;
        let mut prior_paid = (0.0, 0.0);

        for year in 1..=self.config.hold_years {
            if year > 1 {
                state.advance_year(&self.config);
            }

            let (principal_paid, interest_paid, balance) = match &basis.mortgage {
                Some(terms) => {
                    let periods = year * terms.periods_per_year();
                    let paid = paid_over(terms, periods)?;
                    let step = (paid.0 - prior_paid.0, paid.1 - prior_paid.1);
                    prior_paid = paid;
                    (step.0, step.1, (terms.principal - paid.0).max(0.0))
                }
                None => (0.0, 0.0, 0.0),
            };

            let row = self.calculate_year(basis, &state, principal_paid, interest_paid, balance, &mut cumulative);
            result.add_year(row);
        }

        let sale_price = state.property_value;
        let selling_costs = sale_price * self.config.selling_cost_percent;
        let loan_payoff = result.final_year().map(|r| r.mortgage_balance).unwrap_or(0.0);
        result.sale = SaleSummary {
            sale_price,
            selling_costs,
            loan_payoff,
            net_sale_proceeds: sale_price - selling_costs - loan_payoff,
        };

        self.summarize(&mut result);

        debug!(
            "projected {} years: sale ${:.0}, IRR {:?}",
            self.config.hold_years, sale_price, result.irr
        );

        Ok(result)
    }

    fn calculate_year(
        &self,
        basis: &ProjectionBasis,
        state: &HoldState,
        principal_paid: f64,
        interest_paid: f64,
        mortgage_balance: f64,
        cumulative: &mut f64,
    ) -> ProjectionYear {
        let gross_potential_income = state.gross_potential_income();
        let vacancy_loss = gross_potential_income * basis.vacancy_rate;
        let effective_gross_income = gross_potential_income - vacancy_loss;
        let net_operating_income = effective_gross_income - state.operating_expenses;
        let debt_service = principal_paid + interest_paid;
        let cash_flow = net_operating_income - debt_service;
        *cumulative += cash_flow;

        ProjectionYear {
            year: state.year,
            gross_potential_income,
            vacancy_loss,
            effective_gross_income,
            operating_expenses: state.operating_expenses,
            net_operating_income,
            debt_service,
            interest_paid,
            principal_paid,
            mortgage_balance,
            cash_flow,
            property_value: state.property_value,
            equity: state.property_value - mortgage_balance,
            cumulative_cash_flow: *cumulative,
        }
    }

    fn summarize(&self, result: &mut HoldProjection) {
        let cash = result.total_cash_invested;
        let inflows = result.total_cash_flow() + result.sale.net_sale_proceeds;

        result.total_profit = inflows - cash;
        result.irr = calculate_irr(&result.investor_cash_flows());
        if cash > 0.0 {
            result.equity_multiple = Some(inflows / cash);
            result.average_annual_return = Some(result.total_profit / cash / result.hold_years() as f64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basis(mortgage: Option<MortgageTerms>, cash: f64) -> ProjectionBasis {
        ProjectionBasis {
            purchase_price: 500_000.0,
            gross_potential_rent: 36_000.0,
            other_income: 0.0,
            vacancy_rate: 0.05,
            operating_expenses: 12_000.0,
            mortgage,
            total_cash_invested: cash,
        }
    }

    #[test]
    fn test_all_cash_projection() {
        let config = ProjectionConfig {
            hold_years: 2,
            rent_growth_rate: 0.0,
            expense_growth_rate: 0.0,
            appreciation_rate: 0.0,
            selling_cost_percent: 0.0,
        };
        let result = ProjectionEngine::new(config).project(&basis(None, 500_000.0)).unwrap();

        assert_eq!(result.years.len(), 2);
        // NOI = 36,000 * 0.95 - 12,000
        assert!((result.years[0].net_operating_income - 22_200.0).abs() < 1e-6);
        assert!((result.years[1].cumulative_cash_flow - 44_400.0).abs() < 1e-6);
        assert!((result.sale.net_sale_proceeds - 500_000.0).abs() < 1e-6);
        assert!((result.total_profit - 44_400.0).abs() < 1e-6);
        // Cap rate of 4.44% with no growth is the IRR
        assert!((result.irr.unwrap() - 0.0444).abs() < 1e-6);
        assert!((result.equity_multiple.unwrap() - 1.0888).abs() < 1e-9);
        assert!((result.average_annual_return.unwrap() - 0.0444).abs() < 1e-9);
    }

    #[test]
    fn test_leveraged_projection_pays_down_loan() {
        let terms = MortgageTerms::new(400_000.0, 0.05, 25);
        let result = ProjectionEngine::new(ProjectionConfig::default())
            .project(&basis(Some(terms), 110_000.0))
            .unwrap();

        let annual_debt = terms.annual_payment().unwrap();
        for row in &result.years {
            assert!((row.debt_service - annual_debt).abs() < 0.01);
            assert!(row.principal_paid > 0.0);
        }
        assert!(result.years[4].principal_paid > result.years[0].principal_paid);

        let final_balance = result.years[4].mortgage_balance;
        assert!((result.sale.loan_payoff - final_balance).abs() < 1e-9);
        assert!((terms.principal - final_balance - result.total_principal_paid()).abs() < 1e-6);

        let expected_value = 500_000.0 * 1.03_f64.powi(5);
        assert!((result.sale.sale_price - expected_value).abs() < 1e-6);
        assert!(result.irr.is_some());
    }

    #[test]
    fn test_rejects_zero_hold() {
        let config = ProjectionConfig {
            hold_years: 0,
            ..ProjectionConfig::default()
        };
        assert!(ProjectionEngine::new(config).project(&basis(None, 1.0)).is_err());
    }
}
