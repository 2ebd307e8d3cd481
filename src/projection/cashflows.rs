//! Output structures for hold-period projections

use serde::{Deserialize, Serialize};

/// One year of the hold projection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionYear {
    pub year: u32,

    // Income
    pub gross_potential_income: f64,
    pub vacancy_loss: f64,
    pub effective_gross_income: f64,

    pub operating_expenses: f64,
    pub net_operating_income: f64,

    // Financing
    pub debt_service: f64,
    pub interest_paid: f64,
    pub principal_paid: f64,
    pub mortgage_balance: f64,

    pub cash_flow: f64,

    // Position at year end
    pub property_value: f64,
    pub equity: f64,
    pub cumulative_cash_flow: f64,
}

/// Disposition at the end of the hold
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaleSummary {
    pub sale_price: f64,
    pub selling_costs: f64,
    pub loan_payoff: f64,
    pub net_sale_proceeds: f64,
}

/// Complete hold-period projection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldProjection {
    pub years: Vec<ProjectionYear>,
    pub sale: SaleSummary,

    /// Cash invested at acquisition
    pub total_cash_invested: f64,

    /// Annual IRR; None when the cash flows never change sign
    pub irr: Option<f64>,

    /// Total distributions over cash invested; None with no cash in the deal
    pub equity_multiple: Option<f64>,

    pub total_profit: f64,

    /// Simple (non-compounded) annual return on cash invested
    pub average_annual_return: Option<f64>,
}

impl HoldProjection {
    pub fn new(total_cash_invested: f64) -> Self {
        Self {
            years: Vec::new(),
            sale: SaleSummary::default(),
            total_cash_invested,
            irr: None,
            equity_multiple: None,
            total_profit: 0.0,
            average_annual_return: None,
        }
    }

    pub fn add_year(&mut self, row: ProjectionYear) {
        self.years.push(row);
    }

    pub fn hold_years(&self) -> u32 {
        self.years.len() as u32
    }

    /// Investor cash flows: year 0 outlay, operating cash flow, sale proceeds in the final year
    pub fn investor_cash_flows(&self) -> Vec<f64> {
        let mut flows = Vec::with_capacity(self.years.len() + 1);
        flows.push(-self.total_cash_invested);
        let last = self.years.len();
        for (i, row) in self.years.iter().enumerate() {
            let mut flow = row.cash_flow;
            if i + 1 == last {
                flow += self.sale.net_sale_proceeds;
            }
            flows.push(flow);
        }
        flows
    }

    pub fn total_cash_flow(&self) -> f64 {
        self.years.iter().map(|r| r.cash_flow).sum()
    }

    pub fn total_principal_paid(&self) -> f64 {
        self.years.iter().map(|r| r.principal_paid).sum()
    }

    pub fn final_year(&self) -> Option<&ProjectionYear> {
        self.years.last()
    }
}
