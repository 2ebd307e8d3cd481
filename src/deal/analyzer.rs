//! Rental deal analysis pipeline
//!
//! Stages run in order and each one only reads the stages before it:
//! acquisition, financing, revenue, operating expenses, cash flow, ratios,
//! borrower qualification, score and the hold-period projection.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::input::{DealInput, PropertyType};
use super::score::{score_deal, DealScore};
use crate::assumptions::{Assumptions, ExpenseLine};
use crate::error::Result;
use crate::mortgage::cmhc::{self, CmhcRequest, CmhcResult};
use crate::mortgage::stress_test::{self, StressTestInput, StressTestResult};
use crate::mortgage::{paid_over, qualifying_rate, MortgageTerms};
use crate::projection::{HoldProjection, ProjectionBasis, ProjectionConfig, ProjectionEngine};
use crate::tax::{calculate_land_transfer_tax, LttBreakdown, LttRequest};

/// Lenders generally want at least this much NOI cover on rental debt
const MIN_LENDER_DSCR: f64 = 1.2;

/// Cash needed to close
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionCosts {
    pub purchase_price: f64,
    pub down_payment: f64,
    pub land_transfer_tax: LttBreakdown,
    pub cmhc: CmhcResult,
    pub legal_fees: f64,
    pub inspection_fee: f64,
    pub appraisal_fee: f64,
    pub other_closing_costs: f64,
    /// Fees, land transfer tax and sales tax on the CMHC premium
    pub closing_costs: f64,
    pub renovation_budget: f64,
    pub total_cash_required: f64,
}

/// Mortgage sizing and payments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Financing {
    /// Loan before any insurance premium
    pub base_loan: f64,
    /// Loan with the CMHC premium added
    pub insured_loan: f64,
    pub loan_to_value: f64,
    pub terms: MortgageTerms,
    /// Payment at the chosen frequency
    pub periodic_payment: f64,
    pub monthly_payment: f64,
    pub annual_debt_service: f64,
    pub effective_annual_rate: f64,
    pub qualifying_rate: f64,
    /// Monthly payment at the qualifying rate
    pub stress_test_payment: f64,
    pub first_year_principal: f64,
    pub first_year_interest: f64,
}

/// Annual income
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Revenue {
    pub gross_potential_rent: f64,
    pub other_income: f64,
    pub gross_potential_income: f64,
    pub vacancy_loss: f64,
    pub effective_gross_income: f64,
}

/// Annual operating expenses by line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatingExpenses {
    pub property_tax: f64,
    pub insurance: f64,
    pub utilities: f64,
    pub condo_fees: f64,
    pub maintenance: f64,
    pub management: f64,
    pub capex_reserve: f64,
    pub other: f64,
    pub total: f64,
}

impl OperatingExpenses {
    fn from_input(input: &DealInput, revenue: &Revenue) -> Self {
        let mut expenses = Self {
            property_tax: input.annual_property_tax,
            insurance: input.annual_insurance,
            utilities: input.monthly_utilities * 12.0,
            condo_fees: input.monthly_condo_fees * 12.0,
            maintenance: revenue.gross_potential_rent * input.maintenance_percent,
            management: revenue.effective_gross_income * input.management_percent,
            capex_reserve: revenue.gross_potential_rent * input.capex_reserve_percent,
            other: input.other_annual_expenses,
            total: 0.0,
        };
        expenses.total = ExpenseLine::ALL.iter().map(|&line| expenses.line(line)).sum();
        expenses
    }

    pub fn line(&self, line: ExpenseLine) -> f64 {
        match line {
            ExpenseLine::PropertyTax => self.property_tax,
            ExpenseLine::Insurance => self.insurance,
            ExpenseLine::Utilities => self.utilities,
            ExpenseLine::CondoFees => self.condo_fees,
            ExpenseLine::Maintenance => self.maintenance,
            ExpenseLine::Management => self.management,
            ExpenseLine::CapexReserve => self.capex_reserve,
            ExpenseLine::Other => self.other,
        }
    }

    /// Expenses that do not move with rent
    pub fn fixed_total(&self) -> f64 {
        self.property_tax + self.insurance + self.utilities + self.condo_fees + self.other
    }

    /// Expenses set as a share of rent or income
    pub fn variable_total(&self) -> f64 {
        self.maintenance + self.management + self.capex_reserve
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlow {
    pub net_operating_income: f64,
    pub annual_debt_service: f64,
    pub annual_cash_flow: f64,
    pub monthly_cash_flow: f64,
    pub monthly_cash_flow_per_unit: f64,
}

/// Return and coverage ratios; None where the denominator is zero
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ratios {
    pub cap_rate: f64,
    pub cash_on_cash: Option<f64>,
    pub dscr: Option<f64>,
    pub grm: Option<f64>,
    pub expense_ratio: Option<f64>,
    pub break_even_occupancy: Option<f64>,
    /// Monthly rent over price (the "1% rule")
    pub rent_to_price: f64,
    /// Cash flow, principal paydown and appreciation over cash invested
    pub year_one_roi: Option<f64>,
    pub loan_to_value: f64,
}

/// Complete analysis of one deal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealAnalysis {
    pub name: String,
    pub property_type: PropertyType,
    pub units: u32,
    pub acquisition: AcquisitionCosts,
    pub financing: Financing,
    pub revenue: Revenue,
    pub expenses: OperatingExpenses,
    pub cash_flow: CashFlow,
    pub ratios: Ratios,
    /// Stress test result when a borrower profile was supplied
    pub qualification: Option<StressTestResult>,
    pub score: DealScore,
    pub projection: HoldProjection,
    pub warnings: Vec<String>,
}

/// Runs the analysis pipeline against a set of assumptions
pub struct DealAnalyzer<'a> {
    assumptions: &'a Assumptions,
}

impl<'a> DealAnalyzer<'a> {
    pub fn new(assumptions: &'a Assumptions) -> Self {
        Self { assumptions }
    }

    pub fn analyze(&self, input: &DealInput) -> Result<DealAnalysis> {
        input.validate()?;
        let property_type = input.effective_property_type();
        debug!("analyzing '{}' ({}, {} units)", input.name, property_type, input.units);

        let cmhc = self.insurance(input)?;
        let acquisition = self.acquisition(input, cmhc)?;
        let financing = self.financing(input, &acquisition)?;
        let revenue = Self::revenue(input);
        let expenses = OperatingExpenses::from_input(input, &revenue);
        let cash_flow = Self::cash_flow(input, &revenue, &expenses, &financing);
        let ratios = Self::ratios(input, &acquisition, &financing, &revenue, &expenses, &cash_flow);
        let qualification = self.qualification(input, &financing)?;

        let score = score_deal(
            &ratios,
            cash_flow.monthly_cash_flow_per_unit,
            &self.assumptions.scoring,
            &self.assumptions.grades,
        );
        let projection = self.projection(input, &acquisition, &financing, &revenue, &expenses)?;

        let mut analysis = DealAnalysis {
            name: input.name.clone(),
            property_type,
            units: input.units,
            acquisition,
            financing,
            revenue,
            expenses,
            cash_flow,
            ratios,
            qualification,
            score,
            projection,
            warnings: Vec::new(),
        };
        analysis.warnings = self.warnings(input, &analysis);
        for warning in &analysis.warnings {
            warn!("{}: {}", input.name, warning);
        }

        debug!(
            "'{}' scored {} ({}), monthly cash flow ${:.2}",
            input.name, analysis.score.total, analysis.score.grade, analysis.cash_flow.monthly_cash_flow
        );
        Ok(analysis)
    }

    fn insurance(&self, input: &DealInput) -> Result<CmhcResult> {
        let request = CmhcRequest {
            purchase_price: input.purchase_price,
            down_payment: input.down_payment(),
            amortization_years: input.amortization_years,
            province: input.province,
            source: input.down_payment_source,
            owner_occupied: input.owner_occupied,
            units: input.units,
        };
        cmhc::calculate(&request, &self.assumptions.cmhc)
    }

    fn acquisition(&self, input: &DealInput, cmhc: CmhcResult) -> Result<AcquisitionCosts> {
        let ltt = calculate_land_transfer_tax(
            &LttRequest {
                price: input.purchase_price,
                province: input.province,
                municipality: input.municipality,
                first_time_buyer: input.first_time_buyer,
                foreign_buyer: input.foreign_buyer,
                mortgage_amount: cmhc.insured_loan,
            },
            &self.assumptions.land_transfer,
        )?;

        let closing_costs = input.legal_fees
            + input.inspection_fee
            + input.appraisal_fee
            + input.other_closing_costs
            + ltt.total
            + cmhc.provincial_tax;
        let down_payment = input.down_payment();

        debug!("acquisition: down ${:.0}, closing ${:.0}, LTT ${:.0}", down_payment, closing_costs, ltt.total);

        Ok(AcquisitionCosts {
            purchase_price: input.purchase_price,
            down_payment,
            land_transfer_tax: ltt,
            cmhc,
            legal_fees: input.legal_fees,
            inspection_fee: input.inspection_fee,
            appraisal_fee: input.appraisal_fee,
            other_closing_costs: input.other_closing_costs,
            closing_costs,
            renovation_budget: input.renovation_budget,
            total_cash_required: down_payment + closing_costs + input.renovation_budget,
        })
    }

    fn financing(&self, input: &DealInput, acquisition: &AcquisitionCosts) -> Result<Financing> {
        let cmhc = &acquisition.cmhc;
        let terms = MortgageTerms::new(cmhc.insured_loan, input.interest_rate, input.amortization_years)
            .with_frequency(input.payment_frequency)
            .with_compounding(input.compounding);

        let periodic_payment = terms.payment()?;
        let monthly_payment = terms.monthly_payment()?;
        let annual_debt_service = terms.annual_payment()?;
        let qualifying = qualifying_rate(input.interest_rate, &self.assumptions.stress_test);
        let stress_test_payment = terms
            .with_frequency(crate::mortgage::PaymentFrequency::Monthly)
            .at_rate(qualifying)
            .monthly_payment()?;
        let (first_year_principal, first_year_interest) = paid_over(&terms, terms.periods_per_year())?;

        debug!(
            "financing: loan ${:.0}, {} payment ${:.2}",
            cmhc.insured_loan,
            input.payment_frequency.as_str(),
            periodic_payment
        );

        Ok(Financing {
            base_loan: cmhc.loan_amount,
            insured_loan: cmhc.insured_loan,
            loan_to_value: cmhc.ltv,
            terms,
            periodic_payment,
            monthly_payment,
            annual_debt_service,
            effective_annual_rate: terms.effective_annual_rate(),
            qualifying_rate: qualifying,
            stress_test_payment,
            first_year_principal,
            first_year_interest,
        })
    }

    fn revenue(input: &DealInput) -> Revenue {
        let gross_potential_rent = input.monthly_rent * 12.0;
        let other_income = input.other_monthly_income * 12.0;
        let gross_potential_income = gross_potential_rent + other_income;
        let vacancy_loss = gross_potential_income * input.vacancy_rate;

        Revenue {
            gross_potential_rent,
            other_income,
            gross_potential_income,
            vacancy_loss,
            effective_gross_income: gross_potential_income - vacancy_loss,
        }
    }

    fn cash_flow(input: &DealInput, revenue: &Revenue, expenses: &OperatingExpenses, financing: &Financing) -> CashFlow {
        let net_operating_income = revenue.effective_gross_income - expenses.total;
        let annual_cash_flow = net_operating_income - financing.annual_debt_service;
        let monthly_cash_flow = annual_cash_flow / 12.0;

        CashFlow {
            net_operating_income,
            annual_debt_service: financing.annual_debt_service,
            annual_cash_flow,
            monthly_cash_flow,
            monthly_cash_flow_per_unit: monthly_cash_flow / input.units as f64,
        }
    }

    fn ratios(
        input: &DealInput,
        acquisition: &AcquisitionCosts,
        financing: &Financing,
        revenue: &Revenue,
        expenses: &OperatingExpenses,
        cash_flow: &CashFlow,
    ) -> Ratios {
        let price = input.purchase_price;
        let cash = acquisition.total_cash_required;
        let debt = financing.annual_debt_service;
        let appreciation = price * input.appreciation_rate;

        Ratios {
            cap_rate: cash_flow.net_operating_income / price,
            cash_on_cash: ratio(cash_flow.annual_cash_flow, cash),
            dscr: ratio(cash_flow.net_operating_income, debt),
            grm: ratio(price, revenue.gross_potential_rent),
            expense_ratio: ratio(expenses.total, revenue.effective_gross_income),
            break_even_occupancy: ratio(expenses.total + debt, revenue.gross_potential_income),
            rent_to_price: input.monthly_rent / price,
            year_one_roi: ratio(cash_flow.annual_cash_flow + financing.first_year_principal + appreciation, cash),
            loan_to_value: financing.loan_to_value,
        }
    }

    fn qualification(&self, input: &DealInput, financing: &Financing) -> Result<Option<StressTestResult>> {
        let terms = MortgageTerms::new(financing.insured_loan, input.interest_rate, input.amortization_years);
        match borrower_stress_input(input, &terms) {
            Some(stress) => stress_test::evaluate(&stress, &self.assumptions.stress_test).map(Some),
            None => Ok(None),
        }
    }

    fn projection(
        &self,
        input: &DealInput,
        acquisition: &AcquisitionCosts,
        financing: &Financing,
        revenue: &Revenue,
        expenses: &OperatingExpenses,
    ) -> Result<HoldProjection> {
        let config = ProjectionConfig {
            hold_years: input.hold_years,
            rent_growth_rate: input.rent_growth_rate,
            expense_growth_rate: input.expense_growth_rate,
            appreciation_rate: input.appreciation_rate,
            selling_cost_percent: input.selling_cost_percent,
        };
        let basis = ProjectionBasis {
            purchase_price: input.purchase_price,
            gross_potential_rent: revenue.gross_potential_rent,
            other_income: revenue.other_income,
            vacancy_rate: input.vacancy_rate,
            operating_expenses: expenses.total,
            mortgage: (financing.insured_loan > 0.0).then_some(financing.terms),
            total_cash_invested: acquisition.total_cash_required,
        };
        ProjectionEngine::new(config).project(&basis)
    }

    fn warnings(&self, input: &DealInput, analysis: &DealAnalysis) -> Vec<String> {
        let mut warnings = Vec::new();

        if analysis.cash_flow.annual_cash_flow < 0.0 {
            warnings.push(format!(
                "negative cash flow of ${:.2} per month",
                analysis.cash_flow.monthly_cash_flow
            ));
        }
        if let Some(dscr) = analysis.ratios.dscr {
            if dscr < MIN_LENDER_DSCR {
                warnings.push(format!("DSCR of {:.2} is below the {:.2} most lenders require", dscr, MIN_LENDER_DSCR));
            }
        }
        if input.vacancy_rate == 0.0 {
            warnings.push("no vacancy allowance".to_string());
        }
        if let Some(ratio) = analysis.ratios.expense_ratio {
            let benchmark = self.assumptions.expense_benchmarks.for_type(analysis.property_type).total;
            if ratio < benchmark.low {
                warnings.push(format!(
                    "expense ratio of {:.1}% is below the {:.0}% typical minimum; check for missing expenses",
                    ratio * 100.0,
                    benchmark.low * 100.0
                ));
            }
        }
        if let Some(result) = &analysis.qualification {
            if !result.passes {
                warnings.push(format!(
                    "borrower fails the stress test at {:.2}% (GDS {:.1}%, TDS {:.1}%)",
                    result.qualifying_rate * 100.0,
                    result.gds * 100.0,
                    result.tds * 100.0
                ));
            }
        }
        if analysis.acquisition.cmhc.insurance_required {
            warnings.push(format!(
                "CMHC premium of ${:.0} added to the mortgage",
                analysis.acquisition.cmhc.premium
            ));
        }

        warnings
    }
}

/// Stress-test input for the deal's borrower carrying `terms`; None without a borrower
pub(crate) fn borrower_stress_input(input: &DealInput, terms: &MortgageTerms) -> Option<StressTestInput> {
    let borrower = input.borrower.as_ref()?;
    Some(StressTestInput {
        principal: terms.principal,
        contract_rate: terms.annual_rate,
        amortization_years: terms.amortization_years,
        gross_annual_income: borrower.gross_annual_income,
        monthly_property_tax: input.annual_property_tax / 12.0,
        monthly_heating: input.monthly_utilities,
        monthly_condo_fees: input.monthly_condo_fees,
        monthly_other_debts: borrower.monthly_other_debts,
        monthly_rental_income: input.monthly_rent + input.other_monthly_income,
    })
}

/// Analyze a deal with the given assumptions
pub fn analyze_deal(input: &DealInput, assumptions: &Assumptions) -> Result<DealAnalysis> {
    DealAnalyzer::new(assumptions).analyze(input)
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator > 0.0).then(|| numerator / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deal::BorrowerProfile;
    use crate::error::AnalysisError;
    use crate::jurisdiction::{Municipality, Province};
    use approx::assert_relative_eq;

    fn ontario_duplex() -> DealInput {
        let mut deal = DealInput::new("duplex", 800_000.0, 4_800.0, 0.05, Province::Ontario);
        deal.units = 2;
        deal.annual_property_tax = 6_000.0;
        deal.annual_insurance = 2_400.0;
        deal.monthly_utilities = 200.0;
        deal
    }

    #[test]
    fn test_acquisition_costs() {
        let assumptions = Assumptions::default_canada();
        let analysis = analyze_deal(&ontario_duplex(), &assumptions).unwrap();
        let acq = &analysis.acquisition;

        assert_relative_eq!(acq.down_payment, 160_000.0);
        // Ontario LTT on $800k
        assert_relative_eq!(acq.land_transfer_tax.total, 12_475.0, epsilon = 0.01);
        assert!(!acq.cmhc.insurance_required);
        assert_relative_eq!(acq.closing_costs, 1_500.0 + 500.0 + 400.0 + 12_475.0, epsilon = 0.01);
        assert_relative_eq!(acq.total_cash_required, 160_000.0 + 14_875.0, epsilon = 0.01);
    }

    #[test]
    fn test_toronto_municipal_tax() {
        let assumptions = Assumptions::default_canada();
        let mut deal = ontario_duplex();
        deal.municipality = Some(Municipality::Toronto);
        let analysis = analyze_deal(&deal, &assumptions).unwrap();
        let ltt = &analysis.acquisition.land_transfer_tax;

        assert!(ltt.municipal > 0.0);
        assert_relative_eq!(ltt.municipal, 12_475.0, epsilon = 0.01);
        assert_relative_eq!(ltt.total, 24_950.0, epsilon = 0.01);
        assert_relative_eq!(
            analysis.acquisition.total_cash_required,
            160_000.0 + 2_400.0 + 24_950.0,
            epsilon = 0.01
        );
    }

    #[test]
    fn test_alberta_fee_uses_insured_loan() {
        let assumptions = Assumptions::default_canada();
        let mut deal = DealInput::new("calgary", 500_000.0, 2_600.0, 0.05, Province::Alberta);
        deal.down_payment_percent = 0.10;
        deal.owner_occupied = true;
        let analysis = analyze_deal(&deal, &assumptions).unwrap();

        let insured = 450_000.0 * 1.031;
        assert_relative_eq!(analysis.financing.insured_loan, insured, epsilon = 1e-6);
        // $50 + $5 per $5,000 on the $500k title and on the $463,950 mortgage
        assert_relative_eq!(
            analysis.acquisition.land_transfer_tax.registration_fees,
            (50.0 + 5.0 * 100.0) + (50.0 + 5.0 * 93.0),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_revenue_expenses_and_cash_flow() {
        let assumptions = Assumptions::default_canada();
        let analysis = analyze_deal(&ontario_duplex(), &assumptions).unwrap();

        assert_relative_eq!(analysis.revenue.gross_potential_rent, 57_600.0);
        assert_relative_eq!(analysis.revenue.vacancy_loss, 2_304.0, epsilon = 1e-9);
        assert_relative_eq!(analysis.revenue.effective_gross_income, 55_296.0, epsilon = 1e-9);

        // 6,000 + 2,400 + 2,400 utilities + 5% maintenance + 5% capex on 57,600
        let e = &analysis.expenses;
        assert_relative_eq!(e.maintenance, 2_880.0, epsilon = 1e-9);
        assert_relative_eq!(e.capex_reserve, 2_880.0, epsilon = 1e-9);
        assert_relative_eq!(e.total, 16_560.0, epsilon = 1e-9);
        assert_relative_eq!(e.fixed_total() + e.variable_total(), e.total, epsilon = 1e-9);

        let noi = 55_296.0 - 16_560.0;
        assert_relative_eq!(analysis.cash_flow.net_operating_income, noi, epsilon = 1e-9);
        let debt = analysis.financing.annual_debt_service;
        assert_relative_eq!(analysis.cash_flow.annual_cash_flow, noi - debt, epsilon = 1e-9);
        assert_relative_eq!(
            analysis.cash_flow.monthly_cash_flow_per_unit,
            (noi - debt) / 24.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_ratios() {
        let assumptions = Assumptions::default_canada();
        let analysis = analyze_deal(&ontario_duplex(), &assumptions).unwrap();
        let r = &analysis.ratios;

        assert_relative_eq!(r.cap_rate, 38_736.0 / 800_000.0, epsilon = 1e-12);
        assert_relative_eq!(r.grm.unwrap(), 800_000.0 / 57_600.0, epsilon = 1e-12);
        assert_relative_eq!(r.rent_to_price, 0.006, epsilon = 1e-12);
        assert_relative_eq!(r.loan_to_value, 0.8, epsilon = 1e-12);
        let dscr = 38_736.0 / analysis.financing.annual_debt_service;
        assert_relative_eq!(r.dscr.unwrap(), dscr, epsilon = 1e-12);
        assert!(r.cash_on_cash.is_some());
    }

    #[test]
    fn test_financing_payment() {
        let assumptions = Assumptions::default_canada();
        let mut deal = ontario_duplex();
        deal.purchase_price = 500_000.0;
        let analysis = analyze_deal(&deal, &assumptions).unwrap();

        // $400k at 5% over 25 years, semi-annual compounding
        assert_relative_eq!(analysis.financing.monthly_payment, 2_326.42, epsilon = 0.01);
        assert_relative_eq!(analysis.financing.qualifying_rate, 0.07, epsilon = 1e-12);
        assert!(analysis.financing.stress_test_payment > analysis.financing.monthly_payment);
        assert!(analysis.financing.first_year_interest > analysis.financing.first_year_principal);
    }

    #[test]
    fn test_all_cash_purchase() {
        let assumptions = Assumptions::default_canada();
        let mut deal = ontario_duplex();
        deal.down_payment_percent = 1.0;
        let analysis = analyze_deal(&deal, &assumptions).unwrap();

        assert_eq!(analysis.financing.annual_debt_service, 0.0);
        assert!(analysis.ratios.dscr.is_none());
        assert!(analysis.projection.years.iter().all(|y| y.mortgage_balance == 0.0));
    }

    #[test]
    fn test_insured_owner_occupied() {
        let assumptions = Assumptions::default_canada();
        let mut deal = ontario_duplex();
        deal.purchase_price = 600_000.0;
        deal.down_payment_percent = 0.10;
        deal.owner_occupied = true;
        let analysis = analyze_deal(&deal, &assumptions).unwrap();

        let cmhc = &analysis.acquisition.cmhc;
        assert!(cmhc.insurance_required);
        assert_relative_eq!(cmhc.premium_rate, 0.031, epsilon = 1e-12);
        assert_relative_eq!(analysis.financing.insured_loan, 540_000.0 * 1.031, epsilon = 0.01);
        // Ontario PST on the premium is paid in cash at closing
        assert_relative_eq!(cmhc.provincial_tax, 540_000.0 * 0.031 * 0.08, epsilon = 0.01);
        assert!(analysis.warnings.iter().any(|w| w.contains("CMHC")));
    }

    #[test]
    fn test_insured_investment_property_rejected() {
        let assumptions = Assumptions::default_canada();
        let mut deal = ontario_duplex();
        deal.down_payment_percent = 0.10;
        let err = analyze_deal(&deal, &assumptions).unwrap_err();
        assert!(matches!(err, AnalysisError::InsuranceUnavailable(_)));
    }

    #[test]
    fn test_qualification() {
        let assumptions = Assumptions::default_canada();
        let mut deal = ontario_duplex();
        deal.borrower = Some(BorrowerProfile {
            gross_annual_income: 150_000.0,
            monthly_other_debts: 500.0,
        });
        let analysis = analyze_deal(&deal, &assumptions).unwrap();
        let result = analysis.qualification.unwrap();
        assert_relative_eq!(result.qualifying_rate, 0.07, epsilon = 1e-12);
        // 12,500 salary + half of 4,800 rent
        assert_relative_eq!(result.qualifying_income, 14_900.0, epsilon = 1e-9);

        deal.borrower = None;
        assert!(analyze_deal(&deal, &assumptions).unwrap().qualification.is_none());
    }

    #[test]
    fn test_negative_cash_flow_warning() {
        let assumptions = Assumptions::default_canada();
        let mut deal = ontario_duplex();
        deal.monthly_rent = 2_500.0;
        let analysis = analyze_deal(&deal, &assumptions).unwrap();
        assert!(analysis.cash_flow.monthly_cash_flow < 0.0);
        assert!(analysis.warnings.iter().any(|w| w.contains("negative cash flow")));
    }

    #[test]
    fn test_projection_attached() {
        let assumptions = Assumptions::default_canada();
        let analysis = analyze_deal(&ontario_duplex(), &assumptions).unwrap();
        assert_eq!(analysis.projection.years.len(), 5);
        assert_relative_eq!(
            analysis.projection.total_cash_invested,
            analysis.acquisition.total_cash_required
        );
        assert!(analysis.projection.irr.is_some());
    }

    #[test]
    fn test_invalid_input_rejected() {
        let assumptions = Assumptions::default_canada();
        let mut deal = ontario_duplex();
        deal.hold_years = 0;
        assert!(matches!(
            analyze_deal(&deal, &assumptions),
            Err(AnalysisError::InvalidInput { field: "hold_years", .. })
        ));
    }
}
