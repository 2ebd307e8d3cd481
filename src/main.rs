//! Canadian Realty - command line front end
//!
//! Every subcommand prints a short report, or the full result as JSON with `--json`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use canadian_realty::analyzers::{
    assess_risk, benchmark_expenses, compare_rental_strategies, estimate_adu, optimize_financing, score_market,
    AcreInput, AduInput, FinancingStrategy, Objective, RentalComparisonInput, RiskInput,
};
use canadian_realty::assumptions::DownPaymentSource;
use canadian_realty::deal::loader::load_deals;
use canadian_realty::mortgage::{cmhc, stress_test, Compounding, CmhcRequest, StressTestInput};
use canadian_realty::tax::{calculate_land_transfer_tax, LttRequest};
use canadian_realty::{
    AmortizationSchedule, Assumptions, DealAnalysis, DealInput, MortgageTerms, Municipality, PaymentFrequency,
    Province, ScenarioRunner,
};

#[derive(Parser)]
#[command(name = "canadian_realty", version, about = "Canadian real-estate investment analysis")]
struct Cli {
    /// Directory of assumption CSVs (built-in tables when omitted)
    #[arg(long, global = true)]
    assumptions: Option<PathBuf>,

    /// Print the full result as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Full analysis of a deal described in a JSON file
    Analyze { deal: PathBuf },

    /// CMHC insurance premium for a purchase
    Cmhc {
        #[arg(long)]
        price: f64,
        #[arg(long)]
        down: f64,
        #[arg(long, default_value = "ON")]
        province: Province,
        #[arg(long, default_value_t = 25)]
        amortization: u32,
        #[arg(long, default_value_t = 1)]
        units: u32,
        /// Rental property the buyer will not live in
        #[arg(long)]
        investment: bool,
        /// Borrowed down payment
        #[arg(long)]
        non_traditional: bool,
    },

    /// Land transfer tax on a purchase
    Ltt {
        #[arg(long)]
        price: f64,
        #[arg(long)]
        province: Province,
        #[arg(long)]
        municipality: Option<Municipality>,
        #[arg(long)]
        first_time: bool,
        #[arg(long)]
        foreign: bool,
        /// Mortgage registered on title (Alberta fees)
        #[arg(long, default_value_t = 0.0)]
        mortgage: f64,
    },

    /// Qualify a borrower at the OSFI stress-test rate
    StressTest {
        #[arg(long)]
        principal: f64,
        #[arg(long)]
        rate: f64,
        /// Gross annual household income
        #[arg(long)]
        income: f64,
        #[arg(long, default_value_t = 25)]
        amortization: u32,
        #[arg(long, default_value_t = 0.0)]
        property_tax: f64,
        #[arg(long, default_value_t = 0.0)]
        heating: f64,
        #[arg(long, default_value_t = 0.0)]
        condo_fees: f64,
        #[arg(long, default_value_t = 0.0)]
        debts: f64,
        #[arg(long, default_value_t = 0.0)]
        rental_income: f64,
    },

    /// Amortization schedule for a mortgage
    Schedule {
        #[arg(long)]
        principal: f64,
        #[arg(long)]
        rate: f64,
        #[arg(long, default_value_t = 25)]
        amortization: u32,
        #[arg(long, default_value = "monthly")]
        frequency: PaymentFrequency,
        /// Compound monthly (variable-rate mortgage)
        #[arg(long)]
        variable: bool,
        /// Print every payment instead of yearly totals
        #[arg(long)]
        payments: bool,
    },

    /// Rank the deals in a CSV file
    Compare { deals: PathBuf },

    /// Try financing strategies for a deal and rank them
    Optimize {
        deal: PathBuf,
        #[arg(long, default_value = "balanced")]
        objective: Objective,
    },

    /// Risk score, renewal shock and sensitivity for a deal
    Risk {
        deal: PathBuf,
        #[arg(long, default_value_t = 0.0)]
        age: f64,
        #[arg(long, default_value_t = 0.0)]
        reserves: f64,
        #[arg(long, default_value_t = 0.02)]
        rate_shock: f64,
    },

    /// Compare a deal's operating expenses with typical ranges
    Expenses { deal: PathBuf },

    /// Cost and return of adding a secondary suite
    Adu { input: PathBuf },

    /// Short-term versus long-term rental
    Airbnb { input: PathBuf },

    /// Score a rental market
    Acre { input: PathBuf },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let assumptions = match &cli.assumptions {
        Some(dir) => Assumptions::from_csv_path(dir)
            .with_context(|| format!("loading assumptions from {}", dir.display()))?,
        None => Assumptions::default_canada(),
    };

    match cli.command {
        Command::Analyze { deal } => {
            let input: DealInput = read_json(&deal)?;
            let analysis = ScenarioRunner::with_assumptions(assumptions).analyze(&input)?;
            output(cli.json, &analysis, print_analysis)?;
        }
        Command::Cmhc {
            price,
            down,
            province,
            amortization,
            units,
            investment,
            non_traditional,
        } => {
            let request = CmhcRequest {
                purchase_price: price,
                down_payment: down,
                amortization_years: amortization,
                province,
                source: if non_traditional {
                    DownPaymentSource::NonTraditional
                } else {
                    DownPaymentSource::Traditional
                },
                owner_occupied: !investment,
                units,
            };
            let result = cmhc::calculate(&request, &assumptions.cmhc)?;
            output(cli.json, &result, |r| {
                println!("Loan:               {}", money(r.loan_amount));
                println!("Loan-to-value:      {}", pct(r.ltv));
                println!("Minimum down:       {}", money(r.minimum_down_payment));
                if r.insurance_required {
                    println!("Premium rate:       {}", pct(r.premium_rate));
                    println!("Premium:            {}", money(r.premium));
                    println!("Provincial tax:     {}", money(r.provincial_tax));
                    println!("Insured loan:       {}", money(r.insured_loan));
                } else {
                    println!("Insurance not required (conventional mortgage)");
                }
            })?;
        }
        Command::Ltt {
            price,
            province,
            municipality,
            first_time,
            foreign,
            mortgage,
        } => {
            let request = LttRequest {
                municipality,
                first_time_buyer: first_time,
                foreign_buyer: foreign,
                mortgage_amount: mortgage,
                ..LttRequest::new(price, province)
            };
            let ltt = calculate_land_transfer_tax(&request, &assumptions.land_transfer)?;
            output(cli.json, &ltt, |t| {
                println!("Provincial:         {}", money(t.provincial));
                println!("Municipal:          {}", money(t.municipal));
                println!("Rebates:            {}", money(t.provincial_rebate + t.municipal_rebate));
                println!("Foreign buyer tax:  {}", money(t.foreign_buyer_tax));
                println!("Registration fees:  {}", money(t.registration_fees));
                println!("Total:              {} ({} of price)", money(t.total), pct(t.effective_rate(price)));
            })?;
        }
        Command::StressTest {
            principal,
            rate,
            income,
            amortization,
            property_tax,
            heating,
            condo_fees,
            debts,
            rental_income,
        } => {
            let input = StressTestInput {
                principal,
                contract_rate: rate,
                amortization_years: amortization,
                gross_annual_income: income,
                monthly_property_tax: property_tax,
                monthly_heating: heating,
                monthly_condo_fees: condo_fees,
                monthly_other_debts: debts,
                monthly_rental_income: rental_income,
            };
            let rules = &assumptions.stress_test;
            let result = stress_test::evaluate(&input, rules)?;
            let max_mortgage = stress_test::max_mortgage(&input, rules)?;
            if cli.json {
                let body = serde_json::json!({ "result": result, "max_mortgage": max_mortgage });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                println!("Qualifying rate:    {}", pct(result.qualifying_rate));
                println!("Contract payment:   {}", money(result.contract_payment));
                println!("Qualifying payment: {}", money(result.qualifying_payment));
                println!("GDS:                {} (limit {})", pct(result.gds), pct(result.gds_limit));
                println!("TDS:                {} (limit {})", pct(result.tds), pct(result.tds_limit));
                println!("Result:             {}", if result.passes { "PASS" } else { "FAIL" });
                println!("Maximum mortgage:   {}", money(max_mortgage));
            }
        }
        Command::Schedule {
            principal,
            rate,
            amortization,
            frequency,
            variable,
            payments,
        } => {
            let compounding = if variable { Compounding::Monthly } else { Compounding::SemiAnnual };
            let terms = MortgageTerms::new(principal, rate, amortization)
                .with_frequency(frequency)
                .with_compounding(compounding);
            let schedule = AmortizationSchedule::build(&terms)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&schedule)?);
            } else if payments {
                println!("{:>6} {:>12} {:>12} {:>12} {:>14}", "Period", "Payment", "Interest", "Principal", "Balance");
                for row in &schedule.rows {
                    println!(
                        "{:>6} {:>12.2} {:>12.2} {:>12.2} {:>14.2}",
                        row.period, row.payment, row.interest, row.principal, row.balance
                    );
                }
            } else {
                println!("{:>4} {:>14} {:>14} {:>14} {:>14}", "Year", "Payments", "Interest", "Principal", "Balance");
                for year in schedule.yearly_totals() {
                    println!(
                        "{:>4} {:>14.2} {:>14.2} {:>14.2} {:>14.2}",
                        year.year, year.payments, year.interest, year.principal, year.ending_balance
                    );
                }
                println!("\nTotal interest: {}", money(schedule.total_interest()));
                println!("Paid off in {:.1} years", schedule.payoff_years());
            }
        }
        Command::Compare { deals } => {
            let inputs = load_deals(&deals).with_context(|| format!("reading {}", deals.display()))?;
            info!("comparing {} deals", inputs.len());
            let report = ScenarioRunner::with_assumptions(assumptions).compare(&inputs)?;
            output(cli.json, &report, |r| {
                println!(
                    "{:<28} {:>6} {:>5} {:>8} {:>8} {:>6} {:>12}",
                    "Deal", "Score", "Grade", "Cap", "CoC", "DSCR", "CF/month"
                );
                for e in &r.entries {
                    println!(
                        "{:<28} {:>6.1} {:>5} {:>8} {:>8} {:>6} {:>12.2}",
                        e.name,
                        e.score,
                        e.grade,
                        pct(e.cap_rate),
                        opt_pct(e.cash_on_cash),
                        e.dscr.map_or("n/a".to_string(), |d| format!("{:.2}", d)),
                        e.monthly_cash_flow
                    );
                }
                for f in &r.failures {
                    println!("{:<28} failed: {}", f.name, f.error);
                }
            })?;
        }
        Command::Optimize { deal, objective } => {
            let input: DealInput = read_json(&deal)?;
            let report = optimize_financing(&input, &assumptions, &FinancingStrategy::default_candidates(), objective)?;
            output(cli.json, &report, |r| {
                println!("Objective: {}", r.objective);
                for (rank, o) in r.ranked.iter().enumerate() {
                    println!(
                        "{:>2}. {:<40} cash {:>12} payment {:>10} CF {:>10} score {:>5.1}{}",
                        rank + 1,
                        o.label,
                        money(o.cash_required),
                        money(o.monthly_payment),
                        money(o.monthly_cash_flow),
                        o.score,
                        if o.qualifies { "" } else { "  (does not qualify)" }
                    );
                }
                for f in &r.failures {
                    println!("    {:<40} unavailable: {}", f.label, f.error);
                }
            })?;
        }
        Command::Risk {
            deal,
            age,
            reserves,
            rate_shock,
        } => {
            let input: DealInput = read_json(&deal)?;
            let analysis = ScenarioRunner::with_assumptions(assumptions.clone()).analyze(&input)?;
            let risk = RiskInput {
                property_age_years: age,
                cash_reserves: reserves,
                rate_shock,
            };
            let report = assess_risk(&input, &analysis, &risk, &assumptions)?;
            output(cli.json, &report, |r| {
                println!("Risk score: {:.1} ({:?})", r.score, r.level);
                for factor in &r.factors {
                    println!("  {:<24} {:>5.1}", factor.name, factor.score);
                }
                for flag in &r.flags {
                    println!("  [{:?}] {}", flag.severity, flag.factor);
                }
                if let Some(renewal) = &r.renewal {
                    println!(
                        "Renewal after {} years at {}: {} -> {} per month (+{})",
                        renewal.term_years,
                        pct(renewal.renewal_rate),
                        money(renewal.current_monthly_payment),
                        money(renewal.renewal_monthly_payment),
                        money(renewal.payment_increase)
                    );
                }
                for s in &r.sensitivity {
                    println!("  {:<28} CF/month {:>10} cap {}", s.name, money(s.monthly_cash_flow), pct(s.cap_rate));
                }
            })?;
        }
        Command::Expenses { deal } => {
            let input: DealInput = read_json(&deal)?;
            let analysis = ScenarioRunner::with_assumptions(assumptions.clone()).analyze(&input)?;
            let report = benchmark_expenses(
                &analysis.expenses,
                analysis.revenue.effective_gross_income,
                analysis.property_type,
                &assumptions.expense_benchmarks,
            )?;
            output(cli.json, &report, |r| {
                println!(
                    "Expense ratio {} ({:?}, typical {}-{})",
                    pct(r.total_ratio),
                    r.total_status,
                    pct(r.total_benchmark.low),
                    pct(r.total_benchmark.high)
                );
                for line in &r.lines {
                    println!("  {:<14} {:>12} {:>8} {:?}", line.line, money(line.amount), pct(line.ratio), line.status);
                }
                println!("50% rule estimate: {}", money(r.fifty_percent_estimate));
                for note in &r.notes {
                    println!("  - {}", note);
                }
            })?;
        }
        Command::Adu { input } => {
            let adu: AduInput = read_json(&input)?;
            let estimate = estimate_adu(&adu)?;
            output(cli.json, &estimate, |e| {
                println!("Total cost:         {}", money(e.total_cost));
                println!("Annual net rent:    {}", money(e.annual_net_rent));
                println!("ROI:                {}", pct(e.roi));
                match e.payback_years {
                    Some(years) => println!("Payback:            {:.1} years", years),
                    None => println!("Payback:            never"),
                }
                println!("Value uplift:       {}", money(e.value_uplift));
                println!("Equity created:     {}", money(e.equity_created));
                if let Some(f) = &e.financing {
                    println!("Loan payment:       {}", money(f.monthly_payment));
                    println!("Monthly cash flow:  {}", money(f.monthly_cash_flow));
                }
            })?;
        }
        Command::Airbnb { input } => {
            let comparison: RentalComparisonInput = read_json(&input)?;
            let result = compare_rental_strategies(&comparison)?;
            output(cli.json, &result, |c| {
                println!("{:<12} {:>14} {:>14} {:>14}", "", "Gross", "Expenses", "Net");
                for (label, s) in [("Short-term", &c.short_term), ("Long-term", &c.long_term)] {
                    println!(
                        "{:<12} {:>14} {:>14} {:>14}",
                        label,
                        money(s.gross_income),
                        money(s.expenses),
                        money(s.net_income)
                    );
                }
                println!("Difference: {}", money(c.difference));
                println!("Break-even occupancy: {}", opt_pct(c.break_even_occupancy));
                println!("Recommendation: {:?}", c.recommendation);
                for note in &c.notes {
                    println!("  - {}", note);
                }
            })?;
        }
        Command::Acre { input } => {
            let market: AcreInput = read_json(&input)?;
            let score = score_market(&market)?;
            output(cli.json, &score, |s| {
                println!("{}: {:.1} ({})", s.region, s.total, s.tier);
                for c in &s.components {
                    println!("  {:<24} {:>5.1}", c.name, c.score);
                }
                println!("Strengths:  {}", s.strengths.join(", "));
                println!("Weaknesses: {}", s.weaknesses.join(", "));
            })?;
        }
    }

    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn output<T: Serialize>(json: bool, value: &T, report: impl FnOnce(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        report(value);
    }
    Ok(())
}

fn money(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", -amount)
    } else {
        format!("${:.2}", amount)
    }
}

fn pct(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

fn opt_pct(rate: Option<f64>) -> String {
    rate.map_or_else(|| "n/a".to_string(), pct)
}

fn print_analysis(a: &DealAnalysis) {
    println!("{} ({}, {} units)", a.name, a.property_type, a.units);
    println!("{}", "=".repeat(60));

    println!("\nAcquisition");
    println!("  Purchase price:       {}", money(a.acquisition.purchase_price));
    println!("  Down payment:         {}", money(a.acquisition.down_payment));
    println!("  Land transfer tax:    {}", money(a.acquisition.land_transfer_tax.total));
    if a.acquisition.cmhc.insurance_required {
        println!("  CMHC premium:         {}", money(a.acquisition.cmhc.premium));
    }
    println!("  Closing costs:        {}", money(a.acquisition.closing_costs));
    println!("  Total cash required:  {}", money(a.acquisition.total_cash_required));

    println!("\nFinancing");
    println!("  Mortgage:             {}", money(a.financing.insured_loan));
    println!("  Payment ({}):    {}", a.financing.terms.frequency, money(a.financing.periodic_payment));
    println!("  Monthly equivalent:   {}", money(a.financing.monthly_payment));
    println!("  Qualifying rate:      {}", pct(a.financing.qualifying_rate));

    println!("\nOperations (annual)");
    println!("  Effective income:     {}", money(a.revenue.effective_gross_income));
    println!("  Operating expenses:   {}", money(a.expenses.total));
    println!("  NOI:                  {}", money(a.cash_flow.net_operating_income));
    println!("  Debt service:         {}", money(a.cash_flow.annual_debt_service));
    println!("  Cash flow:            {}", money(a.cash_flow.annual_cash_flow));
    println!("  Cash flow per month:  {}", money(a.cash_flow.monthly_cash_flow));

    println!("\nRatios");
    println!("  Cap rate:             {}", pct(a.ratios.cap_rate));
    println!("  Cash-on-cash:         {}", opt_pct(a.ratios.cash_on_cash));
    println!(
        "  DSCR:                 {}",
        a.ratios.dscr.map_or("n/a".to_string(), |d| format!("{:.2}", d))
    );
    println!(
        "  GRM:                  {}",
        a.ratios.grm.map_or("n/a".to_string(), |g| format!("{:.1}", g))
    );
    println!("  Break-even occupancy: {}", opt_pct(a.ratios.break_even_occupancy));

    if let Some(q) = &a.qualification {
        println!(
            "\nStress test: {} (GDS {}, TDS {})",
            if q.passes { "PASS" } else { "FAIL" },
            pct(q.gds),
            pct(q.tds)
        );
    }

    println!("\nScore: {:.1} ({})", a.score.total, a.score.grade);
    for c in &a.score.components {
        println!("  {:<24} {:>5.1}  x{:.2}", c.name, c.score, c.weight);
    }

    let p = &a.projection;
    println!("\n{}-year hold", p.hold_years());
    println!("  IRR:                  {}", opt_pct(p.irr));
    println!(
        "  Equity multiple:      {}",
        p.equity_multiple.map_or("n/a".to_string(), |m| format!("{:.2}x", m))
    );
    println!("  Net sale proceeds:    {}", money(p.sale.net_sale_proceeds));
    println!("  Total profit:         {}", money(p.total_profit));

    if !a.warnings.is_empty() {
        println!("\nWarnings");
        for w in &a.warnings {
            println!("  - {}", w);
        }
    }
}
