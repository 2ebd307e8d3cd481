//! Analyze every deal in a CSV file and write one result row per deal
//!
//! Deals are analyzed in parallel; rows that fail validation are written
//! with the error message and blank metrics.

use anyhow::{Context, Result};
use canadian_realty::deal::loader::load_deals;
use canadian_realty::{Assumptions, DealAnalysis, ScenarioRunner};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(about = "Batch deal analysis from CSV")]
struct Args {
    /// Deals CSV (see demos/portfolio.csv)
    #[arg(default_value = "demos/portfolio.csv")]
    input: PathBuf,

    #[arg(short, long, default_value = "portfolio_results.csv")]
    output: PathBuf,

    /// Directory of assumption CSVs
    #[arg(long)]
    assumptions: Option<PathBuf>,
}

/// One output row
#[derive(Debug, Default, Serialize)]
struct ResultRow {
    name: String,
    property_type: String,
    purchase_price: Option<f64>,
    total_cash_required: Option<f64>,
    mortgage: Option<f64>,
    monthly_payment: Option<f64>,
    noi: Option<f64>,
    monthly_cash_flow: Option<f64>,
    cap_rate: Option<f64>,
    cash_on_cash: Option<f64>,
    dscr: Option<f64>,
    irr: Option<f64>,
    equity_multiple: Option<f64>,
    score: Option<f64>,
    grade: String,
    warnings: usize,
    error: String,
}

impl From<&DealAnalysis> for ResultRow {
    fn from(a: &DealAnalysis) -> Self {
        Self {
            name: a.name.clone(),
            property_type: a.property_type.to_string(),
            purchase_price: Some(a.acquisition.purchase_price),
            total_cash_required: Some(round2(a.acquisition.total_cash_required)),
            mortgage: Some(round2(a.financing.insured_loan)),
            monthly_payment: Some(round2(a.financing.monthly_payment)),
            noi: Some(round2(a.cash_flow.net_operating_income)),
            monthly_cash_flow: Some(round2(a.cash_flow.monthly_cash_flow)),
            cap_rate: Some(a.ratios.cap_rate),
            cash_on_cash: a.ratios.cash_on_cash,
            dscr: a.ratios.dscr,
            irr: a.projection.irr,
            equity_multiple: a.projection.equity_multiple,
            score: Some(a.score.total),
            grade: a.score.grade.to_string(),
            warnings: a.warnings.len(),
            error: String::new(),
        }
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let start = Instant::now();
    let assumptions = match &args.assumptions {
        Some(dir) => Assumptions::from_csv_path(dir)
            .with_context(|| format!("loading assumptions from {}", dir.display()))?,
        None => Assumptions::default_canada(),
    };
    let runner = ScenarioRunner::with_assumptions(assumptions);

    println!("Loading deals from {}...", args.input.display());
    let deals = load_deals(&args.input).with_context(|| format!("reading {}", args.input.display()))?;
    println!("Loaded {} deals in {:?}", deals.len(), start.elapsed());

    let run_start = Instant::now();
    let results = runner.analyze_batch(&deals);
    println!("Analysis complete in {:?}", run_start.elapsed());

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let mut failed = 0;
    for (deal, result) in deals.iter().zip(&results) {
        let row = match result {
            Ok(analysis) => ResultRow::from(analysis),
            Err(e) => {
                failed += 1;
                log::warn!("{}: {}", deal.name, e);
                ResultRow {
                    name: deal.name.clone(),
                    error: e.to_string(),
                    ..Default::default()
                }
            }
        };
        writer.serialize(row)?;
    }
    writer.flush()?;

    println!("Output written to {}", args.output.display());

    println!("\nPortfolio Summary:");
    let analyzed: Vec<&DealAnalysis> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    let cash: f64 = analyzed.iter().map(|a| a.acquisition.total_cash_required).sum();
    let cash_flow: f64 = analyzed.iter().map(|a| a.cash_flow.annual_cash_flow).sum();
    println!("  Deals analyzed:       {} ({} failed)", analyzed.len(), failed);
    println!("  Total cash required:  ${:.0}", cash);
    println!("  Annual cash flow:     ${:.0}", cash_flow);
    if let Some(best) = analyzed.iter().max_by(|a, b| a.score.total.total_cmp(&b.score.total)) {
        println!("  Best deal:            {} ({:.1}, {})", best.name, best.score.total, best.score.grade);
    }

    println!("\nTotal time: {:?}", start.elapsed());
    Ok(())
}
