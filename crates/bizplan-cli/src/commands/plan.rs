use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

use bizplan_core::formatting::{format_money, format_ratio};
use bizplan_core::pl::solver::snapshot_rows;
use bizplan_core::pl::{
    compute_plan, plan_from_models, solve_for_target_income, summarize_plan_metrics, LineCode,
    PlanMetrics,
};
use bizplan_core::report::build_plan_report;
use bizplan_core::types::{with_metadata, Amount, Money, Unit};

use super::PlanArgs;

/// Arguments for the P&L snapshot
#[derive(Args)]
pub struct PlArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Override the plan's annual sales
    #[arg(long)]
    pub sales: Option<Decimal>,
}

/// Arguments for the target-income sales search
#[derive(Args)]
pub struct TargetArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Lower end of the initial sales bracket
    #[arg(long, default_value = "0")]
    pub low: Decimal,

    /// Upper end of the initial sales bracket (defaults to planned sales)
    #[arg(long)]
    pub high: Option<Decimal>,
}

#[derive(Debug, Serialize)]
struct LineRow {
    code: LineCode,
    label: &'static str,
    amount: Amount,
    display: String,
}

#[derive(Debug, Serialize)]
struct PlOutput {
    ordinary_income: Money,
    metrics: PlanMetrics,
    lines: Vec<LineRow>,
}

fn display_amount(code: LineCode, amount: Amount, unit: Unit) -> String {
    if code == LineCode::Ldr {
        format_ratio(amount)
    } else {
        format_money(amount, unit)
    }
}

pub fn run_pl(args: PlArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let doc = args.plan.load()?;
    let unit = doc.settings.unit;
    let plan = plan_from_models(&doc.bundle, doc.settings.fte, unit);
    let snapshot = compute_plan(&plan, args.sales, None);

    let warnings: Vec<String> = snapshot
        .sentinel_lines()
        .into_iter()
        .map(|code| format!("{} ({}) is undefined for this plan", code.label(), code))
        .collect();
    let lines = snapshot_rows(&snapshot)
        .into_iter()
        .map(|(code, amount)| LineRow {
            code,
            label: code.label(),
            amount,
            display: display_amount(code, amount, unit),
        })
        .collect();
    let output = PlOutput {
        ordinary_income: snapshot.ordinary_income(),
        metrics: summarize_plan_metrics(&snapshot),
        lines,
    };

    let result = with_metadata(
        "Fixed-point P&L with gross-linked cost iteration",
        &doc.settings,
        warnings,
        start.elapsed().as_micros() as u64,
        output,
    );
    Ok(serde_json::to_value(result)?)
}

pub fn run_target(args: TargetArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let doc = args.plan.load()?;
    let settings = &doc.settings;
    let plan = plan_from_models(&doc.bundle, settings.fte, settings.unit);
    let high = args.high.unwrap_or(plan.base_sales);
    let solution = solve_for_target_income(
        &plan,
        settings.target_ordinary_income,
        args.low,
        high,
        settings.solver_options(),
    );

    let mut warnings = Vec::new();
    if !solution.converged {
        warnings.push(format!(
            "Target not reached within {} iterations; returning best-effort sales",
            settings.max_iterations
        ));
    }
    let result = with_metadata(
        "Bisection on ordinary income with geometric bracket expansion",
        &serde_json::json!({
            "target": settings.target_ordinary_income.to_string(),
            "low": args.low.to_string(),
            "high": high.to_string(),
            "max_iterations": settings.max_iterations,
            "tolerance": settings.tolerance.to_string(),
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        solution,
    );
    Ok(serde_json::to_value(result)?)
}

pub fn run_report(args: PlanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let doc = args.load_unchecked()?;
    let report = build_plan_report(&doc)?;
    Ok(serde_json::to_value(report)?)
}

pub fn run_validate(args: PlanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let doc = args.load()?;
    let bundle = &doc.bundle;
    Ok(serde_json::json!({
        "result": {
            "valid": true,
            "sales_lines": bundle.sales.items.len(),
            "capex_items": bundle.capex.items.len(),
            "loans": bundle.loans.loans.len(),
            "annual_sales": bundle.sales.annual_total().to_string(),
        }
    }))
}
