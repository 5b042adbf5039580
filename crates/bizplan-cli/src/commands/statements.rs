use clap::Args;
use serde_json::Value;
use std::time::Instant;

use bizplan_core::balance_sheet::generate_balance_sheet;
use bizplan_core::cash_flow::{annual_cash_flow, generate_cash_flow};
use bizplan_core::pl::{compute_plan, plan_from_models, ResultSnapshot};
use bizplan_core::schedules::{
    amortization_schedule, debt_service_by_year, depreciation_summary, dscr_series,
};
use bizplan_core::types::with_metadata;
use bizplan_core::PlanInput;

use super::PlanArgs;

/// Arguments for the statement commands
#[derive(Args)]
pub struct StatementArgs {
    #[command(flatten)]
    pub plan: PlanArgs,
}

fn snapshot_of(doc: &PlanInput) -> ResultSnapshot {
    let plan = plan_from_models(&doc.bundle, doc.settings.fte, doc.settings.unit);
    compute_plan(&plan, None, None)
}

pub fn run_cash_flow(args: StatementArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let doc = args.plan.load()?;
    let bundle = &doc.bundle;
    let snapshot = snapshot_of(&doc);
    let report = generate_cash_flow(
        &snapshot,
        &bundle.capex,
        &bundle.loans,
        &bundle.tax,
        doc.settings.discount_rate,
    );

    let mut warnings = Vec::new();
    if report.investment.payback_months.is_none() {
        warnings.push("Cumulative cash flow stays negative over the horizon".to_string());
    }
    if !report.investment.discounted {
        warnings.push("Discount rate unusable; NPV is the undiscounted sum".to_string());
    }
    let result = with_metadata(
        "Monthly cash-flow projection with geometric monthly discounting",
        &serde_json::json!({
            "discount_rate": report.investment.discount_rate.to_string(),
            "months": report.monthly.len(),
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        report,
    );
    Ok(serde_json::to_value(result)?)
}

pub fn run_balance_sheet(args: StatementArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let doc = args.plan.load()?;
    let bundle = &doc.bundle;
    let snapshot = snapshot_of(&doc);
    let sheet = generate_balance_sheet(
        &snapshot,
        &bundle.capex,
        &bundle.loans,
        &bundle.tax,
        doc.settings.working_capital.as_ref(),
    );

    let result = with_metadata(
        "Single-period estimate; equity is the balancing item",
        &serde_json::json!({ "ordinary_income": snapshot.ordinary_income().to_string() }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        sheet,
    );
    Ok(serde_json::to_value(result)?)
}

pub fn run_schedules(args: StatementArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let doc = args.plan.load()?;
    let bundle = &doc.bundle;
    let snapshot = snapshot_of(&doc);
    let operating = annual_cash_flow(&snapshot, &bundle.capex, &bundle.loans, &bundle.tax)
        .operating_before_interest;

    let dscr: Vec<Value> = dscr_series(operating, &bundle.loans)
        .into_iter()
        .map(|(year, ratio)| serde_json::json!({ "year": year, "dscr": ratio }))
        .collect();
    let debt_service: Vec<Value> = debt_service_by_year(&bundle.loans)
        .into_iter()
        .map(|(year, ds)| {
            serde_json::json!({
                "year": year,
                "interest": ds.interest,
                "principal": ds.principal,
                "total": ds.total,
            })
        })
        .collect();

    Ok(serde_json::json!({
        "result": {
            "depreciation": depreciation_summary(&bundle.capex),
            "loan_payments": amortization_schedule(&bundle.loans),
            "debt_service": debt_service,
            "dscr": dscr,
        }
    }))
}
