use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::balance_sheet::{generate_balance_sheet, BalanceSheetSnapshot};
use crate::cash_flow::{generate_cash_flow, CashFlowReport};
use crate::config::PlanInput;
use crate::models::{AssumptionSummary, ConsumptionTaxBalance, IncomeTaxComponents, RangeTotals};
use crate::pl::{
    compute_plan, cost_structure, plan_from_models, solve_for_target_income,
    summarize_plan_metrics, CostStructure, LineCode, PlanMetrics, ResultSnapshot, TargetSolution,
};
use crate::types::{with_metadata, Amount, ComputationOutput, Money};
use crate::PlanResult;

/// Lines whose purchases carry deductible consumption tax.
const CONSUMPTION_TAX_DEDUCTIBLE: [LineCode; 9] = [
    LineCode::CogsMat,
    LineCode::CogsLbr,
    LineCode::CogsOutSrc,
    LineCode::CogsOutCon,
    LineCode::CogsOth,
    LineCode::OpexAd,
    LineCode::OpexUtil,
    LineCode::OpexOth,
    LineCode::NoeOth,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxSummary {
    pub income: IncomeTaxComponents,
    pub consumption: ConsumptionTaxBalance,
    /// Income taxes plus net consumption tax
    pub total: Money,
}

/// Everything derived from one plan document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanReport {
    pub snapshot: ResultSnapshot,
    pub metrics: PlanMetrics,
    pub cost_structure: CostStructure,
    pub assumptions: AssumptionSummary,
    pub cost_ranges: RangeTotals,
    pub taxes: TaxSummary,
    pub cash_flow: CashFlowReport,
    pub balance_sheet: BalanceSheetSnapshot,
    pub target: TargetSolution,
}

fn tax_summary(input: &PlanInput, snapshot: &ResultSnapshot) -> TaxSummary {
    let tax = &input.bundle.tax;
    let taxable_expenses: Money = CONSUMPTION_TAX_DEDUCTIBLE
        .iter()
        .map(|code| snapshot.value(*code))
        .sum();
    let income = tax.income_tax_components(snapshot.ordinary_income());
    let consumption = tax.consumption_tax_balance(snapshot.sales(), taxable_expenses);
    TaxSummary {
        total: income.total + consumption.net,
        income,
        consumption,
    }
}

/// Validates a plan document and runs every statement over it.
pub fn build_plan_report(input: &PlanInput) -> PlanResult<ComputationOutput<PlanReport>> {
    let start = Instant::now();
    input.validate()?;

    let mut warnings: Vec<String> = Vec::new();
    let settings = &input.settings;
    let bundle = &input.bundle;

    let plan = plan_from_models(bundle, settings.fte, settings.unit);
    let snapshot = compute_plan(&plan, None, None);
    let metrics = summarize_plan_metrics(&snapshot);
    let structure = cost_structure(&plan, &snapshot);

    if snapshot.break_even_sales() == Amount::Infinite {
        warnings.push("Break-even sales is undefined: contribution ratio is not positive".into());
    }
    if snapshot.get(LineCode::Ldr).is_sentinel() {
        warnings.push("Labor distribution ratio is undefined: gross profit is not positive".into());
    }

    let cash_flow = generate_cash_flow(
        &snapshot,
        &bundle.capex,
        &bundle.loans,
        &bundle.tax,
        settings.discount_rate,
    );
    if cash_flow.investment.payback_months.is_none() {
        warnings.push("Investment is not paid back within the projection horizon".into());
    }
    if !cash_flow.investment.discounted {
        warnings.push(format!(
            "Discount rate {} is unusable; NPV is the undiscounted sum",
            cash_flow.investment.discount_rate
        ));
    }

    let balance_sheet = generate_balance_sheet(
        &snapshot,
        &bundle.capex,
        &bundle.loans,
        &bundle.tax,
        settings.working_capital.as_ref(),
    );

    let target = solve_for_target_income(
        &plan,
        settings.target_ordinary_income,
        Decimal::ZERO,
        plan.base_sales,
        settings.solver_options(),
    );
    if !target.converged {
        warnings.push(format!(
            "Target ordinary income {} not reached within {} iterations; sales {} is a best effort",
            settings.target_ordinary_income,
            settings.max_iterations,
            target.sales.round_dp(0)
        ));
    }

    let report = PlanReport {
        taxes: tax_summary(input, &snapshot),
        assumptions: bundle.sales.assumption_summary(),
        cost_ranges: bundle.costs.aggregate_range_totals(snapshot.sales()),
        snapshot,
        metrics,
        cost_structure: structure,
        cash_flow,
        balance_sheet,
        target,
    };
    tracing::debug!(warnings = warnings.len(), "plan report built");

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-point P&L with bisection target search, cash flow and balance sheet estimate",
        &serde_json::json!({
            "fte": settings.fte.to_string(),
            "unit": settings.unit,
            "discount_rate": report.cash_flow.investment.discount_rate.to_string(),
            "target_ordinary_income": settings.target_ordinary_income.to_string(),
            "sales_lines": bundle.sales.items.len(),
            "capex_items": bundle.capex.items.len(),
            "loans": bundle.loans.loans.len(),
        }),
        warnings,
        elapsed,
        report,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanError;
    use crate::models::{CapexItem, LoanItem, MonthlySeries, RepaymentType, SalesItem};
    use rust_decimal_macros::dec;

    fn input() -> PlanInput {
        let mut input = PlanInput::default();
        input.settings.target_ordinary_income = dec!(300000);
        input.bundle.sales.items.push(SalesItem::new(
            "Store",
            "Coffee",
            MonthlySeries::new(vec![dec!(100000); 12]),
        ));
        input
            .bundle
            .costs
            .variable_ratios
            .insert("COGS_MAT".into(), dec!(0.3));
        input
            .bundle
            .costs
            .fixed_costs
            .insert("OPEX_H".into(), dec!(400000));
        input.bundle.capex.items.push(CapexItem {
            name: "Roaster".into(),
            amount: dec!(100000),
            start_month: 1,
            useful_life_years: 5,
        });
        input
    }

    #[test]
    fn test_report_runs_every_statement() {
        let out = build_plan_report(&input()).unwrap();
        let report = out.result;
        // 1.2M sales, 360k materials, 400k labor, 20k depreciation
        assert_eq!(report.snapshot.ordinary_income(), dec!(420000));
        assert!(report.balance_sheet.is_balanced());
        assert!(report.target.converged);
        assert!((report.target.snapshot.ordinary_income() - dec!(300000)).abs() <= dec!(1000));
        assert_eq!(report.assumptions.total_sales, dec!(1200000));
    }

    #[test]
    fn test_invalid_document_rejected() {
        let mut doc = input();
        doc.settings.max_iterations = 0;
        doc.bundle.tax.corporate_tax_rate = dec!(2);
        match build_plan_report(&doc) {
            Err(PlanError::Validation(issues)) => assert_eq!(issues.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_steep_negative_discount_rate_warns_instead_of_failing() {
        let mut doc = input();
        doc.settings.discount_rate = Some(dec!(-0.999));
        doc.bundle.loans.loans.push(LoanItem {
            name: "Bank".into(),
            principal: dec!(2400000),
            interest_rate: dec!(0.02),
            term_months: 240,
            start_month: 1,
            repayment_type: RepaymentType::EqualPrincipal,
        });
        let out = build_plan_report(&doc).unwrap();
        assert!(!out.result.cash_flow.investment.discounted);
        assert!(out.warnings.iter().any(|w| w.contains("is unusable")));
    }

    #[test]
    fn test_warns_on_undefined_break_even() {
        let mut doc = input();
        doc.bundle
            .costs
            .variable_ratios
            .insert("COGS_MAT".into(), dec!(1));
        let out = build_plan_report(&doc).unwrap();
        assert!(out
            .warnings
            .iter()
            .any(|w| w.starts_with("Break-even sales is undefined")));
    }
}
